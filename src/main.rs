mod cli;
mod config;

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use podtail_k8s::{ClusterClient, KubeClient};
use podtail_logs::LogPipeline;
use podtail_types::TailError;

use cli::Args;
use config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics go to stderr so stdout carries only matched records
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_closed_output() => {
            debug!("Output closed by reader, stopping");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<(), TailError> {
    let settings = Settings::from_args(&args)?;
    let client = KubeClient::new(settings.context.as_deref()).await?;

    let pod = podtail_k8s::resolve(&client, &settings.target).await?;
    let stream = client
        .open_log_stream(&settings.target.namespace, &pod, &settings.stream)
        .await?;
    info!(
        "Tailing logs for pod {}/{} ({} mode, {} framing)",
        settings.target.namespace, pod, settings.pipeline.mode, settings.pipeline.framing
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let stats = LogPipeline::new(stream, std::io::stdout(), &settings.pipeline)
        .run(cancel)
        .await?;
    info!(
        "Read {} chunks ({} bytes), emitted {} records, {} without a complete record, {} filtered out",
        stats.chunks, stats.bytes, stats.records_emitted, stats.extraction_misses, stats.filtered_out
    );
    Ok(())
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, stopping");
                cancel.cancel();
            }
            Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
        }
    });
}
