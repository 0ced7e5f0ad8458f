use std::path::PathBuf;

use clap::Parser;

use podtail_types::{ExtractMode, Framing};

/// podtail - follow a Kubernetes pod's log and print the records that match
#[derive(Parser, Debug)]
#[command(name = "podtail")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Substring of the pod name to tail (first listed match wins)
    #[arg(short, long, value_name = "NAME")]
    pub service: Option<String>,

    /// Namespace to search [default: default]
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Only print records containing this substring
    #[arg(long = "logFilter", visible_alias = "log-filter", value_name = "SUBSTRING")]
    pub log_filter: Option<String>,

    /// Record extraction: raw or structured [default: raw]
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ExtractMode>,

    /// Record framing: chunk or line [default: chunk]
    #[arg(long, value_name = "FRAMING")]
    pub framing: Option<Framing>,

    /// Container name; when omitted the pod's default container is read,
    /// not a container named after --service
    #[arg(short, long)]
    pub container: Option<String>,

    /// Kubeconfig context
    #[arg(long)]
    pub context: Option<String>,

    /// Number of historical log lines to include before following
    #[arg(long)]
    pub tail_lines: Option<i64>,

    /// Read buffer size in bytes [default: 2048]
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// TOML config file (also read from $PODTAIL_CONFIG)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_service_and_namespace() {
        let args = vec!["podtail", "--service", "checkout", "--namespace", "shop"];
        let cli = Args::try_parse_from(args).unwrap();
        assert_eq!(cli.service.as_deref(), Some("checkout"));
        assert_eq!(cli.namespace.as_deref(), Some("shop"));
        assert!(cli.log_filter.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parsing_log_filter_spellings() {
        let cli = Args::try_parse_from(["podtail", "-s", "api", "--logFilter", "timeout"]).unwrap();
        assert_eq!(cli.log_filter.as_deref(), Some("timeout"));

        let cli = Args::try_parse_from(["podtail", "-s", "api", "--log-filter", "warn"]).unwrap();
        assert_eq!(cli.log_filter.as_deref(), Some("warn"));
    }

    #[test]
    fn test_cli_parsing_mode_and_framing() {
        let cli = Args::try_parse_from([
            "podtail",
            "-s",
            "api",
            "--mode",
            "structured",
            "--framing",
            "line",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(ExtractMode::Structured));
        assert_eq!(cli.framing, Some(Framing::Line));
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Args::try_parse_from(["podtail", "-s", "api", "--mode", "yaml"]).is_err());
    }

    #[test]
    fn test_cli_parsing_stream_options() {
        let cli = Args::try_parse_from([
            "podtail",
            "-s",
            "api",
            "-c",
            "app",
            "--context",
            "staging",
            "--tail-lines",
            "10",
            "--chunk-size",
            "4096",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.container.as_deref(), Some("app"));
        assert_eq!(cli.context.as_deref(), Some("staging"));
        assert_eq!(cli.tail_lines, Some(10));
        assert_eq!(cli.chunk_size, Some(4096));
        assert!(cli.verbose);
    }

    #[test]
    fn test_container_help_mentions_default_container() {
        use clap::CommandFactory;

        let cmd = Args::command();
        let container = cmd
            .get_arguments()
            .find(|a| a.get_id() == "container")
            .unwrap();
        let help = container.get_help().unwrap().to_string();
        assert!(help.contains("default container"));
    }
}
