use futures::channel::oneshot;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::{ListParams, LogParams};
use kube::config::KubeConfigOptions;
use tracing::{debug, info};

use podtail_types::{InstanceInfo, TailError};

use crate::cluster::{ClusterClient, StreamParams};
use crate::stream::{self, LogStream};

/// Kubernetes client wrapper
#[derive(Clone)]
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    /// Load credentials and build a client.
    ///
    /// With an explicit context the kubeconfig (`KUBECONFIG` or
    /// `~/.kube/config`) must contain it. Without one the configuration is
    /// inferred: current kubeconfig context first, then the in-cluster
    /// service account.
    pub async fn new(context: Option<&str>) -> Result<Self, TailError> {
        let config = match context {
            Some(ctx) => kube::Config::from_kubeconfig(&KubeConfigOptions {
                context: Some(ctx.to_string()),
                ..Default::default()
            })
            .await
            .map_err(|e| {
                TailError::config(format!("context '{}' not found in kubeconfig: {}", ctx, e))
            })?,
            None => kube::Config::infer().await.map_err(|e| {
                TailError::config(format!(
                    "failed to load kubeconfig. Is kubectl configured? {}",
                    e
                ))
            })?,
        };

        debug!(cluster_url = %config.cluster_url, "Loaded cluster configuration");

        let client = kube::Client::try_from(config)
            .map_err(|e| TailError::config(format!("failed to create client: {}", e)))?;

        if let Some(ctx) = context {
            info!("Initialized client for context: {}", ctx);
        }

        Ok(Self { client })
    }

    fn pod_to_info(pod: Pod) -> InstanceInfo {
        InstanceInfo {
            name: pod.metadata.name.unwrap_or_default(),
            phase: pod.status.and_then(|s| s.phase),
        }
    }
}

impl ClusterClient for KubeClient {
    type Stream = LogStream;

    async fn list_instances(&self, namespace: &str) -> Result<Vec<InstanceInfo>, TailError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| TailError::List {
                namespace: namespace.to_string(),
                message: e.to_string(),
            })?;

        Ok(list.items.into_iter().map(Self::pod_to_info).collect())
    }

    async fn open_log_stream(
        &self,
        namespace: &str,
        instance: &str,
        params: &StreamParams,
    ) -> Result<LogStream, TailError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams {
            follow: true,
            container: params.container.clone(),
            tail_lines: params.tail_lines,
            ..Default::default()
        };
        let pod_name = instance.to_string();

        let (opened_tx, opened_rx) = oneshot::channel();
        let (chunk_tx, mut log_stream) = LogStream::channel();

        // The body borrows the Api and params, so both live in the pump task
        let task = tokio::spawn(async move {
            match pods.log_stream(&pod_name, &lp).await {
                Ok(body) => {
                    if opened_tx.send(Ok(())).is_ok() {
                        stream::pump(body, chunk_tx).await;
                    }
                }
                Err(e) => {
                    let _ = opened_tx.send(Err(e.to_string()));
                }
            }
        });
        log_stream.attach(task.abort_handle());

        match opened_rx.await {
            Ok(Ok(())) => {
                debug!(
                    pod = instance,
                    container = params.container.as_deref().unwrap_or("<default>"),
                    "Opened log stream"
                );
                Ok(log_stream)
            }
            Ok(Err(message)) => Err(TailError::StreamOpen {
                pod: instance.to_string(),
                message,
            }),
            Err(_) => Err(TailError::StreamOpen {
                pod: instance.to_string(),
                message: "log stream task ended before the stream opened".to_string(),
            }),
        }
    }
}
