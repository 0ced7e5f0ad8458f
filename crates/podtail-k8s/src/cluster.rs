use std::future::Future;

use futures::AsyncRead;

use podtail_types::{InstanceInfo, TailError};

/// Options for opening a log stream. The stream is always followed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamParams {
    /// Container to read; the server picks the default container when unset
    pub container: Option<String>,

    /// Number of historical lines to include before following
    pub tail_lines: Option<i64>,
}

/// The two cluster operations podtail needs
pub trait ClusterClient {
    type Stream: AsyncRead + Unpin + Send + 'static;

    /// List pods in a namespace, in the order the cluster returns them
    fn list_instances(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<InstanceInfo>, TailError>> + Send;

    /// Open a followed log stream for one pod
    fn open_log_stream(
        &self,
        namespace: &str,
        instance: &str,
        params: &StreamParams,
    ) -> impl Future<Output = Result<Self::Stream, TailError>> + Send;
}
