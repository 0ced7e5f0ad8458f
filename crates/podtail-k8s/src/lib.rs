//! Kubernetes client for podtail
//!
//! This crate provides the cluster collaborators (pod listing and log stream
//! opening), credential loading, and resolution of a name substring to a pod.

mod client;
mod cluster;
mod resolver;
mod stream;

pub use client::KubeClient;
pub use cluster::{ClusterClient, StreamParams};
pub use resolver::{first_match, resolve};
pub use stream::LogStream;

// Re-export types that are used in our public API
pub use podtail_types::{InstanceInfo, TailError, TargetDescriptor};
