use tracing::{debug, info, warn};

use podtail_types::{InstanceInfo, TailError, TargetDescriptor};

use crate::cluster::ClusterClient;

/// First instance in listing order whose name matches the target
pub fn first_match<'a>(
    instances: &'a [InstanceInfo],
    target: &TargetDescriptor,
) -> Option<&'a InstanceInfo> {
    instances.iter().find(|i| target.matches(&i.name))
}

/// Resolve a target to the name of one pod.
///
/// Pods are not filtered by phase: a terminated pod whose name matches is
/// still selected. Later matches are ignored.
pub async fn resolve<C: ClusterClient>(
    client: &C,
    target: &TargetDescriptor,
) -> Result<String, TailError> {
    let instances = client.list_instances(&target.namespace).await?;
    debug!(
        namespace = %target.namespace,
        count = instances.len(),
        "Listed pods"
    );

    let instance = first_match(&instances, target).ok_or_else(|| {
        TailError::NotFound {
            namespace: target.namespace.clone(),
            substring: target.name_substring.clone(),
        }
    })?;

    if instance.is_terminated() {
        warn!(
            "Pod {} is in phase {}; its log may not grow",
            instance.name,
            instance.phase.as_deref().unwrap_or("Unknown")
        );
    }

    info!(
        "Resolved '{}' to pod {} in namespace {}",
        target.name_substring, instance.name, target.namespace
    );
    Ok(instance.name.clone())
}
