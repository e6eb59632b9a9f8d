use tokio::sync::watch;

use crate::{
    cloud_provider::ComputeProvider,
    commands::{resolve::InstanceResolver, terminate::InstanceTerminator},
    config::TerminationSettings,
    error::Result,
    metrics::MetricsSink,
};

/// Resolves the node behind `private_ip` and terminates its instance,
/// returning the identifier of the terminated instance.
pub async fn decommission_node(
    provider: &dyn ComputeProvider,
    metrics: &dyn MetricsSink,
    settings: TerminationSettings,
    private_ip: &str,
    region: &str,
    shutdown: watch::Receiver<bool>,
) -> Result<String> {
    let instance_id = InstanceResolver::new(provider)
        .resolve(private_ip, region)
        .await?;

    InstanceTerminator::new(provider, metrics, settings)
        .terminate_until(&instance_id, region, shutdown)
        .await?;

    Ok(instance_id)
}
