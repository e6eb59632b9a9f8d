use decommission_core::{
    cloud_provider::ComputeProvider, config::Settings, decommission_node, error::Result,
    metrics::LogMetrics,
};
use serde_json::json;
use tokio::sync::watch;

pub async fn decommission(
    provider: &dyn ComputeProvider,
    settings: &Settings,
    private_ip: &str,
    region: &str,
    shutdown: watch::Receiver<bool>,
    json: bool,
) -> Result<()> {
    let instance_id = decommission_node(
        provider,
        &LogMetrics,
        settings.termination,
        private_ip,
        region,
        shutdown,
    )
    .await?;
    if json {
        let output = json!({
            "privateIp": private_ip,
            "region": region,
            "instanceId": instance_id,
            "state": "terminated",
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Decommissioned node {} (instance {})", private_ip, instance_id);
    }
    Ok(())
}
