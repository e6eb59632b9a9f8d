use decommission_core::{
    InstanceTerminator, cloud_provider::ComputeProvider, config::Settings, error::Result,
    metrics::LogMetrics,
};
use serde_json::json;
use tokio::sync::watch;

pub async fn terminate(
    provider: &dyn ComputeProvider,
    settings: &Settings,
    instance_id: &str,
    region: &str,
    shutdown: watch::Receiver<bool>,
    json: bool,
) -> Result<()> {
    InstanceTerminator::new(provider, &LogMetrics, settings.termination)
        .terminate_until(instance_id, region, shutdown)
        .await?;
    if json {
        let output = json!({ "instanceId": instance_id, "region": region, "state": "terminated" });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Terminated instance: {}", instance_id);
    }
    Ok(())
}
