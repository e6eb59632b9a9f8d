use decommission_core::{InstanceResolver, cloud_provider::ComputeProvider, error::Result};
use serde_json::json;

pub async fn resolve(
    provider: &dyn ComputeProvider,
    private_ip: &str,
    region: &str,
    json: bool,
) -> Result<()> {
    let instance_id = InstanceResolver::new(provider)
        .resolve(private_ip, region)
        .await?;
    if json {
        let output = json!({ "privateIp": private_ip, "region": region, "instanceId": instance_id });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", instance_id);
    }
    Ok(())
}
