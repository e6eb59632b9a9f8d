use tracing::{debug, error};

use crate::{
    cloud_provider::ComputeProvider,
    error::{Error, Result},
};

/// Maps a node's private IP address to the identifier of its compute instance.
pub struct InstanceResolver<'a> {
    provider: &'a dyn ComputeProvider,
}

impl<'a> InstanceResolver<'a> {
    pub fn new(provider: &'a dyn ComputeProvider) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, private_ip: &str, region: &str) -> Result<String> {
        if private_ip.is_empty() {
            return Err(Error::EmptyInput {
                field: "private_ip",
            });
        }
        if region.is_empty() {
            return Err(Error::EmptyInput { field: "region" });
        }

        debug!(%private_ip, %region, "resolving node IP to instance ID");

        let instances = self
            .provider
            .find_instances_by_private_ip(private_ip, region)
            .await
            .map_err(|source| {
                error!(%private_ip, %region, error = %source, "unable to resolve node IP to an instance ID");
                Error::provider("DescribeInstances", private_ip, source)
            })?;

        if instances.len() > 1 {
            debug!(
                %private_ip,
                matches = instances.len(),
                "several instances share the private IP; using the first"
            );
        }

        let instance = instances.into_iter().next().ok_or_else(|| Error::NotFound {
            private_ip: private_ip.to_string(),
            region: region.to_string(),
        })?;

        debug!(%private_ip, instance_id = %instance.id, "resolved node IP");
        Ok(instance.id)
    }
}
