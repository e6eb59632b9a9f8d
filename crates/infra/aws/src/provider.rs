use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::{Client as Ec2Client, config::Region};
use decommission_core::{
    cloud_provider::{CloudProviderName, ComputeProvider, InstanceInfo, InstanceState},
    config::Settings,
    error::ProviderError,
};
use tracing::debug;

use crate::{config, instance};

#[derive(Debug, Clone)]
pub struct AwsProviderConfig {
    pub region: Option<String>,
    pub max_attempts: u32,
}

impl From<&Settings> for AwsProviderConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            region: settings.region.clone(),
            max_attempts: settings.max_attempts,
        }
    }
}

/// Long-lived EC2 handle. Clients are derived from one shared SDK
/// configuration and cached per region.
pub struct AwsProvider {
    sdk_config: SdkConfig,
    ec2_clients: Mutex<HashMap<String, Ec2Client>>,
}

impl AwsProvider {
    pub async fn new(provider_config: &AwsProviderConfig) -> Self {
        let sdk_config =
            config::get_config(provider_config.region.as_deref(), provider_config.max_attempts)
                .await;
        Self {
            sdk_config,
            ec2_clients: Mutex::new(HashMap::new()),
        }
    }

    /// Region resolved from the configuration or the environment.
    pub fn default_region(&self) -> Option<String> {
        self.sdk_config.region().map(|region| region.to_string())
    }

    fn ec2_client(&self, region: &str) -> Ec2Client {
        let mut clients = self
            .ec2_clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        clients
            .entry(region.to_string())
            .or_insert_with(|| {
                debug!(%region, "creating EC2 client");
                let ec2_config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
                    .region(Region::new(region.to_string()))
                    .build();
                Ec2Client::from_conf(ec2_config)
            })
            .clone()
    }
}

#[async_trait]
impl ComputeProvider for AwsProvider {
    fn provider_name(&self) -> CloudProviderName {
        CloudProviderName::Aws
    }

    async fn find_instances_by_private_ip(
        &self,
        private_ip: &str,
        region: &str,
    ) -> Result<Vec<InstanceInfo>, ProviderError> {
        instance::find_instances_by_private_ip(&self.ec2_client(region), private_ip, region).await
    }

    async fn terminate_instance(
        &self,
        instance_id: &str,
        region: &str,
    ) -> Result<(), ProviderError> {
        instance::terminate_instance(&self.ec2_client(region), instance_id).await
    }

    async fn instance_state(
        &self,
        instance_id: &str,
        region: &str,
    ) -> Result<Option<InstanceState>, ProviderError> {
        instance::instance_state(&self.ec2_client(region), instance_id).await
    }
}
