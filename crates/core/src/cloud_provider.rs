use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Error, ProviderError, Result};

/// Instance lifecycle operations a cloud backend has to offer for nodes to be
/// decommissioned. The region is supplied per call.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    fn provider_name(&self) -> CloudProviderName;

    /// Instances whose private IP equals `private_ip`, in provider order.
    async fn find_instances_by_private_ip(
        &self,
        private_ip: &str,
        region: &str,
    ) -> std::result::Result<Vec<InstanceInfo>, ProviderError>;

    async fn terminate_instance(
        &self,
        instance_id: &str,
        region: &str,
    ) -> std::result::Result<(), ProviderError>;

    /// Current lifecycle state, including instances that are no longer
    /// visible by default. `None` when the provider returned no status entry.
    async fn instance_state(
        &self,
        instance_id: &str,
        region: &str,
    ) -> std::result::Result<Option<InstanceState>, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudProviderName {
    Aws,
}

impl CloudProviderName {
    /// Lowercase name used in metric keys.
    pub fn label(&self) -> &'static str {
        match self {
            CloudProviderName::Aws => "aws",
        }
    }
}

impl FromStr for CloudProviderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(CloudProviderName::Aws),
            e => Err(ConfigurationError::InvalidCloudProvider(e.to_string()).into()),
        }
    }
}

impl Display for CloudProviderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let value = match self {
            CloudProviderName::Aws => "AWS",
        };
        write!(f, "{}", value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Other(String),
}

impl InstanceState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, InstanceState::Terminated)
    }

    pub fn as_str(&self) -> &str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Other(name) => name,
        }
    }
}

impl From<&str> for InstanceState {
    fn from(name: &str) -> Self {
        match name {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            other => InstanceState::Other(other.to_string()),
        }
    }
}

impl Display for InstanceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InstanceState {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InstanceState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(InstanceState::from(name.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub id: String,
    pub private_ip: String,
    pub region: String,
    pub state: InstanceState,
}
