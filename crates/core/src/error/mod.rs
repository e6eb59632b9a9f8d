mod config;
mod provider;

use std::time::Duration;

pub use config::ConfigurationError;
pub use provider::ProviderError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{field} must not be empty")]
    EmptyInput { field: &'static str },

    #[error("no instance with private IP {private_ip} found in region {region}")]
    NotFound { private_ip: String, region: String },

    #[error("{operation} failed for {subject}: {source}")]
    Provider {
        operation: &'static str,
        subject: String,
        #[source]
        source: ProviderError,
    },

    #[error(
        "timeout reached after {deadline:?} while confirming the termination of instance {instance_id}"
    )]
    TimedOut {
        instance_id: String,
        deadline: Duration,
    },

    #[error("confirmation of the termination of instance {instance_id} was cancelled")]
    Cancelled { instance_id: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    InputOutput(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn provider(
        operation: &'static str,
        subject: impl Into<String>,
        source: ProviderError,
    ) -> Self {
        Error::Provider {
            operation,
            subject: subject.into(),
            source,
        }
    }

    /// True when the termination request may still be in progress on the
    /// provider side; the instance has to be re-checked before retrying.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Error::TimedOut { .. } | Error::Cancelled { .. })
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
