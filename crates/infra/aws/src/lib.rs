mod aws_error;
mod config;
mod instance;
mod provider;

pub use provider::{AwsProvider, AwsProviderConfig};
