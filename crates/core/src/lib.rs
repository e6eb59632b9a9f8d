pub mod cloud_provider;
pub mod commands;
pub mod config;
pub mod error;
pub mod metrics;

#[cfg(test)]
mod testing;

pub use commands::{
    decommission::decommission_node, resolve::InstanceResolver, terminate::InstanceTerminator,
};
