use aws_config::{
    BehaviorVersion, SdkConfig, meta::region::RegionProviderChain, retry::RetryConfig,
};
use aws_sdk_ec2::config::Region;

/// Shared SDK configuration: default region and a standard retry policy of
/// `max_attempts` attempts per call. Retries and request errors are reported
/// by the SDK as `tracing` events under `aws_smithy_runtime`.
pub(super) async fn get_config(region: Option<&str>, max_attempts: u32) -> SdkConfig {
    let region_provider = match region {
        Some(r) => RegionProviderChain::first_try(Region::new(r.to_string())).or_default_provider(),
        None => RegionProviderChain::default_provider(),
    };
    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .retry_config(RetryConfig::standard().with_max_attempts(max_attempts))
        .load()
        .await
}
