use aws_sdk_ec2::{
    Client as Ec2Client,
    operation::{
        describe_instance_status::{
            DescribeInstanceStatusOutput, builders::DescribeInstanceStatusFluentBuilder,
        },
        describe_instances::{DescribeInstancesOutput, builders::DescribeInstancesFluentBuilder},
        terminate_instances::builders::TerminateInstancesFluentBuilder,
    },
    types::Filter,
};
use decommission_core::{
    cloud_provider::{InstanceInfo, InstanceState},
    error::ProviderError,
};

use crate::aws_error::map_aws_error;

pub(super) async fn find_instances_by_private_ip(
    ec2_client: &Ec2Client,
    private_ip: &str,
    region: &str,
) -> Result<Vec<InstanceInfo>, ProviderError> {
    let resp = describe_by_private_ip(ec2_client, private_ip)
        .send()
        .await
        .map_err(|error| map_aws_error("DescribeInstances", error))?;

    Ok(instances_from_output(&resp, private_ip, region))
}

pub(super) async fn terminate_instance(
    ec2_client: &Ec2Client,
    instance_id: &str,
) -> Result<(), ProviderError> {
    terminate_request(ec2_client, instance_id)
        .send()
        .await
        .map_err(|error| map_aws_error("TerminateInstances", error))?;

    Ok(())
}

pub(super) async fn instance_state(
    ec2_client: &Ec2Client,
    instance_id: &str,
) -> Result<Option<InstanceState>, ProviderError> {
    let resp = status_request(ec2_client, instance_id)
        .send()
        .await
        .map_err(|error| map_aws_error("DescribeInstanceStatus", error))?;

    Ok(state_from_output(&resp))
}

fn describe_by_private_ip(ec2_client: &Ec2Client, private_ip: &str) -> DescribeInstancesFluentBuilder {
    let filter = Filter::builder()
        .name("private-ip-address")
        .values(private_ip)
        .build();

    ec2_client
        .describe_instances()
        .dry_run(false)
        .filters(filter)
}

fn terminate_request(ec2_client: &Ec2Client, instance_id: &str) -> TerminateInstancesFluentBuilder {
    ec2_client
        .terminate_instances()
        .instance_ids(instance_id)
        .dry_run(false)
}

// Terminated instances are only listed with `include_all_instances`.
fn status_request(ec2_client: &Ec2Client, instance_id: &str) -> DescribeInstanceStatusFluentBuilder {
    ec2_client
        .describe_instance_status()
        .instance_ids(instance_id)
        .include_all_instances(true)
        .dry_run(false)
}

fn instances_from_output(
    resp: &DescribeInstancesOutput,
    private_ip: &str,
    region: &str,
) -> Vec<InstanceInfo> {
    resp.reservations()
        .iter()
        .flat_map(|r| r.instances())
        .filter_map(|i| {
            let id = i.instance_id()?.to_string();
            let state = i
                .state()
                .and_then(|s| s.name())
                .map(|name| InstanceState::from(name.as_str()))
                .unwrap_or_else(|| InstanceState::Other("unknown".to_string()));

            Some(InstanceInfo {
                id,
                private_ip: i.private_ip_address().unwrap_or(private_ip).to_string(),
                region: region.to_string(),
                state,
            })
        })
        .collect()
}

fn state_from_output(resp: &DescribeInstanceStatusOutput) -> Option<InstanceState> {
    resp.instance_statuses()
        .first()
        .and_then(|status| status.instance_state())
        .and_then(|state| state.name())
        .map(|name| InstanceState::from(name.as_str()))
}
