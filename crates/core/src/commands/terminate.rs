use std::{future, pin::Pin};

use tokio::{
    sync::watch,
    time::{self, Instant, Interval, MissedTickBehavior, Sleep},
};
use tracing::{debug, error, info, warn};

use crate::{
    cloud_provider::{ComputeProvider, InstanceState},
    config::TerminationSettings,
    error::{Error, ProviderError, Result},
    metrics::MetricsSink,
};

pub const TERMINATIONS_COUNTER: &str = "instance_terminations";

enum Phase {
    Requested,
    Polling,
    Terminated,
    TimedOut,
    Cancelled,
    Failed(Error),
}

/// State of one `terminate` call. Owns both timers, so they are released on
/// every exit path together with the attempt.
struct TerminationAttempt<'a> {
    instance_id: &'a str,
    region: &'a str,
    started: Instant,
    poll: Interval,
    deadline: Pin<Box<Sleep>>,
    polls: u32,
}

impl<'a> TerminationAttempt<'a> {
    fn start(instance_id: &'a str, region: &'a str, settings: &TerminationSettings) -> Self {
        let started = Instant::now();

        // First status query one full interval after the request.
        let mut poll = time::interval_at(started + settings.poll_interval, settings.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            instance_id,
            region,
            started,
            poll,
            deadline: Box::pin(time::sleep_until(started + settings.deadline)),
            polls: 0,
        }
    }
}

/// Terminates an instance and blocks until the provider reports it as
/// terminated, the deadline passes, a provider call fails or the caller
/// signals shutdown.
pub struct InstanceTerminator<'a> {
    provider: &'a dyn ComputeProvider,
    metrics: &'a dyn MetricsSink,
    settings: TerminationSettings,
}

impl<'a> InstanceTerminator<'a> {
    pub fn new(
        provider: &'a dyn ComputeProvider,
        metrics: &'a dyn MetricsSink,
        settings: TerminationSettings,
    ) -> Self {
        Self {
            provider,
            metrics,
            settings,
        }
    }

    pub async fn terminate(&self, instance_id: &str, region: &str) -> Result<()> {
        self.run(instance_id, region, None).await
    }

    /// Like [`terminate`](Self::terminate), but gives up with
    /// [`Error::Cancelled`] once `shutdown` holds `true`.
    pub async fn terminate_until(
        &self,
        instance_id: &str,
        region: &str,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        self.run(instance_id, region, Some(shutdown)).await
    }

    async fn run(
        &self,
        instance_id: &str,
        region: &str,
        mut shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<()> {
        if instance_id.is_empty() {
            return Err(Error::EmptyInput {
                field: "instance_id",
            });
        }
        if region.is_empty() {
            return Err(Error::EmptyInput { field: "region" });
        }

        let mut attempt = TerminationAttempt::start(instance_id, region, &self.settings);
        let mut phase = Phase::Requested;

        loop {
            phase = match phase {
                Phase::Requested => self.request(&attempt).await,
                Phase::Polling => self.wait(&mut attempt, &mut shutdown).await,
                Phase::Terminated => {
                    info!(
                        %instance_id,
                        polls = attempt.polls,
                        elapsed = ?attempt.started.elapsed(),
                        "successfully confirmed the termination of instance"
                    );
                    self.metrics.incr_counter(
                        &[
                            "cluster",
                            self.provider.provider_name().label(),
                            TERMINATIONS_COUNTER,
                        ],
                        1,
                    );
                    return Ok(());
                }
                Phase::TimedOut => {
                    warn!(
                        %instance_id,
                        polls = attempt.polls,
                        deadline = ?self.settings.deadline,
                        "timeout reached while confirming the termination of instance"
                    );
                    return Err(Error::TimedOut {
                        instance_id: instance_id.to_string(),
                        deadline: self.settings.deadline,
                    });
                }
                Phase::Cancelled => {
                    warn!(%instance_id, polls = attempt.polls, "termination confirmation cancelled");
                    return Err(Error::Cancelled {
                        instance_id: instance_id.to_string(),
                    });
                }
                Phase::Failed(error) => return Err(error),
            };
        }
    }

    async fn request(&self, attempt: &TerminationAttempt<'_>) -> Phase {
        info!(instance_id = %attempt.instance_id, region = %attempt.region, "terminating instance");

        if let Err(source) = self
            .provider
            .terminate_instance(attempt.instance_id, attempt.region)
            .await
        {
            error!(instance_id = %attempt.instance_id, error = %source, "termination request failed");
            return Phase::Failed(Error::provider(
                "TerminateInstances",
                attempt.instance_id,
                source,
            ));
        }

        info!(instance_id = %attempt.instance_id, "confirming successful termination of instance");
        Phase::Polling
    }

    async fn wait(
        &self,
        attempt: &mut TerminationAttempt<'_>,
        shutdown: &mut Option<watch::Receiver<bool>>,
    ) -> Phase {
        // A deadline that is due wins over a poll tick due at the same instant.
        tokio::select! {
            biased;
            _ = shutdown_requested(shutdown) => return Phase::Cancelled,
            _ = &mut attempt.deadline => return Phase::TimedOut,
            _ = attempt.poll.tick() => {}
        }

        attempt.polls += 1;
        let query = self
            .provider
            .instance_state(attempt.instance_id, attempt.region);

        // The status query in flight is dropped when shutdown or the deadline
        // comes first.
        tokio::select! {
            biased;
            _ = shutdown_requested(shutdown) => Phase::Cancelled,
            _ = &mut attempt.deadline => Phase::TimedOut,
            result = query => self.observe(attempt, result),
        }
    }

    fn observe(
        &self,
        attempt: &TerminationAttempt<'_>,
        result: std::result::Result<Option<InstanceState>, ProviderError>,
    ) -> Phase {
        match result {
            Err(source) => {
                error!(
                    instance_id = %attempt.instance_id,
                    error = %source,
                    "failed to describe status of instance"
                );
                Phase::Failed(Error::provider(
                    "DescribeInstanceStatus",
                    attempt.instance_id,
                    source,
                ))
            }
            Ok(Some(state)) if state.is_terminated() => Phase::Terminated,
            Ok(state) => {
                debug!(
                    instance_id = %attempt.instance_id,
                    state = state.as_ref().map_or("unreported", |state| state.as_str()),
                    polls = attempt.polls,
                    "instance not terminated yet"
                );
                Phase::Polling
            }
        }
    }
}

/// Resolves once the receiver observes `true`. Never resolves without a
/// receiver or after its sender is gone.
async fn shutdown_requested(shutdown: &mut Option<watch::Receiver<bool>>) {
    let Some(receiver) = shutdown else {
        return future::pending().await;
    };
    loop {
        if *receiver.borrow_and_update() {
            return;
        }
        if receiver.changed().await.is_err() {
            return future::pending().await;
        }
    }
}
