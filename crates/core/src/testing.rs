//! Scripted `ComputeProvider` and in-memory counters for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    cloud_provider::{CloudProviderName, ComputeProvider, InstanceInfo, InstanceState},
    error::ProviderError,
    metrics::MetricsSink,
};

/// Keeps counters in memory, keyed by the dotted label path.
#[derive(Debug, Default)]
pub(crate) struct InMemoryMetrics {
    counters: Mutex<HashMap<String, u64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, key: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(key).copied().unwrap_or(0)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn incr_counter(&self, key: &[&str], value: u64) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        *counters.entry(key.join(".")).or_insert(0) += value;
    }
}

/// One scripted answer to a status poll.
#[derive(Debug, Clone)]
pub(crate) enum Poll {
    State(InstanceState),
    Missing,
    Fail,
}

#[derive(Default)]
pub(crate) struct FakeProvider {
    instances: Vec<InstanceInfo>,
    fail_lookup: bool,
    fail_terminate: bool,
    polls: Mutex<VecDeque<Poll>>,
    /// Answer once `polls` is exhausted.
    steady: Option<Poll>,
    /// Time every status query takes before answering.
    poll_delay: Option<Duration>,
    pub lookup_calls: AtomicUsize,
    pub terminate_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(mut self, id: &str, private_ip: &str, region: &str) -> Self {
        self.instances.push(InstanceInfo {
            id: id.to_string(),
            private_ip: private_ip.to_string(),
            region: region.to_string(),
            state: InstanceState::Running,
        });
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn failing_terminate(mut self) -> Self {
        self.fail_terminate = true;
        self
    }

    pub fn with_polls(self, polls: impl IntoIterator<Item = Poll>) -> Self {
        if let Ok(mut queue) = self.polls.lock() {
            queue.extend(polls);
        }
        self
    }

    pub fn steady(mut self, poll: Poll) -> Self {
        self.steady = Some(poll);
        self
    }

    pub fn slow_polls(mut self, delay: Duration) -> Self {
        self.poll_delay = Some(delay);
        self
    }

    pub fn polls_issued(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

fn scripted_failure(operation_name: &'static str) -> ProviderError {
    ProviderError::Unknown {
        operation_name,
        detail: "scripted failure".to_string(),
    }
}

#[async_trait]
impl ComputeProvider for FakeProvider {
    fn provider_name(&self) -> CloudProviderName {
        CloudProviderName::Aws
    }

    async fn find_instances_by_private_ip(
        &self,
        private_ip: &str,
        region: &str,
    ) -> Result<Vec<InstanceInfo>, ProviderError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup {
            return Err(scripted_failure("DescribeInstances"));
        }
        Ok(self
            .instances
            .iter()
            .filter(|instance| instance.private_ip == private_ip && instance.region == region)
            .cloned()
            .collect())
    }

    async fn terminate_instance(
        &self,
        _instance_id: &str,
        _region: &str,
    ) -> Result<(), ProviderError> {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_terminate {
            return Err(scripted_failure("TerminateInstances"));
        }
        Ok(())
    }

    async fn instance_state(
        &self,
        _instance_id: &str,
        _region: &str,
    ) -> Result<Option<InstanceState>, ProviderError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.poll_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .polls
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .or_else(|| self.steady.clone())
            .unwrap_or(Poll::Missing);
        match next {
            Poll::State(state) => Ok(Some(state)),
            Poll::Missing => Ok(None),
            Poll::Fail => Err(scripted_failure("DescribeInstanceStatus")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn counters_accumulate_per_key() {
        let metrics = InMemoryMetrics::new();

        metrics.incr_counter(&["cluster", "aws", "instance_terminations"], 1);
        metrics.incr_counter(&["cluster", "aws", "instance_terminations"], 1);
        metrics.incr_counter(&["cluster", "aws", "other"], 5);

        assert_eq!(metrics.counter("cluster.aws.instance_terminations"), 2);
        assert_eq!(metrics.counter("cluster.aws.other"), 5);
        assert_eq!(metrics.counter("missing"), 0);
    }

    #[test]
    fn poisoned_lock_keeps_counting() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let holder = Arc::clone(&metrics);
        let _ = thread::spawn(move || {
            let _guard = holder.counters.lock().unwrap();
            panic!("poison the counters");
        })
        .join();
        assert!(metrics.counters.is_poisoned());

        metrics.incr_counter(&["cluster", "aws", "instance_terminations"], 1);

        assert_eq!(metrics.counter("cluster.aws.instance_terminations"), 1);
    }
}
