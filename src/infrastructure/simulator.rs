use crate::domain::card::{Card, Operation};
use crate::domain::ports::{ProviderGateway, RandomSourceArc};
use crate::domain::provider::{CallPlan, ProviderResult};
use crate::infrastructure::random::RngSource;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Lower bound of the simulated latency, inclusive.
pub const MIN_LATENCY_MS: u64 = 250;
/// Width of the latency window: latencies fall in `[250, 1150)`.
pub const LATENCY_SPREAD_MS: u64 = 900;
/// Probability that a single call times out.
pub const FAILURE_RATE: f64 = 0.1;

pub const TIMEOUT_MESSAGE: &str = "Provider timeout (simulated)";

/// Simulates a third-party card API with random latency and a fixed failure rate.
///
/// Each call draws two samples from the random source in `prepare`: the first
/// picks the latency, the second decides whether the call fails. Calls are
/// independent and never retried.
#[derive(Clone)]
pub struct ProviderSimulator {
    random: RandomSourceArc,
}

impl ProviderSimulator {
    pub fn new(random: RandomSourceArc) -> Self {
        Self { random }
    }

    pub fn from_entropy() -> Self {
        Self::new(Arc::new(RngSource::from_entropy()))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Arc::new(RngSource::seeded(seed)))
    }
}

#[async_trait]
impl ProviderGateway for ProviderSimulator {
    fn prepare(&self, _card: &Card, _operation: Operation) -> CallPlan {
        let sample = self.random.next_unit().clamp(0.0, 1.0);
        let latency_ms = (MIN_LATENCY_MS + (sample * LATENCY_SPREAD_MS as f64) as u64)
            .min(MIN_LATENCY_MS + LATENCY_SPREAD_MS - 1);
        let fails = self.random.next_unit() < FAILURE_RATE;
        CallPlan { latency_ms, fails }
    }

    async fn execute(&self, card: &Card, operation: Operation, plan: CallPlan) -> ProviderResult {
        tokio::time::sleep(Duration::from_millis(plan.latency_ms)).await;

        if plan.fails {
            ProviderResult::failure(card, plan.latency_ms, TIMEOUT_MESSAGE)
        } else {
            ProviderResult::success(
                card,
                plan.latency_ms,
                format!("{} successfully", operation.past_tense()),
            )
        }
    }
}
