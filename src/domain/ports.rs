use super::card::{Card, Operation};
use super::early_access::EarlyAccessEntry;
use super::provider::{CallPlan, ProviderResult};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A third-party card API able to block or unblock a card.
///
/// Implementations never fail outright: a rejected or timed-out call is
/// reported through `ProviderResult::ok`.
///
/// A call is split in two: `prepare` takes whatever random draws the call
/// needs and runs synchronously, `execute` performs it. Callers issuing many
/// calls at once prepare them in a fixed order so seeded runs repeat.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    fn prepare(&self, _card: &Card, _operation: Operation) -> CallPlan {
        CallPlan::default()
    }

    async fn execute(&self, card: &Card, operation: Operation, plan: CallPlan) -> ProviderResult;

    async fn invoke(&self, card: &Card, operation: Operation) -> ProviderResult {
        let plan = self.prepare(card, operation);
        self.execute(card, operation, plan).await
    }
}

/// Source of uniformly distributed samples in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Backing storage for the early-access list.
///
/// Callers are responsible for serializing `load` + `replace` sequences.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<EarlyAccessEntry>>;
    async fn replace(&self, entries: &[EarlyAccessEntry]) -> Result<()>;
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
}

/// Verifies a caller-presented session token.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: Option<&str>) -> Option<Session>;
}

pub type ProviderGatewayArc = Arc<dyn ProviderGateway>;
pub type RandomSourceArc = Arc<dyn RandomSource>;
pub type EntryRepositoryBox = Box<dyn EntryRepository>;
pub type SessionVerifierBox = Box<dyn SessionVerifier>;
