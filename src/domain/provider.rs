use super::card::{Card, Provider};
use serde::{Deserialize, Serialize};

/// Outcome of one simulated provider call.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    pub ok: bool,
    pub provider: Provider,
    pub card_id: String,
    pub latency_ms: u64,
    pub message: String,
}

impl ProviderResult {
    pub fn success(card: &Card, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            provider: card.provider,
            card_id: card.id.clone(),
            latency_ms,
            message: message.into(),
        }
    }

    pub fn failure(card: &Card, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            provider: card.provider,
            card_id: card.id.clone(),
            latency_ms,
            message: message.into(),
        }
    }
}

/// The random draws for one provider call, taken before the call is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallPlan {
    pub latency_ms: u64,
    pub fails: bool,
}
