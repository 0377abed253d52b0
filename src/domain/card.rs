use serde::{Deserialize, Serialize};
use std::fmt;

/// The simulated institutions a card can be linked through.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provider {
    AmexMock,
    BofaMock,
    CaponeMock,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::AmexMock => "AMEX_MOCK",
            Provider::BofaMock => "BOFA_MOCK",
            Provider::CaponeMock => "CAPONE_MOCK",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    #[default]
    Active,
    Blocked,
}

/// The two actions a batch can apply to every linked card.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Block,
    Unblock,
}

impl Operation {
    /// The status a card ends up in when the provider accepts the operation.
    pub fn target_status(&self) -> CardStatus {
        match self {
            Operation::Block => CardStatus::Blocked,
            Operation::Unblock => CardStatus::Active,
        }
    }

    /// Upper-case label used in audit messages ("BLOCK", "UNBLOCK").
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Block => "BLOCK",
            Operation::Unblock => "UNBLOCK",
        }
    }

    /// Past-tense verb for per-card success messages.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Operation::Block => "Blocked",
            Operation::Unblock => "Unblocked",
        }
    }

    /// Gerund used when a provider call fails ("blocking", "unblocking").
    pub fn gerund(&self) -> &'static str {
        match self {
            Operation::Block => "blocking",
            Operation::Unblock => "unblocking",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A card linked to one provider.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Card {
    pub id: String,
    pub label: String,
    pub last4: String,
    pub provider: Provider,
    pub status: CardStatus,
}

impl Card {
    pub fn new(id: &str, label: &str, last4: &str, provider: Provider) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            last4: last4.to_string(),
            provider,
            status: CardStatus::Active,
        }
    }
}

/// The fixed set of cards every process starts with.
pub fn seed_cards() -> Vec<Card> {
    vec![
        Card::new("c1", "Amex Gold", "4455", Provider::AmexMock),
        Card::new("c2", "Bank of America Debit", "7788", Provider::BofaMock),
        Card::new("c3", "Capital One Quicksilver", "9911", Provider::CaponeMock),
    ]
}
