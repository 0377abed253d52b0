use crate::domain::audit::{AUDIT_CAPACITY, AuditEvent, NewAuditEvent};
use crate::domain::card::{Card, CardStatus, seed_cards};
use crate::domain::early_access::EarlyAccessEntry;
use crate::domain::ports::EntryRepository;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory registry of linked cards.
///
/// Cards keep their insertion order. Ids are unique: when constructed from a
/// list containing repeated ids, only the first card with that id is kept.
#[derive(Default, Clone)]
pub struct CardRegistry {
    cards: Arc<RwLock<Vec<Card>>>,
}

impl CardRegistry {
    pub fn new(cards: Vec<Card>) -> Self {
        let mut unique: Vec<Card> = Vec::with_capacity(cards.len());
        for card in cards {
            if unique.iter().any(|c| c.id == card.id) {
                tracing::warn!(card_id = %card.id, "ignoring card with duplicate id");
                continue;
            }
            unique.push(card);
        }
        Self {
            cards: Arc::new(RwLock::new(unique)),
        }
    }

    /// Creates a registry holding the fixed seed cards.
    pub fn seeded() -> Self {
        Self::new(seed_cards())
    }

    /// Returns a snapshot of all cards in insertion order.
    pub async fn list(&self) -> Vec<Card> {
        self.cards.read().await.clone()
    }

    /// Sets the status of a card, returning the updated card or `None` when the
    /// id is unknown.
    pub async fn set_status(&self, card_id: &str, status: CardStatus) -> Option<Card> {
        let mut cards = self.cards.write().await;
        let card = cards.iter_mut().find(|c| c.id == card_id)?;
        card.status = status;
        Some(card.clone())
    }
}

/// A bounded, newest-first log of audit events.
#[derive(Clone)]
pub struct AuditLog {
    events: Arc<RwLock<VecDeque<AuditEvent>>>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(AUDIT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity + 1))),
            capacity,
        }
    }

    /// Finalizes and records an event. Events beyond the capacity are evicted
    /// oldest first before this returns.
    pub async fn append(&self, event: NewAuditEvent) -> AuditEvent {
        let ts = Utc::now();
        let id = format!("evt_{:x}_{}", rand::random::<u64>(), ts.timestamp_millis());
        let event = AuditEvent::finalize(event, id, ts);

        let mut events = self.events.write().await;
        events.push_front(event.clone());
        events.truncate(self.capacity);
        event
    }

    /// Returns the retained events, newest first.
    pub async fn list(&self) -> Vec<AuditEvent> {
        self.events.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

/// A thread-safe in-memory early-access repository.
///
/// Ideal for testing or ephemeral runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryEntryRepository {
    entries: Arc<RwLock<Vec<EarlyAccessEntry>>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn load(&self) -> Result<Vec<EarlyAccessEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn replace(&self, entries: &[EarlyAccessEntry]) -> Result<()> {
        let mut stored = self.entries.write().await;
        *stored = entries.to_vec();
        Ok(())
    }
}
