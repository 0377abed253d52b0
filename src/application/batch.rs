use crate::domain::audit::{AuditEventType, NewAuditEvent};
use crate::domain::card::Operation;
use crate::domain::ports::ProviderGatewayArc;
use crate::domain::provider::ProviderResult;
use crate::error::{AppError, Result};
use crate::infrastructure::in_memory::{AuditLog, CardRegistry};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Aggregate outcome of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub any_failed: bool,
    /// One result per card, in registry order.
    pub results: Vec<ProviderResult>,
}

/// Fans a block or unblock operation out to every linked card.
///
/// `BatchActuator` owns handles to the card registry and the audit log and is
/// the only component that writes to either. It is cheap to clone; clones share
/// the same state.
#[derive(Clone)]
pub struct BatchActuator {
    registry: CardRegistry,
    audit: AuditLog,
    gateway: ProviderGatewayArc,
    commit: Arc<Mutex<()>>,
}

impl BatchActuator {
    /// Creates a new `BatchActuator`.
    ///
    /// # Arguments
    ///
    /// * `registry` - The cards every batch runs against.
    /// * `audit` - The log receiving batch and per-card events.
    /// * `gateway` - The provider API invoked once per card.
    pub fn new(registry: CardRegistry, audit: AuditLog, gateway: ProviderGatewayArc) -> Self {
        Self {
            registry,
            audit,
            gateway,
            commit: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Runs `operation` against every card and waits for all provider calls.
    ///
    /// The batch runs on its own task, so it completes even if the caller stops
    /// waiting. Provider failures are reported through `BatchOutcome`; an `Err`
    /// means something unexpected broke outside the per-card handling.
    pub async fn run_batch(&self, operation: Operation) -> Result<BatchOutcome> {
        let this = self.clone();
        match tokio::spawn(async move { this.execute(operation).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(%operation, error = %e, "batch task aborted");
                self.record_unexpected(operation).await;
                Err(AppError::Internal(format!("{operation} ALL aborted: {e}")))
            }
        }
    }

    async fn execute(&self, operation: Operation) -> Result<BatchOutcome> {
        let started = Instant::now();

        self.audit
            .append(NewAuditEvent::new(
                AuditEventType::requested(operation),
                format!("User requested {operation} ALL."),
            ))
            .await;

        let cards = self.registry.list().await;
        tracing::info!(%operation, cards = cards.len(), "batch started");

        // Draws happen here, in registry order, so a seeded gateway repeats
        // regardless of how the runtime schedules the calls.
        let mut in_flight = JoinSet::new();
        for (index, card) in cards.into_iter().enumerate() {
            let plan = self.gateway.prepare(&card, operation);
            let gateway = Arc::clone(&self.gateway);
            in_flight.spawn(async move { (index, gateway.execute(&card, operation, plan).await) });
        }

        let mut slots: Vec<Option<ProviderResult>> = vec![None; in_flight.len()];
        let mut fault = None;
        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok((index, result)) => {
                    self.apply(operation, &result).await;
                    slots[index] = Some(result);
                }
                Err(e) => {
                    tracing::error!(%operation, error = %e, "provider call aborted");
                    if fault.is_none() {
                        fault = Some(e);
                    }
                }
            }
        }

        if let Some(e) = fault {
            self.record_unexpected(operation).await;
            return Err(AppError::Internal(format!(
                "{operation} ALL provider call aborted: {e}"
            )));
        }

        let results: Vec<ProviderResult> = slots.into_iter().flatten().collect();
        let any_failed = results.iter().any(|r| !r.ok);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.audit
            .append(
                NewAuditEvent::new(
                    AuditEventType::RequestCompleted,
                    format!("{operation} ALL completed in {elapsed_ms}ms"),
                )
                .with_meta(&json!({ "elapsedMs": elapsed_ms, "results": results })),
            )
            .await;

        tracing::info!(
            %operation,
            elapsed_ms,
            failed = results.iter().filter(|r| !r.ok).count(),
            "batch completed"
        );

        Ok(BatchOutcome {
            any_failed,
            results,
        })
    }

    /// Records one provider result: status change and audit entry happen under
    /// the same lock so concurrent batches cannot interleave them.
    async fn apply(&self, operation: Operation, result: &ProviderResult) {
        let _guard = self.commit.lock().await;

        if result.ok {
            if self
                .registry
                .set_status(&result.card_id, operation.target_status())
                .await
                .is_none()
            {
                tracing::error!(card_id = %result.card_id, "provider result for unknown card");
            }
            self.audit
                .append(
                    NewAuditEvent::new(
                        AuditEventType::card_changed(operation),
                        format!(
                            "{} {} ({})",
                            operation.past_tense(),
                            result.card_id,
                            result.provider
                        ),
                    )
                    .with_meta(result),
                )
                .await;
        } else {
            tracing::warn!(
                %operation,
                card_id = %result.card_id,
                provider = %result.provider,
                latency_ms = result.latency_ms,
                "provider call failed"
            );
            self.audit
                .append(
                    NewAuditEvent::new(
                        AuditEventType::RequestFailed,
                        format!(
                            "Failed {} {} ({})",
                            operation.gerund(),
                            result.card_id,
                            result.provider
                        ),
                    )
                    .with_meta(result),
                )
                .await;
        }
    }

    async fn record_unexpected(&self, operation: Operation) {
        self.audit
            .append(NewAuditEvent::new(
                AuditEventType::RequestFailed,
                format!("Unexpected server error during {operation} ALL"),
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{Card, CardStatus, Provider};
    use crate::domain::ports::ProviderGateway;
    use crate::domain::provider::CallPlan;
    use crate::infrastructure::random::SequenceSource;
    use crate::infrastructure::simulator::ProviderSimulator;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Fails the listed card ids and succeeds everything else, after a per-card delay.
    struct Scripted {
        failing: HashSet<String>,
        delays: Vec<(String, u64)>,
    }

    #[async_trait]
    impl ProviderGateway for Scripted {
        async fn execute(
            &self,
            card: &Card,
            _operation: Operation,
            _plan: CallPlan,
        ) -> ProviderResult {
            let latency = self
                .delays
                .iter()
                .find(|(id, _)| id == &card.id)
                .map(|(_, ms)| *ms)
                .unwrap_or(300);
            tokio::time::sleep(Duration::from_millis(latency)).await;
            if self.failing.contains(&card.id) {
                ProviderResult::failure(card, latency, "Provider timeout (simulated)")
            } else {
                ProviderResult::success(card, latency, "ok")
            }
        }
    }

    struct Panicking;

    #[async_trait]
    impl ProviderGateway for Panicking {
        async fn execute(
            &self,
            _card: &Card,
            _operation: Operation,
            _plan: CallPlan,
        ) -> ProviderResult {
            panic!("provider exploded");
        }
    }

    fn actuator(gateway: ProviderGatewayArc) -> BatchActuator {
        BatchActuator::new(CardRegistry::seeded(), AuditLog::new(), gateway)
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_all_success() {
        let actuator = actuator(Arc::new(ProviderSimulator::new(Arc::new(
            SequenceSource::always_succeed(),
        ))));

        let outcome = actuator.run_batch(Operation::Block).await.unwrap();

        assert!(!outcome.any_failed);
        assert_eq!(outcome.results.len(), 3);
        let cards = actuator.registry().list().await;
        assert!(cards.iter().all(|c| c.status == CardStatus::Blocked));

        let events = actuator.audit().list().await;
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].event_type, AuditEventType::RequestCompleted);
        assert_eq!(events[4].event_type, AuditEventType::BlockAllRequested);
        assert_eq!(events[4].message, "User requested BLOCK ALL.");
        assert!(
            events[1..4]
                .iter()
                .all(|e| e.event_type == AuditEventType::CardBlocked)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_keeps_prior_status() {
        let actuator = actuator(Arc::new(Scripted {
            failing: HashSet::from(["c2".to_string()]),
            delays: vec![],
        }));

        let outcome = actuator.run_batch(Operation::Block).await.unwrap();

        assert!(outcome.any_failed);
        let cards = actuator.registry().list().await;
        assert_eq!(cards[0].status, CardStatus::Blocked);
        assert_eq!(cards[1].status, CardStatus::Active);
        assert_eq!(cards[2].status, CardStatus::Blocked);

        let failed: Vec<_> = actuator
            .audit()
            .list()
            .await
            .into_iter()
            .filter(|e| e.event_type == AuditEventType::RequestFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].message, "Failed blocking c2 (BOFA_MOCK)");
        assert_eq!(failed[0].meta.as_ref().unwrap()["cardId"], "c2");

        let events = actuator.audit().list().await;
        assert_eq!(events[0].event_type, AuditEventType::RequestCompleted);
        let recorded = &events[0].meta.as_ref().unwrap()["results"];
        assert_eq!(recorded.as_array().unwrap().len(), 3);
        assert_eq!(*recorded, serde_json::to_value(&outcome.results).unwrap());
        assert_eq!(recorded[1]["ok"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unblock_restores_active() {
        let actuator = actuator(Arc::new(Scripted {
            failing: HashSet::new(),
            delays: vec![],
        }));
        actuator.run_batch(Operation::Block).await.unwrap();
        let outcome = actuator.run_batch(Operation::Unblock).await.unwrap();

        assert!(!outcome.any_failed);
        let cards = actuator.registry().list().await;
        assert!(cards.iter().all(|c| c.status == CardStatus::Active));

        let events = actuator.audit().list().await;
        assert_eq!(events.len(), 10);
        assert_eq!(events[4].event_type, AuditEventType::UnblockAllRequested);
        assert!(events[0].message.starts_with("UNBLOCK ALL completed in "));
        assert_eq!(
            events
                .iter()
                .filter(|e| e.event_type == AuditEventType::CardUnblocked)
                .count(),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_card_events_follow_completion_order() {
        let actuator = actuator(Arc::new(Scripted {
            failing: HashSet::new(),
            delays: vec![
                ("c1".to_string(), 900),
                ("c2".to_string(), 300),
                ("c3".to_string(), 600),
            ],
        }));

        let outcome = actuator.run_batch(Operation::Block).await.unwrap();

        // Results stay in registry order.
        let ids: Vec<_> = outcome.results.iter().map(|r| r.card_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);

        // Events are newest first: c1 finished last.
        let events = actuator.audit().list().await;
        let messages: Vec<_> = events[1..4].iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Blocked c1 (AMEX_MOCK)",
                "Blocked c3 (CAPONE_MOCK)",
                "Blocked c2 (BOFA_MOCK)"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_latency_is_bounded_by_slowest_call() {
        let actuator = actuator(Arc::new(Scripted {
            failing: HashSet::new(),
            delays: vec![
                ("c1".to_string(), 1000),
                ("c2".to_string(), 1000),
                ("c3".to_string(), 1000),
            ],
        }));

        let started = tokio::time::Instant::now();
        actuator.run_batch(Operation::Block).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(2000));

        let events = actuator.audit().list().await;
        let elapsed = events[0].meta.as_ref().unwrap()["elapsedMs"].as_u64().unwrap();
        assert!((1000..2000).contains(&elapsed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_registry() {
        let actuator = BatchActuator::new(
            CardRegistry::new(vec![]),
            AuditLog::new(),
            Arc::new(ProviderSimulator::seeded(1)),
        );

        let outcome = actuator.run_batch(Operation::Unblock).await.unwrap();
        assert!(!outcome.any_failed);
        assert!(outcome.results.is_empty());
        assert_eq!(actuator.audit().len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_larger_batches_respect_audit_cap() {
        let cards: Vec<Card> = (0..60)
            .map(|i| Card::new(&format!("x{i}"), "Test", "0000", Provider::AmexMock))
            .collect();
        let actuator = BatchActuator::new(
            CardRegistry::new(cards),
            AuditLog::new(),
            Arc::new(ProviderSimulator::seeded(3)),
        );

        let outcome = actuator.run_batch(Operation::Block).await.unwrap();
        assert_eq!(outcome.results.len(), 60);
        assert_eq!(actuator.audit().len().await, 50);

        for (card, result) in actuator.registry().list().await.iter().zip(&outcome.results) {
            assert_eq!(card.id, result.card_id);
            assert_eq!(card.status == CardStatus::Blocked, result.ok);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_batches_run_independently() {
        let actuator = actuator(Arc::new(Scripted {
            failing: HashSet::new(),
            delays: vec![],
        }));

        let (a, b) = tokio::join!(
            actuator.run_batch(Operation::Block),
            actuator.run_batch(Operation::Block)
        );
        assert_eq!(a.unwrap().results.len(), 3);
        assert_eq!(b.unwrap().results.len(), 3);
        assert_eq!(actuator.audit().len().await, 10);
    }

    #[tokio::test]
    async fn test_panicking_provider_is_an_internal_failure() {
        let actuator = actuator(Arc::new(Panicking));

        let result = actuator.run_batch(Operation::Unblock).await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        let events = actuator.audit().list().await;
        assert_eq!(events[0].event_type, AuditEventType::RequestFailed);
        assert_eq!(events[0].message, "Unexpected server error during UNBLOCK ALL");
        assert_eq!(events[1].event_type, AuditEventType::UnblockAllRequested);
    }
}
