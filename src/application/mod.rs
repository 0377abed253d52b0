//! Application layer containing the core orchestration.
//!
//! `BatchActuator` fans block/unblock calls out to every card on a `tokio`
//! `JoinSet` and records each outcome. `EarlyAccessList` uses an actor-like
//! writer task fed by a `tokio` channel to serialize every read-modify-write of
//! the signup store.

pub mod batch;
pub mod early_access;
