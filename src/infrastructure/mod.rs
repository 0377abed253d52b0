//! Adapters implementing the domain ports: in-memory state, the provider
//! simulator, the JSON file store and the local session verifier.

pub mod in_memory;
pub mod json_file;
pub mod random;
pub mod session;
pub mod simulator;
