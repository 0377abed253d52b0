//! Domain types for the card-lock prototype and the early-access list, plus
//! the ports their infrastructure implements.

pub mod audit;
pub mod card;
pub mod early_access;
pub mod ports;
pub mod provider;
