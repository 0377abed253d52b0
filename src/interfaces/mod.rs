//! Outer adapters: request handlers and the CSV export used by maintenance jobs.

pub mod api;
pub mod csv;
