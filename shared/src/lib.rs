//! Shared types and models for the stock ledger service
//!
//! This crate holds the pure half of the system: ledger arithmetic, report
//! shaping and request parameter rules. It performs no I/O.

pub mod bag;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
