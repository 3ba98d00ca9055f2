//! Domain models for the stock ledger service

mod item;
mod ledger;
mod report;

pub use item::*;
pub use ledger::*;
pub use report::*;
