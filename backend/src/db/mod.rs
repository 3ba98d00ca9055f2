//! Database access for the stock ledger

pub mod catalog;
pub mod mysql;
pub mod registry;
pub mod source;

pub use catalog::{SourceId, SumSource};
pub use mysql::MySqlLedgerSource;
pub use registry::PoolRegistry;
pub use source::{BagQuery, BagRow, LedgerSource, SumQuery};
