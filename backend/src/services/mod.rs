//! Business logic services for the stock ledger

pub mod lookup;
pub mod report;
pub mod stock;

pub use lookup::LookupService;
pub use report::{
    compose_fried_gram, compose_production, export_to_csv, FriedGramRequest, ProductionRequest,
    ReportService, StockRequest,
};
pub use stock::{LedgerRequest, StockLedger, WeightMode};
