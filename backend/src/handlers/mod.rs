//! HTTP handlers

pub mod health;
pub mod lookup;
pub mod report;

pub use health::health_check;
pub use lookup::{get_recipe, list_categories};
pub use report::{fried_gram_report, production_report, stock_ledger};

use crate::{db::MySqlLedgerSource, error::AppResult, middleware::AuthUser, AppState};

/// Ledger source of the caller's tenant database
pub(crate) async fn tenant_source(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<MySqlLedgerSource> {
    let pool = state.registry.pool_for(&user.dbase).await?;
    Ok(MySqlLedgerSource::new(pool))
}
