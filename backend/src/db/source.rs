//! Data-access seam of the ledger engine
//!
//! The calculators never touch a pool directly. They receive a
//! [`LedgerSource`], which production backs with MySQL and tests back with
//! in-memory rows.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    Category, CatgroupFilter, DateBound, Item, ItemMeta, MillFilter, PartialSums,
    RecipeIngredient,
};

use super::catalog::SumSource;
use crate::error::AppResult;

/// One grouped-sum pass over a catalog source
#[derive(Debug, Clone, Copy)]
pub struct SumQuery<'a> {
    pub source: &'static SumSource,
    pub codes: &'a [String],
    pub bound: DateBound,
    /// `None` omits the warehouse clause entirely
    pub warehouse: Option<&'a str>,
}

/// Bag-splitting rows dated before `before` that mention any of `codes`
#[derive(Debug, Clone, Copy)]
pub struct BagQuery<'a> {
    pub codes: &'a [String],
    pub before: NaiveDate,
    pub warehouse: Option<&'a str>,
}

/// Raw bag-type fields of one bag-splitting row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BagRow {
    pub bag_codes: String,
    pub bag_counts: String,
}

/// Read-only access to one tenant's ledger tables
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Sum the source's quantity per code. Codes without rows are absent.
    async fn grouped_sum(&self, query: &SumQuery<'_>) -> AppResult<PartialSums>;

    /// Bag-splitting rows whose bag-type field contains one of the codes as a
    /// substring. Exact token matching is left to the caller.
    async fn bag_rows(&self, query: &BagQuery<'_>) -> AppResult<Vec<BagRow>>;

    /// Unit weight and type for the given codes
    async fn item_meta(&self, codes: &[String]) -> AppResult<Vec<ItemMeta>>;

    /// Finished goods of a division, ordered by category descending then code
    async fn finished_items(&self, filter: &CatgroupFilter) -> AppResult<Vec<Item>>;

    /// Raw-material ingredients used by the given products
    async fn recipe_ingredients(&self, product_codes: &[String])
        -> AppResult<Vec<RecipeIngredient>>;

    /// Fried gram and bengal gram items on a production line, report ordered
    async fn fried_gram_items(&self, mill: &MillFilter) -> AppResult<Vec<Item>>;

    /// Finished-goods categories of a division, in report order
    async fn categories(&self, filter: &CatgroupFilter) -> AppResult<Vec<Category>>;
}
