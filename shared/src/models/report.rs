//! Report models and inclusion rules

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::{round2, Item, LedgerRow, RecipeIngredient};

/// Default report division
pub const FRIED_GRAM_MILL: &str = "Fried Gram Mill";

/// Selector value meaning "every division"
pub const ALL_CATGROUPS: &str = "--All--";

pub const FRIED_GRAM: &str = "FRIED GRAM";
pub const BENGAL_GRAM: &str = "BENGAL GRAM";

/// Key of the raw-material side table
pub const ALL_RAW_MATERIALS: &str = "All Raw Materials";

/// Minimum opening stock for a raw material to be listed
const RAW_OPENING_FLOOR: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Division filter of the production report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatgroupFilter {
    All,
    Division(String),
}

impl CatgroupFilter {
    /// Missing selects the Fried Gram Mill; empty or `--All--` selects everything
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None => CatgroupFilter::Division(FRIED_GRAM_MILL.to_string()),
            Some("") | Some(ALL_CATGROUPS) => CatgroupFilter::All,
            Some(division) => CatgroupFilter::Division(division.to_string()),
        }
    }

    pub fn matches(&self, division: Option<&str>) -> bool {
        match self {
            CatgroupFilter::All => true,
            CatgroupFilter::Division(wanted) => division == Some(wanted.as_str()),
        }
    }

    /// Whether an item of `catgroup` counts toward total production.
    ///
    /// The Fried Gram Mill total only counts FRIED GRAM items.
    pub fn counts_toward_total(&self, catgroup: &str) -> bool {
        match self {
            CatgroupFilter::Division(division) if division == FRIED_GRAM_MILL => {
                catgroup == FRIED_GRAM
            }
            _ => true,
        }
    }
}

/// Production line filter of the fried gram report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MillFilter {
    Any,
    Equals(String),
}

impl MillFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => MillFilter::Any,
            Some(mill) => MillFilter::Equals(mill.to_string()),
        }
    }

    pub fn matches(&self, mill: Option<&str>) -> bool {
        match self {
            MillFilter::Any => true,
            MillFilter::Equals(wanted) => mill == Some(wanted.as_str()),
        }
    }
}

/// Inclusion policy selected by the `nstock` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// `nstock == 0`: everything that received stock
    #[default]
    All,
    /// `nstock == 1`: items currently short that still received stock
    Shortage,
}

impl StockPolicy {
    pub fn from_flag(nstock: i64) -> Self {
        if nstock == 1 {
            StockPolicy::Shortage
        } else {
            StockPolicy::All
        }
    }

    fn admits_shortage(&self, row: &LedgerRow) -> bool {
        match self {
            StockPolicy::All => true,
            StockPolicy::Shortage => {
                row.closing < Decimal::ZERO && row.purchased_transferin > Decimal::ZERO
            }
        }
    }

    pub fn includes_finished(&self, row: &LedgerRow) -> bool {
        row.purchased_transferin > Decimal::ZERO && self.admits_shortage(row)
    }

    pub fn includes_raw(&self, row: &LedgerRow) -> bool {
        row.opening >= RAW_OPENING_FLOOR && self.admits_shortage(row)
    }
}

/// `purchased / total * 100`, zero when there is no total
pub fn production_percentage(purchased: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round2(purchased / total * Decimal::ONE_HUNDRED)
}

/// Ledger row with its descriptive fields
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportRow {
    pub code: String,
    pub description: String,
    pub category: String,
    pub catgroup: String,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    #[serde(flatten)]
    pub ledger: LedgerRow,
    pub prod_percentage: Decimal,
}

impl ReportRow {
    pub fn for_item(item: &Item, ledger: LedgerRow) -> Self {
        Self {
            code: item.code.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            catgroup: item.catgroup.clone(),
            item_type: item.item_type.clone(),
            ledger,
            prod_percentage: Decimal::ZERO,
        }
    }

    pub fn for_ingredient(ingredient: &RecipeIngredient, ledger: LedgerRow) -> Self {
        Self {
            code: ingredient.ingredient_code.clone(),
            description: ingredient.description.clone(),
            category: ingredient.category.clone(),
            catgroup: ingredient.catgroup.clone(),
            item_type: None,
            ledger,
            prod_percentage: Decimal::ZERO,
        }
    }
}

/// Report rows grouped by category, in first-seen category order.
///
/// Serialises as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryRows {
    groups: Vec<(String, Vec<ReportRow>)>,
}

impl CategoryRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: &str, row: ReportRow) {
        match self.groups.iter_mut().find(|(name, _)| name == category) {
            Some((_, rows)) => rows.push(row),
            None => self.groups.push((category.to_string(), vec![row])),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[ReportRow]> {
        self.groups
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ReportRow])> {
        self.groups
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.groups.iter().flat_map(|(_, rows)| rows.iter())
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut ReportRow> {
        self.groups.iter_mut().flat_map(|(_, rows)| rows.iter_mut())
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|(_, rows)| rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for CategoryRows {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, rows) in &self.groups {
            map.serialize_entry(category, rows)?;
        }
        map.end()
    }
}

/// Raw-material side table of the production report
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RawMaterials {
    #[serde(rename = "All Raw Materials")]
    pub rows: Vec<ReportRow>,
}

/// Production report: finished goods per category plus raw materials
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductionReport {
    pub finished: CategoryRows,
    pub raw: RawMaterials,
    pub total_prd: Decimal,
}

/// Fried and bengal gram report, without raw materials or percentages
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FriedGramReport {
    pub finished: CategoryRows,
}

/// Query parameters shared by report requests
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReportParams {
    pub fromdate: Option<String>,
    pub todate: Option<String>,
    pub catgroup: Option<String>,
    pub nstock: Option<i64>,
    pub warehouse: Option<String>,
    pub mill: Option<String>,
}

impl ReportParams {
    /// Warehouse scope; empty means unscoped
    pub fn warehouse(&self) -> Option<&str> {
        self.warehouse
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }

    pub fn stock_policy(&self) -> StockPolicy {
        StockPolicy::from_flag(self.nstock.unwrap_or(0))
    }
}
