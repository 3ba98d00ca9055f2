//! Report composer
//!
//! Builds the production report (finished goods per category, a raw-material
//! side table and production percentages) and the narrower fried gram
//! report. Every report computes its ledgers in one batch for all codes it
//! needs, then composes rows in memory.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    future::Future,
};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    production_percentage, round2, CategoryRows, CatgroupFilter, DateRange, FriedGramReport,
    Item, LedgerRow, MillFilter, ProductionReport, RawMaterials, RecipeIngredient, ReportParams,
    ReportRow, StockPolicy, ALL_RAW_MATERIALS,
};

use super::stock::{LedgerRequest, StockLedger, WeightMode};
use crate::{
    config::ReportConfig,
    db::LedgerSource,
    error::{AppError, AppResult},
};

/// Direct ledger request for a list of codes
#[derive(Debug, Clone)]
pub struct StockRequest {
    pub codes: Vec<String>,
    pub range: DateRange,
    pub warehouse: Option<String>,
    pub weighted: bool,
}

/// Production report request
#[derive(Debug, Clone)]
pub struct ProductionRequest {
    pub range: DateRange,
    pub catgroup: CatgroupFilter,
    pub policy: StockPolicy,
    pub warehouse: Option<String>,
}

impl ProductionRequest {
    pub fn from_params(params: &ReportParams, today: NaiveDate) -> Self {
        Self {
            range: DateRange::from_params(
                params.fromdate.as_deref(),
                params.todate.as_deref(),
                today,
            ),
            catgroup: CatgroupFilter::parse(params.catgroup.as_deref()),
            policy: params.stock_policy(),
            warehouse: params.warehouse().map(str::to_string),
        }
    }
}

/// Fried gram report request
#[derive(Debug, Clone)]
pub struct FriedGramRequest {
    pub range: DateRange,
    pub mill: MillFilter,
    pub policy: StockPolicy,
    pub warehouse: Option<String>,
}

impl FriedGramRequest {
    pub fn from_params(params: &ReportParams, today: NaiveDate) -> Self {
        Self {
            range: DateRange::from_params(
                params.fromdate.as_deref(),
                params.todate.as_deref(),
                today,
            ),
            mill: MillFilter::parse(params.mill.as_deref()),
            policy: params.stock_policy(),
            warehouse: params.warehouse().map(str::to_string),
        }
    }
}

/// Report service over one tenant's ledger source
pub struct ReportService<'s, S: ?Sized> {
    source: &'s S,
    config: ReportConfig,
}

impl<'s, S> ReportService<'s, S>
where
    S: LedgerSource + ?Sized,
{
    pub fn new(source: &'s S, config: ReportConfig) -> Self {
        Self { source, config }
    }

    fn ledger(&self) -> StockLedger<'s, S> {
        StockLedger::new(self.source, self.config.max_in_flight_queries)
    }

    /// Run `work` under the request deadline
    async fn with_deadline<T, F>(&self, work: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let limit = self.config.timeout();
        tokio::time::timeout(limit, work)
            .await
            .map_err(|_| AppError::DeadlineExceeded(limit))?
    }

    /// Ledger rows for explicit codes, keyed by code
    pub async fn stock_ledger(
        &self,
        request: &StockRequest,
    ) -> AppResult<BTreeMap<String, LedgerRow>> {
        self.with_deadline(async {
            let ledger = self.ledger();
            let rows = ledger
                .compute(&LedgerRequest {
                    codes: &request.codes,
                    range: request.range,
                    warehouse: request.warehouse.as_deref(),
                    weights: WeightMode::from(request.weighted),
                })
                .await?;
            Ok(rows.into_iter().collect())
        })
        .await
    }

    /// Production report for a division
    pub async fn production_report(
        &self,
        request: &ProductionRequest,
    ) -> AppResult<ProductionReport> {
        self.with_deadline(async {
            let finished = self.source.finished_items(&request.catgroup).await?;
            let finished_codes: Vec<String> =
                finished.iter().map(|item| item.code.clone()).collect();
            let ingredients = self.source.recipe_ingredients(&finished_codes).await?;

            let codes = batch_codes(
                finished.iter().map(|item| item.code.as_str()).chain(
                    ingredients
                        .iter()
                        .map(|ingredient| ingredient.ingredient_code.as_str()),
                ),
            );
            let ledgers = self
                .ledger()
                .compute(&LedgerRequest {
                    codes: &codes,
                    range: request.range,
                    warehouse: request.warehouse.as_deref(),
                    weights: WeightMode::FinishedGoods,
                })
                .await?;

            let report = compose_production(
                &finished,
                &ingredients,
                &ledgers,
                &request.catgroup,
                request.policy,
            );
            tracing::info!(
                finished = report.finished.row_count(),
                raw = report.raw.rows.len(),
                total_prd = %report.total_prd,
                "production report composed"
            );
            Ok(report)
        })
        .await
    }

    /// Fried gram and bengal gram report for a production line
    pub async fn fried_gram_report(&self, request: &FriedGramRequest) -> AppResult<FriedGramReport> {
        self.with_deadline(async {
            let items = self.source.fried_gram_items(&request.mill).await?;
            let codes = batch_codes(items.iter().map(|item| item.code.as_str()));
            let ledgers = self
                .ledger()
                .compute(&LedgerRequest {
                    codes: &codes,
                    range: request.range,
                    warehouse: request.warehouse.as_deref(),
                    weights: WeightMode::FinishedGoods,
                })
                .await?;

            let report = compose_fried_gram(&items, &ledgers, request.policy);
            tracing::info!(
                finished = report.finished.row_count(),
                "fried gram report composed"
            );
            Ok(report)
        })
        .await
    }
}

/// Distinct codes in first-seen order
fn batch_codes<'a>(codes: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .filter(|code| seen.insert(*code))
        .map(str::to_string)
        .collect()
}

fn ledger_of(ledgers: &HashMap<String, LedgerRow>, code: &str) -> LedgerRow {
    ledgers.get(code).copied().unwrap_or_default()
}

/// Compose the production report from precomputed ledgers.
///
/// Finished rows keep the item order; total production only counts items
/// the division totals, and percentages are assigned once the total is
/// known. Raw materials follow the order of the finished items using them,
/// deduplicated by description before the inclusion filter.
pub fn compose_production(
    finished: &[Item],
    ingredients: &[RecipeIngredient],
    ledgers: &HashMap<String, LedgerRow>,
    catgroup: &CatgroupFilter,
    policy: StockPolicy,
) -> ProductionReport {
    let mut rows = CategoryRows::new();
    let mut total = Decimal::ZERO;

    for item in finished {
        let ledger = ledger_of(ledgers, &item.code);
        if !policy.includes_finished(&ledger) {
            continue;
        }
        if catgroup.counts_toward_total(&item.catgroup) {
            total += ledger.purchased_transferin;
        }
        rows.push(&item.category, ReportRow::for_item(item, ledger));
    }

    let total_prd = round2(total);
    for row in rows.rows_mut() {
        if catgroup.counts_toward_total(&row.catgroup) {
            row.prod_percentage =
                production_percentage(row.ledger.purchased_transferin, total_prd);
        }
    }

    let mut seen_descriptions = HashSet::new();
    let raw = finished
        .iter()
        .flat_map(|item| {
            ingredients
                .iter()
                .filter(move |ingredient| ingredient.product_code == item.code)
        })
        .filter(|ingredient| seen_descriptions.insert(ingredient.description.as_str()))
        .filter_map(|ingredient| {
            let ledger = ledger_of(ledgers, &ingredient.ingredient_code);
            policy
                .includes_raw(&ledger)
                .then(|| ReportRow::for_ingredient(ingredient, ledger))
        })
        .collect();

    ProductionReport {
        finished: rows,
        raw: RawMaterials { rows: raw },
        total_prd,
    }
}

/// Compose the fried gram report: grouping and inclusion only
pub fn compose_fried_gram(
    items: &[Item],
    ledgers: &HashMap<String, LedgerRow>,
    policy: StockPolicy,
) -> FriedGramReport {
    let mut rows = CategoryRows::new();
    for item in items {
        let ledger = ledger_of(ledgers, &item.code);
        if policy.includes_finished(&ledger) {
            rows.push(&item.category, ReportRow::for_item(item, ledger));
        }
    }
    FriedGramReport { finished: rows }
}

/// One flattened CSV line of a report
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    section: &'a str,
    category: &'a str,
    code: &'a str,
    description: &'a str,
    opening: String,
    purchased_transferin: String,
    consumed_transferout: String,
    sales: String,
    salesreturn: String,
    closing: String,
    prod_percentage: String,
}

fn fixed2(value: Decimal) -> String {
    format!("{:.2}", value)
}

impl<'a> CsvRecord<'a> {
    fn new(section: &'a str, category: &'a str, row: &'a ReportRow) -> Self {
        Self {
            section,
            category,
            code: &row.code,
            description: &row.description,
            opening: fixed2(row.ledger.opening),
            purchased_transferin: fixed2(row.ledger.purchased_transferin),
            consumed_transferout: fixed2(row.ledger.consumed_transferout),
            sales: fixed2(row.ledger.sales),
            salesreturn: fixed2(row.ledger.salesreturn),
            closing: fixed2(row.ledger.closing),
            prod_percentage: fixed2(row.prod_percentage),
        }
    }
}

/// Export a production report as CSV, finished rows first
pub fn export_to_csv(report: &ProductionReport) -> AppResult<String> {
    let finished = report
        .finished
        .iter()
        .flat_map(|(category, rows)| rows.iter().map(move |row| ("finished", category, row)));
    let raw = report
        .raw
        .rows
        .iter()
        .map(|row| ("raw", ALL_RAW_MATERIALS, row));

    let mut wtr = csv::Writer::from_writer(vec![]);
    for (section, category, row) in finished.chain(raw) {
        wtr.serialize(CsvRecord::new(section, category, row))
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(code: &str, category: &str, catgroup: &str) -> Item {
        Item {
            code: code.to_string(),
            description: format!("{} desc", code),
            category: category.to_string(),
            catgroup: catgroup.to_string(),
            division: Some(shared::FRIED_GRAM_MILL.to_string()),
            item_type: Some(shared::FINISHED_GOODS.to_string()),
            mill: None,
        }
    }

    fn ingredient(product: &str, code: &str, description: &str) -> RecipeIngredient {
        RecipeIngredient {
            product_code: product.to_string(),
            ingredient_code: code.to_string(),
            description: description.to_string(),
            category: "GRAM".to_string(),
            catgroup: shared::RAW_MATERIAL_GROUP.to_string(),
        }
    }

    fn ledger(opening: Decimal, purchased: Decimal) -> LedgerRow {
        LedgerRow::new(
            opening,
            &shared::WindowTotals {
                purchased,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_batch_codes_dedups_in_order() {
        let codes = batch_codes(["B", "A", "B", "C", "A"].into_iter());
        assert_eq!(codes, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_raw_materials_dedup_by_description_first_wins() {
        let finished = vec![item("FG1", "PREMIUM", "FRIED GRAM"), item("FG2", "PREMIUM", "FRIED GRAM")];
        let ingredients = vec![
            ingredient("FG2", "RM-B", "Bengal gram"),
            ingredient("FG1", "RM-A", "Bengal gram"),
        ];
        let ledgers: HashMap<String, LedgerRow> = [
            ("FG1".to_string(), ledger(dec!(0), dec!(10))),
            ("FG2".to_string(), ledger(dec!(0), dec!(10))),
            ("RM-A".to_string(), ledger(dec!(5), dec!(0))),
            ("RM-B".to_string(), ledger(dec!(7), dec!(0))),
        ]
        .into_iter()
        .collect();

        let report = compose_production(
            &finished,
            &ingredients,
            &ledgers,
            &CatgroupFilter::All,
            StockPolicy::All,
        );

        // FG1 comes first in item order, so its ingredient wins
        assert_eq!(report.raw.rows.len(), 1);
        assert_eq!(report.raw.rows[0].code, "RM-A");
    }

    #[test]
    fn test_export_to_csv_has_header_and_rows() {
        let finished = vec![item("FG1", "PREMIUM", "FRIED GRAM")];
        let ledgers: HashMap<String, LedgerRow> =
            [("FG1".to_string(), ledger(dec!(2), dec!(10)))].into_iter().collect();
        let report = compose_production(
            &finished,
            &[],
            &ledgers,
            &CatgroupFilter::All,
            StockPolicy::All,
        );

        let csv = export_to_csv(&report).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some(
                "section,category,code,description,opening,purchased_transferin,\
                 consumed_transferout,sales,salesreturn,closing,prod_percentage"
            )
        );
        assert_eq!(lines.next(), Some("finished,PREMIUM,FG1,FG1 desc,2.00,10.00,0.00,0.00,0.00,12.00,100.00"));
        assert_eq!(lines.next(), None);
    }

    proptest! {
        #[test]
        fn prop_bengal_gram_never_takes_a_share(
            produced in prop::collection::vec((1i64..10_000, any::<bool>()), 1..12)
        ) {
            let finished: Vec<Item> = produced
                .iter()
                .enumerate()
                .map(|(i, (_, fried))| {
                    let catgroup = if *fried { shared::FRIED_GRAM } else { shared::BENGAL_GRAM };
                    item(&format!("FG{}", i), "PREMIUM", catgroup)
                })
                .collect();
            let ledgers: HashMap<String, LedgerRow> = produced
                .iter()
                .enumerate()
                .map(|(i, (qty, _))| (format!("FG{}", i), ledger(dec!(0), Decimal::from(*qty))))
                .collect();
            let expected_total: i64 = produced
                .iter()
                .filter(|(_, fried)| *fried)
                .map(|(qty, _)| *qty)
                .sum();

            let report = compose_production(
                &finished,
                &[],
                &ledgers,
                &CatgroupFilter::parse(None),
                StockPolicy::All,
            );

            prop_assert_eq!(report.total_prd, Decimal::from(expected_total));
            for row in report.finished.rows() {
                if row.catgroup == shared::BENGAL_GRAM {
                    prop_assert_eq!(row.prod_percentage, Decimal::ZERO);
                } else {
                    prop_assert!(row.prod_percentage >= Decimal::ZERO);
                    prop_assert!(row.prod_percentage <= Decimal::ONE_HUNDRED);
                }
            }
        }
    }
}
