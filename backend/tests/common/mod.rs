//! In-memory ledger source for integration tests
//!
//! Rows are stored per table as loose column maps and evaluated against the
//! same catalog entries the MySQL source renders, so filters, date bounds and
//! warehouse scoping behave identically. Every call is counted, and the
//! number of concurrent grouped-sum calls is tracked.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use backend::{
    db::{
        catalog::{self, Filter, SourceId, BAG_SOURCE},
        BagQuery, BagRow, LedgerSource, SumQuery,
    },
    AppError, AppResult,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    Category, CatgroupFilter, Item, ItemMeta, MillFilter, PartialSums, RecipeIngredient,
    BENGAL_GRAM, FINISHED_GOODS, FRIED_GRAM, FRIED_GRAM_MILL, RAW_MATERIAL_GROUP,
};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

/// One stored row of a transactional table
#[derive(Debug, Clone)]
struct Row {
    table: &'static str,
    date: NaiveDate,
    qty: Decimal,
    columns: HashMap<&'static str, String>,
}

impl Row {
    fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }

    fn passes(&self, filter: &Filter) -> bool {
        match filter {
            Filter::Eq(column, value) => self.column(column) == Some(value.to_string().as_str()),
            Filter::Ne(column, value) => self.column(column) != Some(value.to_string().as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct ItemRecord {
    item: Item,
    weight: Option<Decimal>,
}

#[derive(Default)]
pub struct MemorySource {
    rows: Vec<Row>,
    items: Vec<ItemRecord>,
    recipes: Vec<(String, String)>,
    failing: Vec<SourceId>,
    latency: Option<Duration>,
    queries: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    bag_rows_read: AtomicUsize,
    tables: Mutex<Vec<&'static str>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every grouped-sum call sleeps this long
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Grouped sums over this source fail
    pub fn fail_on(&mut self, id: SourceId) -> &mut Self {
        self.failing.push(id);
        self
    }

    /// Post a live row that passes every static filter of the source
    pub fn post(&mut self, id: SourceId, code: &str, date: NaiveDate, qty: Decimal) -> &mut Self {
        self.post_with(id, code, date, qty, None, &[])
    }

    /// Post a live row scoped to a warehouse
    pub fn post_at(
        &mut self,
        id: SourceId,
        code: &str,
        date: NaiveDate,
        qty: Decimal,
        warehouse: &str,
    ) -> &mut Self {
        self.post_with(id, code, date, qty, Some(warehouse), &[])
    }

    /// Post a row with explicit column overrides
    pub fn post_with(
        &mut self,
        id: SourceId,
        code: &str,
        date: NaiveDate,
        qty: Decimal,
        warehouse: Option<&str>,
        overrides: &[(&'static str, &str)],
    ) -> &mut Self {
        let source = catalog::source(id).expect("catalog source");
        let mut columns = HashMap::new();
        columns.insert(source.code_column, code.to_string());
        for filter in source.filters {
            if let Filter::Eq(column, value) = filter {
                columns.insert(*column, value.to_string());
            }
        }
        if let (Some(column), Some(warehouse)) = (source.warehouse_column, warehouse) {
            columns.insert(column, warehouse.to_string());
        }
        for (column, value) in overrides {
            columns.insert(*column, value.to_string());
        }
        self.rows.push(Row {
            table: source.table,
            date,
            qty,
            columns,
        });
        self
    }

    /// Post a stock transfer between two warehouses
    pub fn transfer(
        &mut self,
        code: &str,
        date: NaiveDate,
        qty: Decimal,
        from: &str,
        to: &str,
    ) -> &mut Self {
        self.post_with(
            SourceId::TransferIn,
            code,
            date,
            qty,
            None,
            &[("from_warehouse", from), ("to_warehouse", to)],
        )
    }

    /// Post a live bag-splitting row
    pub fn bag(
        &mut self,
        date: NaiveDate,
        bag_codes: &str,
        bag_counts: &str,
        unit: Option<&str>,
    ) -> &mut Self {
        let mut columns = HashMap::new();
        columns.insert(BAG_SOURCE.codes_column, bag_codes.to_string());
        columns.insert(BAG_SOURCE.counts_column, bag_counts.to_string());
        columns.insert("dflag", "0".to_string());
        if let (Some(column), Some(unit)) = (BAG_SOURCE.warehouse_column, unit) {
            columns.insert(column, unit.to_string());
        }
        self.rows.push(Row {
            table: BAG_SOURCE.table,
            date,
            qty: Decimal::ZERO,
            columns,
        });
        self
    }

    /// Finished good in the Fried Gram Mill division
    pub fn finished(&mut self, code: &str, category: &str, catgroup: &str) -> &mut Self {
        self.finished_in(code, category, catgroup, FRIED_GRAM_MILL, None)
    }

    pub fn finished_in(
        &mut self,
        code: &str,
        category: &str,
        catgroup: &str,
        division: &str,
        mill: Option<&str>,
    ) -> &mut Self {
        self.items.push(ItemRecord {
            item: Item {
                code: code.to_string(),
                description: format!("{} description", code),
                category: category.to_string(),
                catgroup: catgroup.to_string(),
                division: Some(division.to_string()),
                item_type: Some(FINISHED_GOODS.to_string()),
                mill: mill.map(str::to_string),
            },
            weight: None,
        });
        self
    }

    /// Raw material that recipes may use
    pub fn raw(&mut self, code: &str, description: &str) -> &mut Self {
        self.items.push(ItemRecord {
            item: Item {
                code: code.to_string(),
                description: description.to_string(),
                category: "GRAM".to_string(),
                catgroup: RAW_MATERIAL_GROUP.to_string(),
                division: None,
                item_type: Some("Raw Material".to_string()),
                mill: None,
            },
            weight: None,
        });
        self
    }

    /// Item outside every report, only known to the weight lookup
    pub fn plain(&mut self, code: &str) -> &mut Self {
        self.items.push(ItemRecord {
            item: Item {
                code: code.to_string(),
                description: code.to_string(),
                category: "MISC".to_string(),
                catgroup: "MISC".to_string(),
                division: None,
                item_type: None,
                mill: None,
            },
            weight: None,
        });
        self
    }

    pub fn weight(&mut self, code: &str, weight: Decimal) -> &mut Self {
        if let Some(record) = self.items.iter_mut().find(|r| r.item.code == code) {
            record.weight = Some(weight);
        }
        self
    }

    pub fn recipe(&mut self, product: &str, ingredient: &str) -> &mut Self {
        self.recipes.push((product.to_string(), ingredient.to_string()));
        self
    }

    /// Total calls issued against the source
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Highest number of grouped sums observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Tables touched by grouped sums, in call order
    pub fn tables(&self) -> Vec<&'static str> {
        self.tables.lock().unwrap().clone()
    }

    pub fn reset_counters(&self) {
        self.queries.store(0, Ordering::SeqCst);
        self.peak.store(0, Ordering::SeqCst);
        self.bag_rows_read.store(0, Ordering::SeqCst);
        self.tables.lock().unwrap().clear();
    }

    /// Bag-splitting rows returned to callers so far
    pub fn bag_rows_read(&self) -> usize {
        self.bag_rows_read.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    fn item(&self, code: &str) -> Option<&Item> {
        self.items
            .iter()
            .find(|r| r.item.code == code)
            .map(|r| &r.item)
    }

    fn sorted(mut items: Vec<Item>) -> Vec<Item> {
        items.sort_by(|a, b| b.category.cmp(&a.category).then(a.code.cmp(&b.code)));
        items
    }
}

#[async_trait]
impl LedgerSource for MemorySource {
    async fn grouped_sum(&self, query: &SumQuery<'_>) -> AppResult<PartialSums> {
        self.count();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.tables.lock().unwrap().push(query.source.table);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let source = query.source;
        if self.failing.contains(&source.id) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }

        let mut sums = PartialSums::new();
        for row in self.rows.iter().filter(|row| row.table == source.table) {
            let Some(code) = row.column(source.code_column) else {
                continue;
            };
            if !query.codes.iter().any(|c| c == code) || !query.bound.matches(row.date) {
                continue;
            }
            if !source.filters.iter().all(|filter| row.passes(filter)) {
                continue;
            }
            if let (Some(column), Some(warehouse)) = (source.warehouse_column, query.warehouse) {
                if row.column(column) != Some(warehouse) {
                    continue;
                }
            }
            *sums.entry(code.to_string()).or_default() += row.qty;
        }
        Ok(sums)
    }

    async fn bag_rows(&self, query: &BagQuery<'_>) -> AppResult<Vec<BagRow>> {
        self.count();
        let rows: Vec<BagRow> = self
            .rows
            .iter()
            .filter(|row| row.table == BAG_SOURCE.table && row.date < query.before)
            .filter(|row| BAG_SOURCE.filters.iter().all(|filter| row.passes(filter)))
            .filter(|row| match (BAG_SOURCE.warehouse_column, query.warehouse) {
                (Some(column), Some(warehouse)) => row.column(column) == Some(warehouse),
                _ => true,
            })
            .map(|row| BagRow {
                bag_codes: row.column(BAG_SOURCE.codes_column).unwrap_or("").to_string(),
                bag_counts: row.column(BAG_SOURCE.counts_column).unwrap_or("").to_string(),
            })
            .filter(|row| {
                query
                    .codes
                    .iter()
                    .any(|code| row.bag_codes.contains(code.trim()))
            })
            .collect();
        self.bag_rows_read.fetch_add(rows.len(), Ordering::SeqCst);
        Ok(rows)
    }

    async fn item_meta(&self, codes: &[String]) -> AppResult<Vec<ItemMeta>> {
        self.count();
        Ok(self
            .items
            .iter()
            .filter(|r| codes.contains(&r.item.code))
            .map(|r| ItemMeta {
                code: r.item.code.clone(),
                weight: r.weight,
                item_type: r.item.item_type.clone(),
            })
            .collect())
    }

    async fn finished_items(&self, filter: &CatgroupFilter) -> AppResult<Vec<Item>> {
        self.count();
        Ok(Self::sorted(
            self.items
                .iter()
                .map(|r| &r.item)
                .filter(|item| item.is_finished_goods())
                .filter(|item| filter.matches(item.division.as_deref()))
                .cloned()
                .collect(),
        ))
    }

    async fn recipe_ingredients(
        &self,
        product_codes: &[String],
    ) -> AppResult<Vec<RecipeIngredient>> {
        self.count();
        let mut lines: Vec<RecipeIngredient> = self
            .recipes
            .iter()
            .filter(|(product, _)| product_codes.contains(product))
            .filter_map(|(product, ingredient)| {
                let item = self.item(ingredient)?;
                (item.catgroup == RAW_MATERIAL_GROUP).then(|| RecipeIngredient {
                    product_code: product.clone(),
                    ingredient_code: item.code.clone(),
                    description: item.description.clone(),
                    category: item.category.clone(),
                    catgroup: item.catgroup.clone(),
                })
            })
            .collect();
        lines.sort_by(|a, b| a.product_code.cmp(&b.product_code));
        Ok(lines)
    }

    async fn fried_gram_items(&self, mill: &MillFilter) -> AppResult<Vec<Item>> {
        self.count();
        Ok(Self::sorted(
            self.items
                .iter()
                .map(|r| &r.item)
                .filter(|item| item.catgroup == FRIED_GRAM || item.catgroup == BENGAL_GRAM)
                .filter(|item| mill.matches(item.mill.as_deref()))
                .cloned()
                .collect(),
        ))
    }

    async fn categories(&self, filter: &CatgroupFilter) -> AppResult<Vec<Category>> {
        self.count();
        let mut categories: Vec<Category> = Vec::new();
        for item in Self::sorted(self.finished_items_unlogged(filter)) {
            let category = Category {
                name: item.category,
                catgroup: item.catgroup,
            };
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        Ok(categories)
    }
}

impl MemorySource {
    fn finished_items_unlogged(&self, filter: &CatgroupFilter) -> Vec<Item> {
        self.items
            .iter()
            .map(|r| &r.item)
            .filter(|item| item.is_finished_goods())
            .filter(|item| filter.matches(item.division.as_deref()))
            .cloned()
            .collect()
    }
}
