//! MySQL implementation of [`LedgerSource`]
//!
//! Table and column names come from the static catalog; every request value
//! (codes, dates, warehouse, division, mill) is a bound parameter.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{
    Category, CatgroupFilter, DateBound, Item, ItemMeta, MillFilter, PartialSums,
    RecipeIngredient, BENGAL_GRAM, FINISHED_GOODS, FRIED_GRAM, RAW_MATERIAL_GROUP,
};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use super::catalog::{Filter, FilterValue, BAG_SOURCE};
use super::source::{BagQuery, BagRow, LedgerSource, SumQuery};
use crate::error::AppResult;

/// Ledger tables of one tenant database
#[derive(Clone)]
pub struct MySqlLedgerSource {
    pool: MySqlPool,
}

#[derive(Debug, FromRow)]
struct SumRow {
    code: String,
    total: Decimal,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    code: String,
    description: String,
    category: String,
    catgroup: String,
    division: Option<String>,
    item_type: Option<String>,
    mill: Option<String>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            code: row.code,
            description: row.description,
            category: row.category,
            catgroup: row.catgroup,
            division: row.division,
            item_type: row.item_type,
            mill: row.mill,
        }
    }
}

#[derive(Debug, FromRow)]
struct MetaRow {
    code: String,
    weight: Option<Decimal>,
    item_type: Option<String>,
}

#[derive(Debug, FromRow)]
struct IngredientRow {
    product_code: String,
    ingredient_code: String,
    description: String,
    category: String,
    catgroup: String,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    name: String,
    catgroup: String,
}

const ITEM_COLUMNS: &str = "SELECT i.code, COALESCE(i.description, '') AS description, \
     COALESCE(i.category, '') AS category, i.catgroup, \
     g.division, i.type AS item_type, i.mill \
     FROM items i LEFT JOIN catgroups g ON g.name = i.catgroup";

const REPORT_ORDER: &str = " ORDER BY i.category DESC, i.code ASC";

fn push_filter<'q>(qb: &mut QueryBuilder<'q, MySql>, filter: &Filter) {
    match filter {
        Filter::Eq(column, value) => {
            qb.push(format!(" AND {} = ", column));
            push_value(qb, value);
        }
        Filter::Ne(column, value) => {
            qb.push(format!(" AND ({column} IS NULL OR {column} <> "));
            push_value(qb, value);
            qb.push(")");
        }
    }
}

fn push_value<'q>(qb: &mut QueryBuilder<'q, MySql>, value: &FilterValue) {
    match *value {
        FilterValue::Int(v) => qb.push_bind(v),
        FilterValue::Text(v) => qb.push_bind(v),
    };
}

fn push_date_bound<'q>(qb: &mut QueryBuilder<'q, MySql>, column: &str, bound: &DateBound) {
    match *bound {
        DateBound::Before(limit) => {
            qb.push(format!(" AND {} < ", column));
            qb.push_bind(limit);
        }
        DateBound::Within(range) => {
            qb.push(format!(" AND {} BETWEEN ", column));
            qb.push_bind(range.start);
            qb.push(" AND ");
            qb.push_bind(range.end);
        }
    }
}

fn push_warehouse<'q>(
    qb: &mut QueryBuilder<'q, MySql>,
    column: Option<&'static str>,
    warehouse: Option<&'q str>,
) {
    if let (Some(column), Some(warehouse)) = (column, warehouse) {
        qb.push(format!(" AND {} = ", column));
        qb.push_bind(warehouse);
    }
}

fn push_code_list<'q>(qb: &mut QueryBuilder<'q, MySql>, codes: &'q [String]) {
    qb.push("(");
    let mut separated = qb.separated(", ");
    for code in codes {
        separated.push_bind(code.as_str());
    }
    separated.push_unseparated(")");
}

/// Grouped sum of one catalog source
pub fn sum_query<'q>(query: &SumQuery<'q>) -> QueryBuilder<'q, MySql> {
    let source = query.source;
    let mut qb = QueryBuilder::new(format!(
        "SELECT {code} AS code, CAST(COALESCE(SUM({qty}), 0) AS DECIMAL(20, 4)) AS total \
         FROM {table} WHERE {code} IN ",
        code = source.code_column,
        qty = source.quantity_column,
        table = source.table,
    ));
    push_code_list(&mut qb, query.codes);
    push_date_bound(&mut qb, source.date_column, &query.bound);
    for filter in source.filters {
        push_filter(&mut qb, filter);
    }
    push_warehouse(&mut qb, source.warehouse_column, query.warehouse);
    qb.push(format!(" GROUP BY {}", source.code_column));
    qb
}

fn push_bag_code_match<'q>(qb: &mut QueryBuilder<'q, MySql>, codes: &[String]) {
    if codes.is_empty() {
        return;
    }
    qb.push(" AND (");
    let mut separated = qb.separated(" OR ");
    for code in codes {
        separated.push(format!("{} LIKE ", BAG_SOURCE.codes_column));
        separated.push_bind_unseparated(format!("%{}%", code.trim()));
    }
    separated.push_unseparated(")");
}

/// Bag-splitting rows before a date that may pack one of the codes
pub fn bag_query<'q>(query: &BagQuery<'q>) -> QueryBuilder<'q, MySql> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT COALESCE({codes}, '') AS bag_codes, COALESCE({counts}, '') AS bag_counts \
         FROM {table} WHERE 1 = 1",
        codes = BAG_SOURCE.codes_column,
        counts = BAG_SOURCE.counts_column,
        table = BAG_SOURCE.table,
    ));
    push_date_bound(&mut qb, BAG_SOURCE.date_column, &DateBound::Before(query.before));
    for filter in BAG_SOURCE.filters {
        push_filter(&mut qb, filter);
    }
    push_warehouse(&mut qb, BAG_SOURCE.warehouse_column, query.warehouse);
    push_bag_code_match(&mut qb, query.codes);
    qb
}

/// Weight and type lookup
pub fn item_meta_query(codes: &[String]) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::new(
        "SELECT code, CAST(weight AS DECIMAL(20, 4)) AS weight, type AS item_type \
         FROM items WHERE code IN ",
    );
    push_code_list(&mut qb, codes);
    qb
}

/// Finished goods of a division
pub fn finished_items_query(filter: &CatgroupFilter) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::new(ITEM_COLUMNS);
    qb.push(" WHERE i.type = ");
    qb.push_bind(FINISHED_GOODS);
    if let CatgroupFilter::Division(division) = filter {
        qb.push(" AND g.division = ");
        qb.push_bind(division.as_str());
    }
    qb.push(REPORT_ORDER);
    qb
}

/// Raw-material ingredients of the given products
pub fn recipe_query(product_codes: &[String]) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::new(
        "SELECT r.product_code, r.ingredient_code, COALESCE(i.description, '') AS description, \
         COALESCE(i.category, '') AS category, i.catgroup \
         FROM recipes r JOIN items i ON i.code = r.ingredient_code \
         WHERE i.catgroup = ",
    );
    qb.push_bind(RAW_MATERIAL_GROUP);
    qb.push(" AND r.product_code IN ");
    push_code_list(&mut qb, product_codes);
    qb.push(" ORDER BY r.product_code, r.id");
    qb
}

/// Fried gram and bengal gram items, optionally on one mill
pub fn fried_gram_query(mill: &MillFilter) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::new(ITEM_COLUMNS);
    qb.push(" WHERE i.catgroup IN (");
    qb.push_bind(FRIED_GRAM);
    qb.push(", ");
    qb.push_bind(BENGAL_GRAM);
    qb.push(")");
    if let MillFilter::Equals(value) = mill {
        qb.push(" AND i.mill = ");
        qb.push_bind(value.as_str());
    }
    qb.push(REPORT_ORDER);
    qb
}

/// Distinct finished-goods categories of a division
pub fn categories_query(filter: &CatgroupFilter) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::new(
        "SELECT DISTINCT i.category AS name, i.catgroup \
         FROM items i LEFT JOIN catgroups g ON g.name = i.catgroup WHERE i.type = ",
    );
    qb.push_bind(FINISHED_GOODS);
    if let CatgroupFilter::Division(division) = filter {
        qb.push(" AND g.division = ");
        qb.push_bind(division.as_str());
    }
    qb.push(" ORDER BY name DESC");
    qb
}

impl MySqlLedgerSource {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerSource for MySqlLedgerSource {
    async fn grouped_sum(&self, query: &SumQuery<'_>) -> AppResult<PartialSums> {
        if query.codes.is_empty() {
            return Ok(PartialSums::new());
        }
        let mut qb = sum_query(query);
        let rows: Vec<SumRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        tracing::trace!(table = query.source.table, rows = rows.len(), "grouped sum");
        Ok(rows.into_iter().map(|row| (row.code, row.total)).collect())
    }

    async fn bag_rows(&self, query: &BagQuery<'_>) -> AppResult<Vec<BagRow>> {
        if query.codes.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = bag_query(query);
        let rows: Vec<BagRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        tracing::trace!(table = BAG_SOURCE.table, rows = rows.len(), "bag rows");
        Ok(rows)
    }

    async fn item_meta(&self, codes: &[String]) -> AppResult<Vec<ItemMeta>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = item_meta_query(codes);
        let rows: Vec<MetaRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| ItemMeta {
                code: row.code,
                weight: row.weight,
                item_type: row.item_type,
            })
            .collect())
    }

    async fn finished_items(&self, filter: &CatgroupFilter) -> AppResult<Vec<Item>> {
        let mut qb = finished_items_query(filter);
        let rows: Vec<ItemRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn recipe_ingredients(
        &self,
        product_codes: &[String],
    ) -> AppResult<Vec<RecipeIngredient>> {
        if product_codes.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = recipe_query(product_codes);
        let rows: Vec<IngredientRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| RecipeIngredient {
                product_code: row.product_code,
                ingredient_code: row.ingredient_code,
                description: row.description,
                category: row.category,
                catgroup: row.catgroup,
            })
            .collect())
    }

    async fn fried_gram_items(&self, mill: &MillFilter) -> AppResult<Vec<Item>> {
        let mut qb = fried_gram_query(mill);
        let rows: Vec<ItemRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn categories(&self, filter: &CatgroupFilter) -> AppResult<Vec<Category>> {
        let mut qb = categories_query(filter);
        let rows: Vec<CategoryRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| Category {
                name: row.name,
                catgroup: row.catgroup,
            })
            .collect())
    }
}
