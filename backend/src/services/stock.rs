//! Stock ledger engine
//!
//! Reconstructs the opening / movement / closing position of a batch of item
//! codes from the transactional tables listed in [`crate::db::catalog`].
//!
//! - the opening calculator sums every catalog source dated before the
//!   report start, plus bag-splitting counts, into [`OpeningStats`]
//! - the window calculator sums the movement sources inside the report range
//! - the weight normalizer converts rows into shipping units
//!
//! Grouped-sum queries of one calculator are independent and run
//! concurrently. A per-request semaphore caps in-flight queries across all
//! calculators so the tenant pool is never exhausted by one request.

use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::NaiveDate;
use futures::{stream, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use shared::{
    bag::{bag_count, contains_code}, fold_opening, fold_window, DateBound, DateRange, LedgerRow, OpeningStats,
    PartialSums, StatField, WeightInfo, WindowTotals,
};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::{
    db::{
        catalog::{opening_sources, window_sources},
        BagQuery, LedgerSource, SumQuery,
    },
    error::{AppError, AppResult},
};

/// Which rows are converted by their unit weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightMode {
    /// Base units, no weight lookup
    #[default]
    Base,
    /// Every row is multiplied by its code's weight
    All,
    /// Only rows of finished goods are multiplied; raw materials stay in
    /// base units
    FinishedGoods,
}

impl From<bool> for WeightMode {
    fn from(apply_weight: bool) -> Self {
        if apply_weight {
            WeightMode::All
        } else {
            WeightMode::Base
        }
    }
}

/// Arguments of one batch ledger computation
#[derive(Debug, Clone, Copy)]
pub struct LedgerRequest<'a> {
    pub codes: &'a [String],
    pub range: DateRange,
    pub warehouse: Option<&'a str>,
    pub weights: WeightMode,
}

/// Batch ledger calculator over one tenant's data
pub struct StockLedger<'s, S: ?Sized> {
    source: &'s S,
    permits: Arc<Semaphore>,
    fan_out: usize,
}

impl<'s, S> StockLedger<'s, S>
where
    S: LedgerSource + ?Sized,
{
    /// Create a calculator allowing at most `max_in_flight` concurrent queries
    pub fn new(source: &'s S, max_in_flight: usize) -> Self {
        let fan_out = max_in_flight.max(1);
        Self {
            source,
            permits: Arc::new(Semaphore::new(fan_out)),
            fan_out,
        }
    }

    async fn permit(&self) -> AppResult<SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("query permits closed: {}", e)))
    }

    async fn sum(&self, query: SumQuery<'_>) -> AppResult<(StatField, PartialSums)> {
        let _permit = self.permit().await?;
        let sums = self.source.grouped_sum(&query).await?;
        Ok((query.source.field, sums))
    }

    async fn bag_sums(
        &self,
        codes: &[String],
        before: NaiveDate,
        warehouse: Option<&str>,
    ) -> AppResult<(StatField, PartialSums)> {
        let rows = {
            let _permit = self.permit().await?;
            self.source
                .bag_rows(&BagQuery {
                    codes,
                    before,
                    warehouse,
                })
                .await?
        };

        let sums = codes
            .iter()
            .map(|code| {
                let packed: Decimal = rows
                    .iter()
                    .filter(|row| contains_code(&row.bag_codes, code))
                    .map(|row| bag_count(&row.bag_codes, &row.bag_counts, code))
                    .sum();
                (code.clone(), packed)
            })
            .filter(|(_, packed)| !packed.is_zero())
            .collect();

        Ok((StatField::Prod, sums))
    }

    /// Opening accumulators of `codes` strictly before `before`
    pub async fn opening_stats(
        &self,
        codes: &[String],
        before: NaiveDate,
        warehouse: Option<&str>,
    ) -> AppResult<HashMap<String, OpeningStats>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }
        let started = Instant::now();
        let bound = DateBound::Before(before);

        let queries: Vec<_> = opening_sources()
            .map(|source| {
                self.sum(SumQuery {
                    source,
                    codes,
                    bound,
                    warehouse,
                })
            })
            .collect();
        let sums = stream::iter(queries)
            .buffer_unordered(self.fan_out)
            .try_collect::<Vec<_>>();

        let (mut partials, bags) =
            tokio::try_join!(sums, self.bag_sums(codes, before, warehouse))?;
        partials.push(bags);

        tracing::debug!(
            codes = codes.len(),
            queries = partials.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "opening stats computed"
        );
        Ok(fold_opening(codes, partials))
    }

    /// Net opening balance per code
    pub async fn opening_balances(
        &self,
        codes: &[String],
        before: NaiveDate,
        warehouse: Option<&str>,
    ) -> AppResult<HashMap<String, Decimal>> {
        let stats = self.opening_stats(codes, before, warehouse).await?;
        Ok(stats
            .into_iter()
            .map(|(code, stats)| (code, stats.opening()))
            .collect())
    }

    /// Movement inside `range`, rounded per column
    pub async fn window_totals(
        &self,
        codes: &[String],
        range: DateRange,
        warehouse: Option<&str>,
    ) -> AppResult<HashMap<String, WindowTotals>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }
        let started = Instant::now();
        let bound = DateBound::Within(range);

        let queries: Vec<_> = window_sources()
            .map(|source| {
                self.sum(SumQuery {
                    source,
                    codes,
                    bound,
                    warehouse,
                })
            })
            .collect();
        let partials: Vec<(StatField, PartialSums)> = stream::iter(queries)
            .buffer_unordered(self.fan_out)
            .try_collect()
            .await?;

        tracing::debug!(
            codes = codes.len(),
            queries = partials.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "window totals computed"
        );
        Ok(fold_window(codes, partials))
    }

    /// Unit weight and type per code; codes missing from the item table get
    /// weight 1
    pub async fn weights(&self, codes: &[String]) -> AppResult<HashMap<String, WeightInfo>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }
        let metas = {
            let _permit = self.permit().await?;
            self.source.item_meta(codes).await?
        };

        let mut weights: HashMap<String, WeightInfo> = codes
            .iter()
            .map(|code| (code.clone(), WeightInfo::default()))
            .collect();
        for meta in metas {
            if let Some(slot) = weights.get_mut(&meta.code) {
                *slot = WeightInfo::from(meta);
            }
        }
        Ok(weights)
    }

    /// Final ledger rows for a batch of codes.
    ///
    /// Opening, window and weight lookups run concurrently; any failure fails
    /// the whole batch.
    pub async fn compute(&self, request: &LedgerRequest<'_>) -> AppResult<HashMap<String, LedgerRow>> {
        let codes = request.codes;
        if codes.is_empty() {
            return Ok(HashMap::new());
        }
        let started = Instant::now();

        let weight_lookup = async {
            match request.weights {
                WeightMode::Base => Ok(HashMap::new()),
                WeightMode::All | WeightMode::FinishedGoods => self.weights(codes).await,
            }
        };

        let (openings, windows, weights) = tokio::try_join!(
            self.opening_balances(codes, request.range.start, request.warehouse),
            self.window_totals(codes, request.range, request.warehouse),
            weight_lookup,
        )?;

        let rows: HashMap<String, LedgerRow> = codes
            .iter()
            .map(|code| {
                let opening = openings.get(code).copied().unwrap_or_default();
                let window = windows.get(code).copied().unwrap_or_default();
                let row = LedgerRow::new(opening, &window);
                let info = weights.get(code).cloned().unwrap_or_default();

                let row = match request.weights {
                    WeightMode::Base => row,
                    WeightMode::All => row.scaled(info.weight),
                    WeightMode::FinishedGoods if info.is_finished_goods() => {
                        row.scaled(info.weight)
                    }
                    WeightMode::FinishedGoods => row,
                };
                (code.clone(), row)
            })
            .collect();

        tracing::debug!(
            codes = codes.len(),
            weights = ?request.weights,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ledger batch computed"
        );
        Ok(rows)
    }
}
