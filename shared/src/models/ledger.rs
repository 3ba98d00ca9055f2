//! Stock ledger models
//!
//! A ledger row is reconstructed from many transactional tables. Each table
//! feeds one named opening category ([`StatField`]); the categories are folded
//! into an [`OpeningStats`] accumulator for the balance before the report
//! window, and into [`WindowTotals`] for the movement inside it.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Partial sums produced by one grouped query, keyed by item code
pub type PartialSums = HashMap<String, Decimal>;

/// Round a quantity to two decimal places (half away from zero)
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `closing = opening + purchased - consumed - sales + salesreturn`, rounded
pub fn closing_balance(
    opening: Decimal,
    purchased: Decimal,
    consumed: Decimal,
    sales: Decimal,
    salesreturn: Decimal,
) -> Decimal {
    round2(opening + purchased - consumed - sales + salesreturn)
}

/// Named categories of the opening balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatField {
    FirstOpening,
    PurchasedOp,
    IrecOp,
    StaAdd,
    GrOp,
    StockTo,
    ConsumedOp,
    SalesOp,
    IiscOp,
    StaDed,
    StockFrom,
    PReturn,
    SalesReturnOp,
    Prod,
}

impl StatField {
    pub const ALL: [StatField; 14] = [
        StatField::FirstOpening,
        StatField::PurchasedOp,
        StatField::IrecOp,
        StatField::StaAdd,
        StatField::GrOp,
        StatField::StockTo,
        StatField::ConsumedOp,
        StatField::SalesOp,
        StatField::IiscOp,
        StatField::StaDed,
        StatField::StockFrom,
        StatField::PReturn,
        StatField::SalesReturnOp,
        StatField::Prod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatField::FirstOpening => "firstopening",
            StatField::PurchasedOp => "purchasedop",
            StatField::IrecOp => "irecop",
            StatField::StaAdd => "staadd",
            StatField::GrOp => "grop",
            StatField::StockTo => "stockto",
            StatField::ConsumedOp => "consumedop",
            StatField::SalesOp => "salesop",
            StatField::IiscOp => "iiscop",
            StatField::StaDed => "staded",
            StatField::StockFrom => "stockfrom",
            StatField::PReturn => "preturn",
            StatField::SalesReturnOp => "salesreturnop",
            StatField::Prod => "prod",
        }
    }

    /// Whether the category adds to stock in the opening formula
    pub fn is_inbound(&self) -> bool {
        !matches!(
            self,
            StatField::ConsumedOp
                | StatField::SalesOp
                | StatField::IiscOp
                | StatField::StaDed
                | StatField::StockFrom
                | StatField::PReturn
        )
    }

    /// Ledger column fed by this category inside the report window.
    ///
    /// `FirstOpening` and `Prod` only exist before the window.
    pub fn window_column(&self) -> Option<LedgerColumn> {
        match self {
            StatField::FirstOpening | StatField::Prod => None,
            StatField::PurchasedOp
            | StatField::IrecOp
            | StatField::StaAdd
            | StatField::GrOp
            | StatField::StockTo => Some(LedgerColumn::Purchased),
            StatField::ConsumedOp
            | StatField::IiscOp
            | StatField::StaDed
            | StatField::StockFrom
            | StatField::PReturn => Some(LedgerColumn::Consumed),
            StatField::SalesOp => Some(LedgerColumn::Sales),
            StatField::SalesReturnOp => Some(LedgerColumn::SalesReturn),
        }
    }
}

impl std::fmt::Display for StatField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement columns of a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerColumn {
    Purchased,
    Consumed,
    Sales,
    SalesReturn,
}

/// Opening accumulator for one item code.
///
/// Every field is a sum of non-negative quantities; the sign is applied only
/// in [`OpeningStats::opening`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningStats {
    pub firstopening: Decimal,
    pub purchasedop: Decimal,
    pub irecop: Decimal,
    pub staadd: Decimal,
    pub grop: Decimal,
    pub stockto: Decimal,
    pub consumedop: Decimal,
    pub salesop: Decimal,
    pub iiscop: Decimal,
    pub staded: Decimal,
    pub stockfrom: Decimal,
    pub preturn: Decimal,
    pub salesreturnop: Decimal,
    pub prod: Decimal,
}

impl OpeningStats {
    pub fn get(&self, field: StatField) -> Decimal {
        match field {
            StatField::FirstOpening => self.firstopening,
            StatField::PurchasedOp => self.purchasedop,
            StatField::IrecOp => self.irecop,
            StatField::StaAdd => self.staadd,
            StatField::GrOp => self.grop,
            StatField::StockTo => self.stockto,
            StatField::ConsumedOp => self.consumedop,
            StatField::SalesOp => self.salesop,
            StatField::IiscOp => self.iiscop,
            StatField::StaDed => self.staded,
            StatField::StockFrom => self.stockfrom,
            StatField::PReturn => self.preturn,
            StatField::SalesReturnOp => self.salesreturnop,
            StatField::Prod => self.prod,
        }
    }

    fn slot(&mut self, field: StatField) -> &mut Decimal {
        match field {
            StatField::FirstOpening => &mut self.firstopening,
            StatField::PurchasedOp => &mut self.purchasedop,
            StatField::IrecOp => &mut self.irecop,
            StatField::StaAdd => &mut self.staadd,
            StatField::GrOp => &mut self.grop,
            StatField::StockTo => &mut self.stockto,
            StatField::ConsumedOp => &mut self.consumedop,
            StatField::SalesOp => &mut self.salesop,
            StatField::IiscOp => &mut self.iiscop,
            StatField::StaDed => &mut self.staded,
            StatField::StockFrom => &mut self.stockfrom,
            StatField::PReturn => &mut self.preturn,
            StatField::SalesReturnOp => &mut self.salesreturnop,
            StatField::Prod => &mut self.prod,
        }
    }

    /// Copy of `self` with `amount` added to `field`
    pub fn with(mut self, field: StatField, amount: Decimal) -> Self {
        *self.slot(field) += amount;
        self
    }

    /// Net opening balance.
    ///
    /// ```text
    /// opening = firstopening + purchasedop + irecop + staadd + grop + stockto
    ///         - (consumedop + salesop + iiscop + staded + stockfrom + preturn)
    ///         + salesreturnop + prod
    /// ```
    ///
    /// Each summand is rounded to 2 dp before combining, then the result is
    /// rounded again.
    pub fn opening(&self) -> Decimal {
        let (inbound, outbound) = StatField::ALL.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(inbound, outbound), field| {
                let value = round2(self.get(*field));
                if field.is_inbound() {
                    (inbound + value, outbound)
                } else {
                    (inbound, outbound + value)
                }
            },
        );
        round2(inbound - outbound)
    }
}

/// Fold per-category partial sums into one accumulator per requested code.
///
/// Every requested code gets an entry, zero-valued when no partial mentions
/// it; codes outside `codes` are ignored.
pub fn fold_opening<I>(codes: &[String], partials: I) -> HashMap<String, OpeningStats>
where
    I: IntoIterator<Item = (StatField, PartialSums)>,
{
    let seed: HashMap<String, OpeningStats> = codes
        .iter()
        .map(|code| (code.clone(), OpeningStats::default()))
        .collect();

    partials.into_iter().fold(seed, |mut acc, (field, sums)| {
        for (code, amount) in sums {
            if let Some(stats) = acc.get_mut(&code) {
                *stats = stats.with(field, amount);
            }
        }
        acc
    })
}

/// Movement inside the report window for one item code
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub purchased: Decimal,
    pub consumed: Decimal,
    pub sales: Decimal,
    pub salesreturn: Decimal,
}

impl WindowTotals {
    pub fn get(&self, column: LedgerColumn) -> Decimal {
        match column {
            LedgerColumn::Purchased => self.purchased,
            LedgerColumn::Consumed => self.consumed,
            LedgerColumn::Sales => self.sales,
            LedgerColumn::SalesReturn => self.salesreturn,
        }
    }

    /// Copy of `self` with `amount` added to `column`
    pub fn with(mut self, column: LedgerColumn, amount: Decimal) -> Self {
        match column {
            LedgerColumn::Purchased => self.purchased += amount,
            LedgerColumn::Consumed => self.consumed += amount,
            LedgerColumn::Sales => self.sales += amount,
            LedgerColumn::SalesReturn => self.salesreturn += amount,
        }
        self
    }

    /// Copy with every column rounded to 2 dp
    pub fn rounded(&self) -> Self {
        Self {
            purchased: round2(self.purchased),
            consumed: round2(self.consumed),
            sales: round2(self.sales),
            salesreturn: round2(self.salesreturn),
        }
    }
}

/// Fold window partial sums into rounded totals per requested code.
///
/// Categories without a window column are skipped.
pub fn fold_window<I>(codes: &[String], partials: I) -> HashMap<String, WindowTotals>
where
    I: IntoIterator<Item = (StatField, PartialSums)>,
{
    let seed: HashMap<String, WindowTotals> = codes
        .iter()
        .map(|code| (code.clone(), WindowTotals::default()))
        .collect();

    let mut totals = partials.into_iter().fold(seed, |mut acc, (field, sums)| {
        let Some(column) = field.window_column() else {
            return acc;
        };
        for (code, amount) in sums {
            if let Some(totals) = acc.get_mut(&code) {
                *totals = totals.with(column, amount);
            }
        }
        acc
    });

    for value in totals.values_mut() {
        *value = value.rounded();
    }
    totals
}

/// Final six-number ledger summary for one item code
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub opening: Decimal,
    pub purchased_transferin: Decimal,
    pub consumed_transferout: Decimal,
    pub sales: Decimal,
    pub salesreturn: Decimal,
    pub closing: Decimal,
}

impl LedgerRow {
    /// Build a row from an opening balance and window movement.
    ///
    /// Components are rounded first and `closing` is derived from the rounded
    /// components, so the ledger identity holds exactly.
    pub fn new(opening: Decimal, window: &WindowTotals) -> Self {
        Self::from_components(
            round2(opening),
            round2(window.purchased),
            round2(window.consumed),
            round2(window.sales),
            round2(window.salesreturn),
        )
    }

    fn from_components(
        opening: Decimal,
        purchased_transferin: Decimal,
        consumed_transferout: Decimal,
        sales: Decimal,
        salesreturn: Decimal,
    ) -> Self {
        Self {
            opening,
            purchased_transferin,
            consumed_transferout,
            sales,
            salesreturn,
            closing: closing_balance(
                opening,
                purchased_transferin,
                consumed_transferout,
                sales,
                salesreturn,
            ),
        }
    }

    /// Express the row in another unit by multiplying every component by
    /// `weight`, rounding before and after the multiplication.
    pub fn scaled(&self, weight: Decimal) -> Self {
        let scale = |value: Decimal| round2(round2(value) * weight);
        Self::from_components(
            scale(self.opening),
            scale(self.purchased_transferin),
            scale(self.consumed_transferout),
            scale(self.sales),
            scale(self.salesreturn),
        )
    }

    /// True when every component is zero
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
