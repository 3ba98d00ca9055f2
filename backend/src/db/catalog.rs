//! Schema catalog of the stock ledger
//!
//! Every transactional table that moves stock is described once here, as a
//! grouped-sum source: which columns hold the item code, date and quantity,
//! which static flags select live rows, which column scopes it to a
//! warehouse, and which opening category it feeds. The opening and window
//! calculators render the same entries, with a different date bound.

use shared::StatField;

/// Identifier of one grouped-sum source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    OpeningStock,
    PurchaseReceipt,
    ProductionOutput,
    ByproductOutput,
    GoodsReceipt,
    IntermediateReceipt,
    IntermediateIssue,
    AdjustmentAdd,
    AdjustmentDeduct,
    TransferIn,
    TransferOut,
    ProductionConsumption,
    ByproductConsumption,
    Sales,
    LoadingSlipSales,
    PurchaseReturn,
    SalesReturn,
}

/// Literal compared against a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Text(&'static str),
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::Int(value) => write!(f, "{}", value),
            FilterValue::Text(value) => f.write_str(value),
        }
    }
}

/// Static row filter of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Eq(&'static str, FilterValue),
    /// Column differs from the value; NULL counts as different
    Ne(&'static str, FilterValue),
}

/// One (table, condition) pair summed per item code
#[derive(Debug, Clone, Copy)]
pub struct SumSource {
    pub id: SourceId,
    pub table: &'static str,
    pub code_column: &'static str,
    pub date_column: &'static str,
    pub quantity_column: &'static str,
    /// Column compared with the requested warehouse; `None` means the table
    /// is never warehouse-scoped
    pub warehouse_column: Option<&'static str>,
    pub filters: &'static [Filter],
    pub field: StatField,
}

/// Bag-splitting table; contributes to the opening balance only
#[derive(Debug, Clone, Copy)]
pub struct BagSource {
    pub table: &'static str,
    pub date_column: &'static str,
    pub codes_column: &'static str,
    pub counts_column: &'static str,
    pub warehouse_column: Option<&'static str>,
    pub filters: &'static [Filter],
}

const LIVE: Filter = Filter::Eq("dflag", FilterValue::Int(0));

pub const SUM_SOURCES: &[SumSource] = &[
    SumSource {
        id: SourceId::OpeningStock,
        table: "opening_stock",
        code_column: "code",
        date_column: "date",
        quantity_column: "qty",
        warehouse_column: Some("warehouse"),
        filters: &[LIVE],
        field: StatField::FirstOpening,
    },
    SumSource {
        id: SourceId::PurchaseReceipt,
        table: "receipt_items",
        code_column: "code",
        date_column: "rdate",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE, Filter::Eq("auth_flag1", FilterValue::Int(1))],
        field: StatField::PurchasedOp,
    },
    SumSource {
        id: SourceId::ProductionOutput,
        table: "production_output",
        code_column: "code",
        date_column: "pdate",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE, Filter::Eq("flag", FilterValue::Text("P"))],
        field: StatField::PurchasedOp,
    },
    SumSource {
        id: SourceId::ByproductOutput,
        table: "byproduct_output",
        code_column: "code",
        date_column: "pdate",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE],
        field: StatField::PurchasedOp,
    },
    SumSource {
        id: SourceId::GoodsReceipt,
        table: "goods_receipt",
        code_column: "code",
        date_column: "grdate",
        quantity_column: "qty",
        warehouse_column: Some("warehouse"),
        filters: &[LIVE, Filter::Eq("auth_flag2", FilterValue::Int(1))],
        field: StatField::GrOp,
    },
    SumSource {
        id: SourceId::IntermediateReceipt,
        table: "intermediate_stock",
        code_column: "code",
        date_column: "date",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE, Filter::Eq("riflag", FilterValue::Text("R"))],
        field: StatField::IrecOp,
    },
    SumSource {
        id: SourceId::IntermediateIssue,
        table: "intermediate_stock",
        code_column: "code",
        date_column: "date",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE, Filter::Eq("riflag", FilterValue::Text("I"))],
        field: StatField::IiscOp,
    },
    SumSource {
        id: SourceId::AdjustmentAdd,
        table: "stock_adjustment",
        code_column: "code",
        date_column: "adate",
        quantity_column: "qty",
        warehouse_column: Some("warehouse"),
        filters: &[
            Filter::Eq("type", FilterValue::Text("Add")),
            Filter::Eq("auth_flag1", FilterValue::Int(1)),
        ],
        field: StatField::StaAdd,
    },
    SumSource {
        id: SourceId::AdjustmentDeduct,
        table: "stock_adjustment",
        code_column: "code",
        date_column: "adate",
        quantity_column: "qty",
        warehouse_column: Some("warehouse"),
        filters: &[
            Filter::Eq("type", FilterValue::Text("Deduct")),
            Filter::Eq("auth_flag1", FilterValue::Int(1)),
        ],
        field: StatField::StaDed,
    },
    SumSource {
        id: SourceId::TransferIn,
        table: "stock_transfer",
        code_column: "code",
        date_column: "tdate",
        quantity_column: "qty",
        warehouse_column: Some("to_warehouse"),
        filters: &[Filter::Eq("eflag", FilterValue::Int(1))],
        field: StatField::StockTo,
    },
    SumSource {
        id: SourceId::TransferOut,
        table: "stock_transfer",
        code_column: "code",
        date_column: "tdate",
        quantity_column: "qty",
        warehouse_column: Some("from_warehouse"),
        filters: &[Filter::Eq("eflag", FilterValue::Int(1))],
        field: StatField::StockFrom,
    },
    SumSource {
        id: SourceId::ProductionConsumption,
        table: "production_consumption",
        code_column: "rawcode",
        date_column: "pdate",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE, Filter::Eq("byproduct", FilterValue::Int(0))],
        field: StatField::ConsumedOp,
    },
    SumSource {
        id: SourceId::ByproductConsumption,
        table: "byproduct_consumption",
        code_column: "rawcode",
        date_column: "pdate",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE],
        field: StatField::ConsumedOp,
    },
    SumSource {
        id: SourceId::Sales,
        table: "sales_items",
        code_column: "code",
        date_column: "invdate",
        quantity_column: "qty",
        warehouse_column: Some("warehouse"),
        filters: &[LIVE, Filter::Ne("flag", FilterValue::Text("C"))],
        field: StatField::SalesOp,
    },
    SumSource {
        id: SourceId::LoadingSlipSales,
        table: "loading_slip_items",
        code_column: "code",
        date_column: "lsdate",
        quantity_column: "qty",
        warehouse_column: Some("warehouse"),
        filters: &[LIVE, Filter::Eq("flag", FilterValue::Text("L"))],
        field: StatField::SalesOp,
    },
    SumSource {
        id: SourceId::PurchaseReturn,
        table: "purchase_return_items",
        code_column: "code",
        date_column: "prdate",
        quantity_column: "qty",
        warehouse_column: Some("unit"),
        filters: &[LIVE],
        field: StatField::PReturn,
    },
    SumSource {
        id: SourceId::SalesReturn,
        table: "sales_return_items",
        code_column: "code",
        date_column: "srdate",
        quantity_column: "qty",
        warehouse_column: Some("warehouse"),
        // rflag marks returns that were reversed later
        filters: &[
            Filter::Eq("type", FilterValue::Text("addtostock")),
            Filter::Eq("rflag", FilterValue::Int(0)),
        ],
        field: StatField::SalesReturnOp,
    },
];

pub const BAG_SOURCE: BagSource = BagSource {
    table: "bag_splitting",
    date_column: "bdate",
    codes_column: "bagtype",
    counts_column: "bagcount",
    warehouse_column: Some("unit"),
    filters: &[LIVE],
};

/// Sources summed for the opening balance
pub fn opening_sources() -> impl Iterator<Item = &'static SumSource> {
    SUM_SOURCES.iter()
}

/// Sources summed inside the report window
pub fn window_sources() -> impl Iterator<Item = &'static SumSource> {
    SUM_SOURCES
        .iter()
        .filter(|source| source.field.window_column().is_some())
}

/// Look up a source by id
pub fn source(id: SourceId) -> Option<&'static SumSource> {
    SUM_SOURCES.iter().find(|source| source.id == id)
}

/// Queries issued for one opening balance: every sum source plus bag splitting
pub fn opening_query_count() -> usize {
    SUM_SOURCES.len() + 1
}
