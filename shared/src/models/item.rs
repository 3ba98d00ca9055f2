//! Item, category and recipe reference models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Item type of goods that are packed and shipped
pub const FINISHED_GOODS: &str = "Finished Goods";

/// Category group of recipe ingredients reported as raw materials
pub const RAW_MATERIAL_GROUP: &str = "RAW MATERIAL";

/// A tradeable or produced good
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub code: String,
    pub description: String,
    pub category: String,
    /// Category group of the item (e.g., "FRIED GRAM")
    pub catgroup: String,
    /// Report division the category group belongs to (e.g., "Fried Gram Mill")
    pub division: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    /// Production line the item is made on
    pub mill: Option<String>,
}

impl Item {
    pub fn is_finished_goods(&self) -> bool {
        self.item_type.as_deref() == Some(FINISHED_GOODS)
    }
}

/// Unit metadata looked up per item code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemMeta {
    pub code: String,
    pub weight: Option<Decimal>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

/// Resolved unit weight and type for one code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightInfo {
    pub weight: Decimal,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

impl Default for WeightInfo {
    fn default() -> Self {
        Self {
            weight: Decimal::ONE,
            item_type: None,
        }
    }
}

impl WeightInfo {
    pub fn is_finished_goods(&self) -> bool {
        self.item_type.as_deref() == Some(FINISHED_GOODS)
    }
}

impl From<ItemMeta> for WeightInfo {
    fn from(meta: ItemMeta) -> Self {
        Self {
            weight: resolve_weight(meta.weight),
            item_type: meta.item_type,
        }
    }
}

/// Unit weight used for conversion; missing, zero or negative weights mean 1
pub fn resolve_weight(weight: Option<Decimal>) -> Decimal {
    match weight {
        Some(w) if w > Decimal::ZERO => w,
        _ => Decimal::ONE,
    }
}

/// One ingredient line of a product recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeIngredient {
    pub product_code: String,
    pub ingredient_code: String,
    pub description: String,
    pub category: String,
    pub catgroup: String,
}

/// Category name with its group, as listed for report filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    pub catgroup: String,
}
