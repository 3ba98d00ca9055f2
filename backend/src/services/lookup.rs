//! Reference lookups used by report filters

use shared::{Category, CatgroupFilter, RecipeIngredient};

use crate::{
    db::LedgerSource,
    error::{AppError, AppResult},
};

pub struct LookupService<'s, S: ?Sized> {
    source: &'s S,
}

impl<'s, S> LookupService<'s, S>
where
    S: LedgerSource + ?Sized,
{
    pub fn new(source: &'s S) -> Self {
        Self { source }
    }

    /// Finished-goods categories of a division, in report order
    pub async fn categories(&self, filter: &CatgroupFilter) -> AppResult<Vec<Category>> {
        self.source.categories(filter).await
    }

    /// Raw-material ingredients of one product
    pub async fn recipe(&self, product_code: &str) -> AppResult<Vec<RecipeIngredient>> {
        let code = product_code.trim();
        if code.is_empty() {
            return Err(AppError::Validation("Product code is required".into()));
        }

        let ingredients = self.source.recipe_ingredients(&[code.to_string()]).await?;
        if ingredients.is_empty() {
            return Err(AppError::NotFound(format!("Recipe for product {}", code)));
        }
        Ok(ingredients)
    }
}
