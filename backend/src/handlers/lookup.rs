//! HTTP handlers for report filter lookups

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{Category, CatgroupFilter, RecipeIngredient};

use super::tenant_source;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::LookupService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub catgroup: Option<String>,
}

/// List finished-goods categories
pub async fn list_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<CategoryQuery>,
) -> AppResult<Json<Vec<Category>>> {
    let source = tenant_source(&state, &current_user.0).await?;
    let filter = CatgroupFilter::parse(query.catgroup.as_deref());
    let categories = LookupService::new(&source).categories(&filter).await?;
    Ok(Json(categories))
}

/// Get the recipe of a product
pub async fn get_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(code): Path<String>,
) -> AppResult<Json<Vec<RecipeIngredient>>> {
    let source = tenant_source(&state, &current_user.0).await?;
    let recipe = LookupService::new(&source).recipe(&code).await?;
    Ok(Json(recipe))
}
