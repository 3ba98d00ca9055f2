//! Route definitions for the stock ledger service

use axum::{middleware, routing::get, Router};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - ledger reports
        .nest("/reports", report_routes(state.clone()))
        // Protected routes - report filter lookups
        .nest("/lookups", lookup_routes(state))
}

/// Report routes (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stock", get(handlers::stock_ledger))
        .route("/production", get(handlers::production_report))
        .route("/fried-gram", get(handlers::fried_gram_report))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Lookup routes (protected)
fn lookup_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/categories", get(handlers::list_categories))
        .route("/recipes/:code", get(handlers::get_recipe))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
