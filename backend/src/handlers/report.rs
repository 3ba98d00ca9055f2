//! HTTP handlers for stock and production reports

use std::{collections::BTreeMap, time::Instant};

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{parse_code_list, DateRange, LedgerRow, ReportParams};

use super::tenant_source;
use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::report::{
    export_to_csv, FriedGramRequest, ProductionRequest, ReportService, StockRequest,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    /// Comma-separated item codes
    pub codes: Option<String>,
    pub fromdate: Option<String>,
    pub todate: Option<String>,
    pub warehouse: Option<String>,
    pub weighted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>, // "json" or "csv"
}

/// Report body with the time it took to build
#[derive(Debug, Serialize)]
pub struct TimedReport<T> {
    #[serde(flatten)]
    pub report: T,
    pub execution_time: String,
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn execution_time(started: Instant) -> String {
    format!("{:.3} seconds", started.elapsed().as_secs_f64())
}

/// Ledger rows for explicit item codes
pub async fn stock_ledger(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<BTreeMap<String, LedgerRow>>> {
    let source = tenant_source(&state, &current_user.0).await?;
    let service = ReportService::new(&source, state.config.report.clone());

    let request = StockRequest {
        codes: query.codes.as_deref().map(parse_code_list).unwrap_or_default(),
        range: DateRange::from_params(query.fromdate.as_deref(), query.todate.as_deref(), today()),
        warehouse: query
            .warehouse
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty()),
        weighted: query.weighted.unwrap_or(false),
    };

    let rows = service.stock_ledger(&request).await?;
    Ok(Json(rows))
}

/// Production report, as JSON or CSV
pub async fn production_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<ReportParams>,
    Query(format): Query<FormatQuery>,
) -> AppResult<impl IntoResponse> {
    let started = Instant::now();
    let source = tenant_source(&state, &current_user.0).await?;
    let service = ReportService::new(&source, state.config.report.clone());

    let request = ProductionRequest::from_params(&params, today());
    let report = service.production_report(&request).await?;

    if format.format.as_deref() == Some("csv") {
        let csv = export_to_csv(&report)?;
        Ok((
            [(header::CONTENT_TYPE, "text/csv"), (header::CONTENT_DISPOSITION, "attachment; filename=\"production_report.csv\"")],
            csv,
        ).into_response())
    } else {
        Ok(Json(TimedReport {
            report,
            execution_time: execution_time(started),
        })
        .into_response())
    }
}

/// Fried gram and bengal gram report
pub async fn fried_gram_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<ReportParams>,
) -> AppResult<impl IntoResponse> {
    let started = Instant::now();
    let source = tenant_source(&state, &current_user.0).await?;
    let service = ReportService::new(&source, state.config.report.clone());

    let request = FriedGramRequest::from_params(&params, today());
    let report = service.fried_gram_report(&request).await?;

    Ok(Json(TimedReport {
        report,
        execution_time: execution_time(started),
    }))
}
