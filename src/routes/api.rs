// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::PortfolioReport;
use crate::services::EstimateOutcome;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/requests/{id}/estimate", post(estimate_savings))
        .route("/api/savings/portfolio", get(get_my_portfolio))
}

// ─── Estimates ───────────────────────────────────────────────

#[derive(Deserialize)]
struct EstimateQuery {
    /// Write the estimate to the request (ignored once a workshop is chosen)
    #[serde(default)]
    persist: bool,
}

/// Pre-decision savings estimate for one of the caller's requests.
async fn estimate_savings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(request_id): Path<String>,
    Query(params): Query<EstimateQuery>,
) -> Result<Json<EstimateOutcome>> {
    let request = state.savings.get_request(&request_id).await?;

    // Hide other customers' requests entirely.
    if !user.is_admin && request.customer_id.as_deref() != Some(user.user_id.as_str()) {
        return Err(AppError::NotFound(format!("Service request {}", request_id)));
    }

    let outcome = state
        .savings
        .estimate_request(&request, params.persist)
        .await?;
    Ok(Json(outcome))
}

// ─── Portfolio ───────────────────────────────────────────────

/// Savings totals over the caller's own requests.
async fn get_my_portfolio(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PortfolioReport>> {
    let report = state.savings.portfolio(Some(&user.user_id)).await?;
    Ok(Json(report))
}
