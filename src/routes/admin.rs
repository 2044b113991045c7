// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes: emission settings and fleet-wide reports.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{EmissionSettings, EmissionSettingsDocument, PortfolioReport};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Admin routes. Auth and admin checks are applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/admin/settings",
            get(get_settings).put(update_settings),
        )
        .route("/api/reports/portfolio", get(get_portfolio))
}

// ─── Emission Settings ───────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SettingsResponse {
    pub settings: EmissionSettingsDocument,
    /// False when nothing is stored yet and defaults are shown
    pub configured: bool,
}

/// Current settings, or the defaults if none are stored.
async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<SettingsResponse>> {
    let response = match state.db.get_emission_settings().await? {
        Some(settings) => SettingsResponse {
            settings,
            configured: true,
        },
        None => SettingsResponse {
            settings: EmissionSettingsDocument::default(),
            configured: false,
        },
    };
    Ok(Json(response))
}

/// Replace the settings document after validation.
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(document): Json<EmissionSettingsDocument>,
) -> Result<Json<SettingsResponse>> {
    document
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // A document that passes field checks can still leave a fuel without a factor.
    EmissionSettings::try_from(&document).map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.db.set_emission_settings(&document).await?;

    tracing::info!(
        user_id = %user.user_id,
        workshops_to_compare = document.workshops_to_compare,
        "Emission settings updated"
    );

    Ok(Json(SettingsResponse {
        settings: document,
        configured: true,
    }))
}

// ─── Reports ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct PortfolioQuery {
    customer_id: Option<String>,
}

/// Fleet-wide (or single-customer) savings report.
async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PortfolioQuery>,
) -> Result<Json<PortfolioReport>> {
    let report = state
        .savings
        .portfolio(params.customer_id.as_deref())
        .await?;
    Ok(Json(report))
}
