// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task handler routes for Cloud Tasks callbacks.
//!
//! These endpoints are called by Cloud Tasks, not directly by users.
//! `require_tasks_auth` is applied in routes/mod.rs.

use crate::error::{AppError, RecordError};
use crate::models::{BatchSummary, SavingsResult};
use crate::AppState;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Task handler routes (called by Cloud Tasks).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks/reconcile-request", post(reconcile_request))
        .route("/tasks/reconcile-all", post(reconcile_all))
}

/// Payload queued when an offer is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequestPayload {
    pub request_id: String,
}

/// Response for a single reconciliation task.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SavingsResult>,
    /// Reason code when the record was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

/// Reconcile one request after its offer was accepted.
///
/// Record-level problems answer 200 so Cloud Tasks does not retry a request
/// that can never succeed; storage and configuration errors answer 5xx.
async fn reconcile_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReconcileRequestPayload>,
) -> Response {
    tracing::info!(request_id = %payload.request_id, "Reconciling request from Cloud Task");

    let context = match state.savings.load_context().await {
        Ok(c) => c,
        Err(e) => return e.into_response(),
    };

    let request = match state.savings.get_request(&payload.request_id).await {
        Ok(r) => r,
        Err(AppError::NotFound(_)) => {
            tracing::warn!(request_id = %payload.request_id, "Request not found, dropping task");
            return Json(ReconcileResponse {
                request_id: payload.request_id,
                result: None,
                skipped: Some("request_not_found".to_string()),
            })
            .into_response();
        }
        Err(e) => return e.into_response(),
    };

    match state.savings.reconcile_record(&context, &request).await {
        Ok(result) => Json(ReconcileResponse {
            request_id: payload.request_id,
            result: Some(result),
            skipped: None,
        })
        .into_response(),
        Err(RecordError::Storage(msg)) => {
            tracing::error!(request_id = %payload.request_id, error = %msg, "Failed to store savings");
            // 500 triggers a Cloud Tasks retry
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            tracing::warn!(
                request_id = %payload.request_id,
                reason = e.reason_code(),
                error = %e,
                "Skipping request"
            );
            Json(ReconcileResponse {
                request_id: payload.request_id,
                result: None,
                skipped: Some(e.reason_code().to_string()),
            })
            .into_response()
        }
    }
}

/// Run the full batch reconciliation.
async fn reconcile_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BatchSummary>, AppError> {
    // HTTP-triggered runs are not interruptible.
    let never_cancel = AtomicBool::new(false);
    let summary = state.savings.reconcile_all(&never_cancel).await?;
    Ok(Json(summary))
}
