// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::models::{GeoError, SettingsError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Estimate unavailable: {0}")]
    EstimateUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] SettingsError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::EstimateUnavailable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "estimate_unavailable",
                Some(msg.clone()),
            ),
            AppError::Configuration(err) => {
                tracing::error!(error = %err, "Emission settings unusable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "configuration_error",
                    Some(err.to_string()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

/// Why a single service request could not get a savings result.
///
/// Never fatal for a batch run: the record is skipped and reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Service request {0} not found")]
    RequestNotFound(String),

    #[error("Requester location is missing")]
    MissingRequesterLocation,

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(#[from] GeoError),

    #[error("No workshop has been chosen for this request")]
    NoChosenWorkshop,

    #[error("Chosen workshop {0} not found")]
    ChosenWorkshopNotFound(String),

    #[error("Chosen workshop {0} has no location")]
    ChosenWorkshopNotGeocoded(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RecordError {
    /// Stable reason code for batch summaries.
    pub fn reason_code(&self) -> &'static str {
        match self {
            RecordError::RequestNotFound(_) => "request_not_found",
            RecordError::MissingRequesterLocation => "missing_requester_location",
            RecordError::InvalidCoordinates(_) => "invalid_coordinates",
            RecordError::NoChosenWorkshop => "no_chosen_workshop",
            RecordError::ChosenWorkshopNotFound(_) => "chosen_workshop_not_found",
            RecordError::ChosenWorkshopNotGeocoded(_) => "chosen_workshop_not_geocoded",
            RecordError::Storage(_) => "storage_error",
        }
    }
}

impl From<AppError> for RecordError {
    fn from(err: AppError) -> Self {
        RecordError::Storage(err.to_string())
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::RequestNotFound(_) | RecordError::ChosenWorkshopNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            RecordError::MissingRequesterLocation
            | RecordError::InvalidCoordinates(_)
            | RecordError::ChosenWorkshopNotGeocoded(_) => {
                AppError::EstimateUnavailable(err.to_string())
            }
            RecordError::NoChosenWorkshop => AppError::BadRequest(err.to_string()),
            RecordError::Storage(msg) => AppError::Database(msg),
        }
    }
}
