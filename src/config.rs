// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Emission factors are not part of this: they live in the data store and are
//! edited by admins (see `models::settings`).

use crate::models::EquivalenceFactors;
use std::env;

/// Cloud Tasks queue allowed to call `/tasks/*` routes.
pub const RECONCILE_QUEUE_NAME: &str = "co2-reconciliation";

/// Settings shared by the HTTP service and the batch reconciliation job.
///
/// Needs no secrets, so the batch job can run with only store access.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Requests reconciled concurrently by the batch job (1 = sequential)
    pub batch_concurrency: usize,
    /// Constants for the portfolio report equivalences
    pub equivalences: EquivalenceFactors,
}

impl BatchConfig {
    /// Load the batch settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = EquivalenceFactors::default();

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            batch_concurrency: match parse_var("BATCH_CONCURRENCY", 1usize)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        var: "BATCH_CONCURRENCY",
                        reason: "must be at least 1".to_string(),
                    })
                }
                n => n,
            },
            equivalences: EquivalenceFactors {
                grams_per_car_km: parse_positive("EQUIV_GRAMS_PER_CAR_KM", defaults.grams_per_car_km)?,
                kg_per_tree_year: parse_positive("EQUIV_KG_PER_TREE_YEAR", defaults.kg_per_tree_year)?,
                grams_per_phone_charge: parse_positive(
                    "EQUIV_GRAMS_PER_PHONE_CHARGE",
                    defaults.grams_per_phone_charge,
                )?,
            },
        })
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Requests reconciled concurrently by the batch job (1 = sequential)
    pub batch_concurrency: usize,
    /// Constants for the portfolio report equivalences
    pub equivalences: EquivalenceFactors,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Shared bearer token expected on `/tasks/*` requests
    pub tasks_auth_token: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let batch = BatchConfig::from_env()?;

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: batch.gcp_project_id,
            port: parse_var("PORT", 8080)?,
            batch_concurrency: batch.batch_concurrency,
            equivalences: batch.equivalences,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            tasks_auth_token: env::var("TASKS_AUTH_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TASKS_AUTH_TOKEN"))?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            batch_concurrency: 1,
            equivalences: EquivalenceFactors::default(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            tasks_auth_token: "test_tasks_token".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("could not parse {:?}", raw),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_positive(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    let value: f64 = parse_var(var, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            var,
            reason: "must be a positive number".to_string(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
