// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CO2 savings: avoided-travel emissions for workshop service requests
//!
//! This crate provides the backend API and batch job that estimate and
//! reconcile the CO2, fuel and cost saved when a customer collects offers
//! online instead of visiting the nearest workshops in person.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::SavingsRepository;
use services::SavingsService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn SavingsRepository>,
    pub savings: SavingsService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn SavingsRepository>) -> Self {
        let savings = SavingsService::new(
            db.clone(),
            config.equivalences,
            config.batch_concurrency,
        );
        Self {
            config,
            db,
            savings,
        }
    }
}
