// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data store access.
//!
//! The savings core only talks to [`SavingsRepository`]; production uses
//! Firestore, tests and local runs can use the in-memory store.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::InMemoryDb;

use crate::error::AppError;
use crate::models::{EmissionSettingsDocument, SavingsResult, ServiceRequest, Vehicle, Workshop};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const WORKSHOPS: &str = "workshops";
    pub const SERVICE_REQUESTS: &str = "service_requests";
    pub const VEHICLES: &str = "vehicles";
    /// Singleton settings document lives at `emission_settings/current`
    pub const EMISSION_SETTINGS: &str = "emission_settings";
    pub const EMISSION_SETTINGS_DOC_ID: &str = "current";
}

/// Reads and writes the savings pipeline needs.
#[async_trait]
pub trait SavingsRepository: Send + Sync {
    /// Current emission settings document, `None` if never configured.
    async fn get_emission_settings(&self) -> Result<Option<EmissionSettingsDocument>, AppError>;

    async fn set_emission_settings(&self, settings: &EmissionSettingsDocument)
        -> Result<(), AppError>;

    /// Full workshop directory (unfiltered).
    async fn list_workshops(&self) -> Result<Vec<Workshop>, AppError>;

    async fn get_service_request(&self, request_id: &str)
        -> Result<Option<ServiceRequest>, AppError>;

    /// Requests whose offer has been accepted (reconciliation candidates).
    async fn list_requests_with_chosen_workshop(&self) -> Result<Vec<ServiceRequest>, AppError>;

    /// Requests carrying a savings result, optionally for one customer.
    async fn list_requests_with_savings(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<ServiceRequest>, AppError>;

    async fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>, AppError>;

    /// Overwrite the savings result of one request in a single write.
    ///
    /// Only the `savings` and `savings_calculated_at` fields are touched.
    async fn store_savings(
        &self,
        request_id: &str,
        result: &SavingsResult,
        calculated_at: &str,
    ) -> Result<(), AppError>;
}
