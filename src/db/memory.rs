// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for tests and local runs without Firestore.

use crate::db::SavingsRepository;
use crate::error::AppError;
use crate::models::{EmissionSettingsDocument, SavingsResult, ServiceRequest, Vehicle, Workshop};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDb {
    settings: RwLock<Option<EmissionSettingsDocument>>,
    workshops: DashMap<String, Workshop>,
    requests: DashMap<String, ServiceRequest>,
    vehicles: DashMap<String, Vehicle>,
    /// Request IDs whose savings write fails
    fail_write_ids: DashSet<String>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: EmissionSettingsDocument) -> Self {
        Self {
            settings: RwLock::new(Some(settings)),
            ..Self::default()
        }
    }

    pub fn insert_workshop(&self, workshop: Workshop) {
        self.workshops.insert(workshop.id.clone(), workshop);
    }

    pub fn insert_request(&self, request: ServiceRequest) {
        self.requests.insert(request.id.clone(), request);
    }

    pub fn insert_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id.clone(), vehicle);
    }

    /// Snapshot of a stored request.
    pub fn request(&self, request_id: &str) -> Option<ServiceRequest> {
        self.requests.get(request_id).map(|r| r.clone())
    }

    /// Make `store_savings` fail for these request IDs (replaces previous set).
    pub fn set_fail_write_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fail_write_ids.clear();
        for id in ids {
            self.fail_write_ids.insert(id.into());
        }
    }
}

#[async_trait]
impl SavingsRepository for InMemoryDb {
    async fn get_emission_settings(&self) -> Result<Option<EmissionSettingsDocument>, AppError> {
        Ok(self.settings.read().await.clone())
    }

    async fn set_emission_settings(
        &self,
        settings: &EmissionSettingsDocument,
    ) -> Result<(), AppError> {
        *self.settings.write().await = Some(settings.clone());
        Ok(())
    }

    async fn list_workshops(&self) -> Result<Vec<Workshop>, AppError> {
        Ok(self.workshops.iter().map(|w| w.value().clone()).collect())
    }

    async fn get_service_request(
        &self,
        request_id: &str,
    ) -> Result<Option<ServiceRequest>, AppError> {
        Ok(self.request(request_id))
    }

    async fn list_requests_with_chosen_workshop(&self) -> Result<Vec<ServiceRequest>, AppError> {
        Ok(self
            .requests
            .iter()
            .filter(|r| r.chosen_workshop_id.is_some())
            .map(|r| r.value().clone())
            .collect())
    }

    async fn list_requests_with_savings(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<ServiceRequest>, AppError> {
        Ok(self
            .requests
            .iter()
            .filter(|r| r.savings.is_some())
            .filter(|r| customer_id.is_none() || r.customer_id.as_deref() == customer_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>, AppError> {
        Ok(self.vehicles.get(vehicle_id).map(|v| v.clone()))
    }

    async fn store_savings(
        &self,
        request_id: &str,
        result: &SavingsResult,
        calculated_at: &str,
    ) -> Result<(), AppError> {
        if self.fail_write_ids.contains(request_id) {
            return Err(AppError::Database(format!(
                "Simulated write failure for {}",
                request_id
            )));
        }

        let mut entry = self.requests.get_mut(request_id).ok_or_else(|| {
            AppError::Database(format!("Service request {} disappeared", request_id))
        })?;
        entry.savings = Some(result.clone());
        entry.savings_calculated_at = Some(calculated_at.to_string());
        Ok(())
    }
}
