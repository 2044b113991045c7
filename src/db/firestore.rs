// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Workshops (provider directory, read-only)
//! - Service requests (savings result written back)
//! - Vehicles (read-only)
//! - Emission settings (singleton admin document)

use crate::db::{collections, SavingsRepository};
use crate::error::AppError;
use crate::models::{EmissionSettingsDocument, SavingsResult, ServiceRequest, Vehicle, Workshop};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // Emulator needs no credentials; skip the default token lookup.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Seeding (tools and integration tests) ───────────────────

    pub async fn upsert_workshop(&self, workshop: &Workshop) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::WORKSHOPS)
            .document_id(&workshop.id)
            .object(workshop)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn upsert_service_request(&self, request: &ServiceRequest) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::SERVICE_REQUESTS)
            .document_id(&request.id)
            .object(request)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn upsert_vehicle(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::VEHICLES)
            .document_id(&vehicle.id)
            .object(vehicle)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SavingsRepository for FirestoreDb {
    // ─── Emission Settings ───────────────────────────────────────

    async fn get_emission_settings(&self) -> Result<Option<EmissionSettingsDocument>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::EMISSION_SETTINGS)
            .obj()
            .one(collections::EMISSION_SETTINGS_DOC_ID)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_emission_settings(
        &self,
        settings: &EmissionSettingsDocument,
    ) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::EMISSION_SETTINGS)
            .document_id(collections::EMISSION_SETTINGS_DOC_ID)
            .object(settings)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Workshop Directory ──────────────────────────────────────

    async fn list_workshops(&self) -> Result<Vec<Workshop>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::WORKSHOPS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Service Requests ────────────────────────────────────────

    async fn get_service_request(
        &self,
        request_id: &str,
    ) -> Result<Option<ServiceRequest>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::SERVICE_REQUESTS)
            .obj()
            .one(request_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_requests_with_chosen_workshop(&self) -> Result<Vec<ServiceRequest>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::SERVICE_REQUESTS)
            .filter(|q| q.for_all([q.field("chosen_workshop_id").is_not_null()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_requests_with_savings(
        &self,
        customer_id: Option<&str>,
    ) -> Result<Vec<ServiceRequest>, AppError> {
        let query = self
            .client
            .fluent()
            .select()
            .from(collections::SERVICE_REQUESTS);

        let query = if let Some(customer_id) = customer_id {
            let customer_id = customer_id.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("customer_id").eq(customer_id.clone()),
                    q.field("savings").is_not_null(),
                ])
            })
        } else {
            query.filter(|q| q.for_all([q.field("savings").is_not_null()]))
        };

        let requests: Vec<ServiceRequest> = query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(requests.into_iter().filter(|r| r.savings.is_some()).collect())
    }

    // ─── Vehicles ────────────────────────────────────────────────

    async fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::VEHICLES)
            .obj()
            .one(vehicle_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Savings Write-back ──────────────────────────────────────

    async fn store_savings(
        &self,
        request_id: &str,
        result: &SavingsResult,
        calculated_at: &str,
    ) -> Result<(), AppError> {
        // Field mask keeps the rest of the request document untouched.
        let patch = ServiceRequest {
            id: request_id.to_string(),
            savings: Some(result.clone()),
            savings_calculated_at: Some(calculated_at.to_string()),
            ..ServiceRequest::default()
        };

        let _: () = self
            .client
            .fluent()
            .update()
            .fields(firestore::paths!(ServiceRequest::{savings, savings_calculated_at}))
            .in_col(collections::SERVICE_REQUESTS)
            .document_id(request_id)
            .object(&patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(request_id, co2_grams = result.co2_grams, "Stored savings result");
        Ok(())
    }
}
