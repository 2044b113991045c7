// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Savings aggregation.
//!
//! Runs the comparison-set and emission computations for a service request
//! and writes the result back:
//! - Online estimate before a workshop is chosen
//! - Reconciliation of one request once an offer is accepted
//! - Batch reconciliation over every accepted request
//! - Portfolio totals over stored results

use crate::db::SavingsRepository;
use crate::error::{AppError, RecordError, Result};
use crate::models::{
    BatchSummary, EmissionSettings, EquivalenceFactors, PortfolioReport, RecordFailure,
    SavingsResult, ServiceRequest, SettingsError, Vehicle, Workshop,
};
use crate::services::candidates::CandidateSet;
use crate::services::counterfactual::{self, ChosenWorkshop, ComparisonSet};
use crate::services::emission;
use futures_util::{future, stream, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of an online estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateOutcome {
    pub result: SavingsResult,
    /// Whether the estimate was written to the request
    pub persisted: bool,
}

/// Settings and directory snapshot shared by every record of a run.
pub struct CalculationContext {
    pub settings: EmissionSettings,
    pub candidates: CandidateSet,
    directory: HashMap<String, Workshop>,
}

impl CalculationContext {
    pub fn new(settings: EmissionSettings, workshops: Vec<Workshop>) -> Self {
        let candidates = CandidateSet::from_directory(&workshops);
        let directory = workshops.into_iter().map(|w| (w.id.clone(), w)).collect();
        Self {
            settings,
            candidates,
            directory,
        }
    }

    /// Comparison set for a request in the mode its state calls for.
    ///
    /// `reconcile` selects reconciliation mode, which needs a chosen workshop.
    pub fn comparison_set(
        &self,
        request: &ServiceRequest,
        reconcile: bool,
    ) -> std::result::Result<ComparisonSet, RecordError> {
        let requester = request
            .location()?
            .ok_or(RecordError::MissingRequesterLocation)?;
        let n = self.settings.workshops_to_compare();

        if !reconcile {
            return Ok(counterfactual::pre_decision(
                requester,
                self.candidates.as_slice(),
                n,
            ));
        }

        let chosen_id = request
            .chosen_workshop_id
            .as_deref()
            .ok_or(RecordError::NoChosenWorkshop)?;
        let chosen = self
            .directory
            .get(chosen_id)
            .ok_or_else(|| RecordError::ChosenWorkshopNotFound(chosen_id.to_string()))?;
        let location = chosen
            .location()?
            .ok_or_else(|| RecordError::ChosenWorkshopNotGeocoded(chosen_id.to_string()))?;

        Ok(counterfactual::reconciliation(
            requester,
            self.candidates.as_slice(),
            n,
            ChosenWorkshop {
                workshop_id: chosen_id,
                location,
            },
        ))
    }
}

pub struct SavingsService {
    db: Arc<dyn SavingsRepository>,
    equivalences: EquivalenceFactors,
    batch_concurrency: usize,
}

impl SavingsService {
    pub fn new(
        db: Arc<dyn SavingsRepository>,
        equivalences: EquivalenceFactors,
        batch_concurrency: usize,
    ) -> Self {
        Self {
            db,
            equivalences,
            batch_concurrency: batch_concurrency.max(1),
        }
    }

    /// Load and validate settings plus the workshop directory.
    ///
    /// Fails with a configuration error before any record is touched.
    pub async fn load_context(&self) -> Result<CalculationContext> {
        let document = self
            .db
            .get_emission_settings()
            .await?
            .ok_or(SettingsError::NotConfigured)?;
        let settings = EmissionSettings::try_from(&document)?;
        let workshops = self.db.list_workshops().await?;

        let context = CalculationContext::new(settings, workshops);
        tracing::debug!(
            candidates = context.candidates.len(),
            workshops_to_compare = context.settings.workshops_to_compare(),
            "Loaded calculation context"
        );
        Ok(context)
    }

    /// Compute (without storing) the savings for one request.
    pub async fn calculate(
        &self,
        context: &CalculationContext,
        request: &ServiceRequest,
        reconcile: bool,
    ) -> std::result::Result<SavingsResult, RecordError> {
        let set = context.comparison_set(request, reconcile)?;
        let vehicle = self.load_vehicle(request).await?;
        let distance_avoided_km = set.distance_avoided_km();
        let emission = emission::estimate(distance_avoided_km, vehicle.as_ref(), &context.settings);

        Ok(SavingsResult {
            co2_grams: emission.co2_grams,
            calculation_method: emission.method,
            mode: set.mode,
            distance_avoided_km,
            fuel_or_energy_saved: emission.fuel_or_energy,
            money_saved: emission.money,
            workshops_used: set.workshops_used(),
        })
    }

    async fn load_vehicle(
        &self,
        request: &ServiceRequest,
    ) -> std::result::Result<Option<Vehicle>, RecordError> {
        let Some(vehicle_id) = request.vehicle_id.as_deref() else {
            return Ok(None);
        };

        let vehicle = self.db.get_vehicle(vehicle_id).await?;
        if vehicle.is_none() {
            tracing::warn!(
                request_id = %request.id,
                vehicle_id,
                "Vehicle not found, using fleet average"
            );
        }
        Ok(vehicle)
    }

    /// Informational estimate against the N nearest workshops.
    ///
    /// Stored only when `persist` is set and no workshop has been chosen yet,
    /// so a reconciled figure is never replaced by an estimate.
    pub async fn estimate(&self, request_id: &str, persist: bool) -> Result<EstimateOutcome> {
        let request = self.get_request(request_id).await?;
        self.estimate_request(&request, persist).await
    }

    /// Estimate for an already loaded request.
    pub async fn estimate_request(
        &self,
        request: &ServiceRequest,
        persist: bool,
    ) -> Result<EstimateOutcome> {
        let context = self.load_context().await?;
        let result = self.calculate(&context, request, false).await?;

        let persisted = persist && request.chosen_workshop_id.is_none();
        if persisted {
            self.db
                .store_savings(&request.id, &result, &now_rfc3339())
                .await?;
        }

        tracing::info!(
            request_id = %request.id,
            co2_grams = result.co2_grams,
            workshops_used = result.workshops_used,
            persisted,
            "Computed savings estimate"
        );

        Ok(EstimateOutcome { result, persisted })
    }

    /// Recompute and overwrite the savings of one accepted request.
    pub async fn reconcile(&self, request_id: &str) -> Result<SavingsResult> {
        let context = self.load_context().await?;
        let request = self.get_request(request_id).await?;
        Ok(self.reconcile_record(&context, &request).await?)
    }

    /// Per-record pipeline: comparison set, emission, write.
    ///
    /// Nothing is written unless the whole computation succeeded.
    pub async fn reconcile_record(
        &self,
        context: &CalculationContext,
        request: &ServiceRequest,
    ) -> std::result::Result<SavingsResult, RecordError> {
        let result = self.calculate(context, request, true).await?;
        self.db
            .store_savings(&request.id, &result, &now_rfc3339())
            .await?;

        tracing::info!(
            request_id = %request.id,
            co2_grams = result.co2_grams,
            workshops_used = result.workshops_used,
            method = ?result.calculation_method,
            "Reconciled savings"
        );
        Ok(result)
    }

    /// Reconcile every request with a chosen workshop.
    ///
    /// Configuration errors abort before any record is processed. Per-record
    /// errors are logged and reported in the summary. Setting `cancel` stops
    /// the run between records.
    pub async fn reconcile_all(&self, cancel: &AtomicBool) -> Result<BatchSummary> {
        let context = self.load_context().await?;

        let mut requests = self.db.list_requests_with_chosen_workshop().await?;
        requests.sort_by(|a, b| a.id.cmp(&b.id));

        let mut summary = BatchSummary {
            total: requests.len() as u32,
            ..BatchSummary::default()
        };

        tracing::info!(
            total = summary.total,
            concurrency = self.batch_concurrency,
            "Starting batch reconciliation"
        );

        let context = &context;
        let outcomes: Vec<(String, std::result::Result<SavingsResult, RecordError>)> =
            stream::iter(requests)
                .take_while(|_| future::ready(!cancel.load(Ordering::SeqCst)))
                .map(|request| async move {
                    let outcome = self.reconcile_record(context, &request).await;
                    (request.id, outcome)
                })
                .buffer_unordered(self.batch_concurrency)
                .collect()
                .await;

        for (request_id, outcome) in outcomes {
            match outcome {
                Ok(result) => summary.record_success(&result),
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        reason = e.reason_code(),
                        error = %e,
                        "Skipping request"
                    );
                    summary.record_failure(RecordFailure {
                        request_id,
                        reason: e.reason_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        summary
            .failures
            .sort_by(|a, b| a.request_id.cmp(&b.request_id));
        summary.cancelled = summary.attempted() < summary.total;

        tracing::info!(
            total = summary.total,
            updated = summary.updated,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Batch reconciliation finished"
        );

        Ok(summary)
    }

    /// Totals and equivalences over stored results.
    pub async fn portfolio(&self, customer_id: Option<&str>) -> Result<PortfolioReport> {
        let requests = self.db.list_requests_with_savings(customer_id).await?;
        let report = PortfolioReport::from_results(
            requests.iter().filter_map(|r| r.savings.as_ref()),
            &self.equivalences,
        );
        Ok(report)
    }

    pub async fn get_request(&self, request_id: &str) -> Result<ServiceRequest> {
        self.db
            .get_service_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service request {}", request_id)))
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryDb;
    use crate::models::{
        CalculationMethod, CounterfactualMode, EmissionSettingsDocument, FuelType,
    };

    const REQ_LAT: f64 = 48.7758;
    const REQ_LON: f64 = 9.1829;

    fn workshop_north(id: &str, km: f64) -> Workshop {
        Workshop {
            id: id.to_string(),
            latitude: Some(REQ_LAT + km / 111.195),
            longitude: Some(REQ_LON),
            is_active: true,
            is_verified: true,
        }
    }

    fn request(id: &str, chosen: Option<&str>) -> ServiceRequest {
        ServiceRequest {
            id: id.to_string(),
            customer_id: Some("c1".to_string()),
            latitude: Some(REQ_LAT),
            longitude: Some(REQ_LON),
            chosen_workshop_id: chosen.map(str::to_string),
            ..ServiceRequest::default()
        }
    }

    fn settings() -> EmissionSettingsDocument {
        EmissionSettingsDocument {
            workshops_to_compare: 2,
            co2_per_km_combustion: 170.0,
            co2_per_km_electric: 50.0,
            ..EmissionSettingsDocument::default()
        }
    }

    fn setup() -> (Arc<InMemoryDb>, SavingsService) {
        let db = Arc::new(InMemoryDb::with_settings(settings()));
        db.insert_workshop(workshop_north("w05", 5.0));
        db.insert_workshop(workshop_north("w12", 12.0));
        db.insert_workshop(workshop_north("w20", 20.0));
        let service = SavingsService::new(db.clone(), EquivalenceFactors::default(), 1);
        (db, service)
    }

    #[tokio::test]
    async fn test_estimate_pre_decision() {
        let (db, service) = setup();
        db.insert_request(request("r1", None));

        let outcome = service.estimate("r1", false).await.unwrap();
        assert_eq!(outcome.result.mode, CounterfactualMode::PreDecision);
        assert_eq!(outcome.result.workshops_used, 2);
        assert_eq!(outcome.result.co2_grams, 3740);
        assert_eq!(outcome.result.calculation_method, CalculationMethod::Standard);
        assert!(!outcome.persisted);
        assert!(db.request("r1").unwrap().savings.is_none());
    }

    #[tokio::test]
    async fn test_estimate_persist_only_without_chosen_workshop() {
        let (db, service) = setup();
        db.insert_request(request("open", None));
        db.insert_request(request("accepted", Some("w20")));

        assert!(service.estimate("open", true).await.unwrap().persisted);
        assert!(db.request("open").unwrap().savings.is_some());

        assert!(!service.estimate("accepted", true).await.unwrap().persisted);
        assert!(db.request("accepted").unwrap().savings.is_none());
    }

    #[tokio::test]
    async fn test_estimate_without_location_is_unavailable() {
        let (db, service) = setup();
        db.insert_request(ServiceRequest {
            latitude: None,
            ..request("r1", None)
        });

        let err = service.estimate("r1", true).await.unwrap_err();
        assert!(matches!(err, AppError::EstimateUnavailable(_)));
        assert!(db.request("r1").unwrap().savings.is_none());
    }

    #[tokio::test]
    async fn test_reconcile_stores_result() {
        let (db, service) = setup();
        db.insert_request(request("r1", Some("w20")));

        let result = service.reconcile("r1").await.unwrap();
        assert_eq!(result.mode, CounterfactualMode::Reconciliation);
        assert!((result.distance_avoided_km - 50.0).abs() < 0.01);
        assert_eq!(result.co2_grams, (result.distance_avoided_km * 110.0).round() as u64);

        let stored = db.request("r1").unwrap();
        assert_eq!(stored.savings, Some(result));
        assert!(stored.savings_calculated_at.is_some());
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (db, service) = setup();
        db.insert_request(request("r1", Some("w12")));

        let first = service.reconcile("r1").await.unwrap();
        let second = service.reconcile("r1").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_personal_vehicle_used() {
        let (db, service) = setup();
        db.insert_vehicle(Vehicle {
            id: "v1".to_string(),
            fuel_type: FuelType::Diesel,
            fuel_consumption_per_100: Some(5.0),
            electric_consumption_per_100: None,
        });
        db.insert_request(ServiceRequest {
            vehicle_id: Some("v1".to_string()),
            ..request("r1", Some("w05"))
        });

        let result = service.reconcile("r1").await.unwrap();
        assert_eq!(result.calculation_method, CalculationMethod::Personal);
        assert!(result.money_saved.is_some());
        assert!(result.fuel_or_energy_saved.is_some());
    }

    #[tokio::test]
    async fn test_missing_vehicle_falls_back_to_standard() {
        let (db, service) = setup();
        db.insert_request(ServiceRequest {
            vehicle_id: Some("gone".to_string()),
            ..request("r1", Some("w05"))
        });

        let result = service.reconcile("r1").await.unwrap();
        assert_eq!(result.calculation_method, CalculationMethod::Standard);
    }

    #[tokio::test]
    async fn test_missing_settings_is_configuration_error() {
        let db = Arc::new(InMemoryDb::new());
        db.insert_request(request("r1", Some("w05")));
        let service = SavingsService::new(db.clone(), EquivalenceFactors::default(), 1);

        let err = service.reconcile_all(&AtomicBool::new(false)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(SettingsError::NotConfigured)
        ));
        assert!(db.request("r1").unwrap().savings.is_none());
    }

    #[tokio::test]
    async fn test_empty_directory_records_zero() {
        let db = Arc::new(InMemoryDb::with_settings(settings()));
        db.insert_workshop(Workshop {
            is_verified: false,
            ..workshop_north("chosen", 8.0)
        });
        db.insert_request(request("r1", None));
        let service = SavingsService::new(db.clone(), EquivalenceFactors::default(), 1);

        let outcome = service.estimate("r1", true).await.unwrap();
        assert_eq!(outcome.result.workshops_used, 0);
        assert_eq!(outcome.result.distance_avoided_km, 0.0);
        assert_eq!(outcome.result.co2_grams, 0);
        assert!(outcome.persisted);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let (db, service) = setup();
        db.insert_request(request("a-ok", Some("w20")));
        db.insert_request(ServiceRequest {
            latitude: None,
            longitude: None,
            ..request("b-no-location", Some("w05"))
        });
        db.insert_request(request("c-unknown-workshop", Some("nope")));
        db.insert_request(request("d-write-fails", Some("w12")));
        db.insert_request(request("e-ok", Some("w05")));
        db.insert_request(request("f-open", None));
        db.set_fail_write_ids(["d-write-fails"]);

        let summary = service.reconcile_all(&AtomicBool::new(false)).await.unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.failed, 3);
        assert!(!summary.cancelled);

        let reasons: Vec<(&str, &str)> = summary
            .failures
            .iter()
            .map(|f| (f.request_id.as_str(), f.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("b-no-location", "missing_requester_location"),
                ("c-unknown-workshop", "chosen_workshop_not_found"),
                ("d-write-fails", "storage_error"),
            ]
        );
        // a-ok compares w05 and w20; e-ok chose the nearest, so only w05
        assert_eq!(summary.workshops_histogram.get(&2), Some(&1));
        assert_eq!(summary.workshops_histogram.get(&1), Some(&1));

        assert!(db.request("a-ok").unwrap().savings.is_some());
        assert!(db.request("d-write-fails").unwrap().savings.is_none());
        assert!(db.request("f-open").unwrap().savings.is_none());
    }

    #[tokio::test]
    async fn test_failed_rerun_keeps_previous_result() {
        let (db, service) = setup();
        db.insert_request(request("moved", Some("w20")));
        db.insert_request(request("flaky", Some("w12")));

        let first = service.reconcile_all(&AtomicBool::new(false)).await.unwrap();
        assert_eq!(first.updated, 2);
        let moved_before = db.request("moved").unwrap();
        let flaky_before = db.request("flaky").unwrap();
        assert!(moved_before.savings.is_some());

        // Chosen workshop no longer exists; the other record can't be written.
        db.insert_request(ServiceRequest {
            chosen_workshop_id: Some("gone".to_string()),
            ..moved_before.clone()
        });
        db.set_fail_write_ids(["flaky"]);

        let second = service.reconcile_all(&AtomicBool::new(false)).await.unwrap();
        assert_eq!(second.updated, 0);
        assert_eq!(second.failed, 2);

        let moved_after = db.request("moved").unwrap();
        assert_eq!(moved_after.savings, moved_before.savings);
        assert_eq!(
            moved_after.savings_calculated_at,
            moved_before.savings_calculated_at
        );
        let flaky_after = db.request("flaky").unwrap();
        assert_eq!(flaky_after.savings, flaky_before.savings);
        assert_eq!(
            flaky_after.savings_calculated_at,
            flaky_before.savings_calculated_at
        );
    }

    #[tokio::test]
    async fn test_batch_concurrent_matches_sequential() {
        let (db, sequential) = setup();
        for i in 0..20 {
            let chosen = ["w05", "w12", "w20"][i % 3];
            db.insert_request(request(&format!("r{:02}", i), Some(chosen)));
        }
        let concurrent = SavingsService::new(db.clone(), EquivalenceFactors::default(), 8);

        let a = sequential.reconcile_all(&AtomicBool::new(false)).await.unwrap();
        let first: Vec<_> = (0..20)
            .map(|i| db.request(&format!("r{:02}", i)).unwrap().savings)
            .collect();
        let b = concurrent.reconcile_all(&AtomicBool::new(false)).await.unwrap();
        let second: Vec<_> = (0..20)
            .map(|i| db.request(&format!("r{:02}", i)).unwrap().savings)
            .collect();

        assert_eq!(a, b);
        assert_eq!(first, second);
        assert_eq!(b.updated, 20);
    }

    #[tokio::test]
    async fn test_batch_cancelled_before_start() {
        let (db, service) = setup();
        db.insert_request(request("r1", Some("w05")));
        db.insert_request(request("r2", Some("w12")));

        let summary = service.reconcile_all(&AtomicBool::new(true)).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.attempted(), 0);
        assert!(summary.cancelled);
        assert!(db.request("r1").unwrap().savings.is_none());
    }

    #[tokio::test]
    async fn test_portfolio_over_stored_results() {
        let (db, service) = setup();
        db.insert_request(request("r1", Some("w20")));
        db.insert_request(ServiceRequest {
            customer_id: Some("c2".to_string()),
            ..request("r2", Some("w05"))
        });
        db.insert_request(request("r3", None));
        service.reconcile_all(&AtomicBool::new(false)).await.unwrap();

        let all = service.portfolio(None).await.unwrap();
        assert_eq!(all.request_count, 2);
        assert_eq!(all.avoided_trips, 3);

        let c2 = service.portfolio(Some("c2")).await.unwrap();
        assert_eq!(c2.request_count, 1);
        assert_eq!(
            c2.total_co2_grams,
            db.request("r2").unwrap().savings.unwrap().co2_grams
        );
    }
}
