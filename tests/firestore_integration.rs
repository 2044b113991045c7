// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). They are skipped otherwise.

use co2_savings::db::SavingsRepository;
use co2_savings::models::{
    CalculationMethod, CounterfactualMode, EquivalenceFactors, FuelType, SavingsResult, Vehicle,
};
use co2_savings::services::SavingsService;
use std::sync::Arc;

mod common;
use common::{service_request, test_db, workshop_north};

/// Unique suffix for test isolation within a shared emulator.
fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string()
}

#[tokio::test]
async fn test_settings_round_trip() {
    require_emulator!();

    let db = test_db().await;
    let settings = common::test_settings();

    db.set_emission_settings(&settings).await.unwrap();
    let fetched = db.get_emission_settings().await.unwrap();

    assert_eq!(fetched, Some(settings));
}

#[tokio::test]
async fn test_store_savings_keeps_other_fields() {
    require_emulator!();

    let db = test_db().await;
    let id = format!("req-{}", unique_suffix());
    let mut request = service_request(&id, "customer-a", Some("w-chosen"));
    request.vehicle_id = Some("v-1".to_string());
    db.upsert_service_request(&request).await.unwrap();

    let result = SavingsResult {
        co2_grams: 7573,
        calculation_method: CalculationMethod::Personal,
        mode: CounterfactualMode::Reconciliation,
        distance_avoided_km: 50.0,
        fuel_or_energy_saved: Some(3.25),
        money_saved: Some(5.69),
        workshops_used: 2,
    };
    db.store_savings(&id, &result, "2026-03-01T12:00:00Z")
        .await
        .unwrap();

    let fetched = db.get_service_request(&id).await.unwrap().unwrap();
    assert_eq!(fetched.savings, Some(result));
    assert_eq!(
        fetched.savings_calculated_at.as_deref(),
        Some("2026-03-01T12:00:00Z")
    );
    assert_eq!(fetched.customer_id.as_deref(), Some("customer-a"));
    assert_eq!(fetched.vehicle_id.as_deref(), Some("v-1"));
    assert_eq!(fetched.chosen_workshop_id.as_deref(), Some("w-chosen"));
}

#[tokio::test]
async fn test_reconcile_against_emulator() {
    require_emulator!();

    let db = Arc::new(test_db().await);
    let suffix = unique_suffix();
    db.set_emission_settings(&common::test_settings())
        .await
        .unwrap();

    // Chosen workshop is unverified: never a comparison point, but still
    // counted because the trip happened.
    let chosen_id = format!("w-chosen-{}", suffix);
    db.upsert_workshop(&co2_savings::models::Workshop {
        is_verified: false,
        ..workshop_north(&chosen_id, 7.0)
    })
    .await
    .unwrap();

    let vehicle_id = format!("v-{}", suffix);
    db.upsert_vehicle(&Vehicle {
        id: vehicle_id.clone(),
        fuel_type: FuelType::Diesel,
        fuel_consumption_per_100: Some(5.5),
        electric_consumption_per_100: None,
    })
    .await
    .unwrap();

    let request_id = format!("req-{}", suffix);
    let mut request = service_request(&request_id, "customer-b", Some(&chosen_id));
    request.vehicle_id = Some(vehicle_id);
    db.upsert_service_request(&request).await.unwrap();

    let service = SavingsService::new(db.clone(), EquivalenceFactors::default(), 1);
    let result = service.reconcile(&request_id).await.unwrap();

    assert_eq!(result.calculation_method, CalculationMethod::Personal);
    assert_eq!(result.mode, CounterfactualMode::Reconciliation);
    assert!(result.workshops_used >= 1);

    let stored = db.get_service_request(&request_id).await.unwrap().unwrap();
    assert_eq!(stored.savings, Some(result));
}

#[tokio::test]
async fn test_list_requests_with_savings_by_customer() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();
    let customer = format!("customer-{}", suffix);

    let with_savings = format!("req-a-{}", suffix);
    let without_savings = format!("req-b-{}", suffix);
    db.upsert_service_request(&service_request(&with_savings, &customer, None))
        .await
        .unwrap();
    db.upsert_service_request(&service_request(&without_savings, &customer, None))
        .await
        .unwrap();

    let result = SavingsResult {
        co2_grams: 1200,
        calculation_method: CalculationMethod::Standard,
        mode: CounterfactualMode::PreDecision,
        distance_avoided_km: 10.9,
        fuel_or_energy_saved: None,
        money_saved: None,
        workshops_used: 3,
    };
    db.store_savings(&with_savings, &result, "2026-03-01T12:00:00Z")
        .await
        .unwrap();

    let listed = db.list_requests_with_savings(Some(&customer)).await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![with_savings.as_str()]);
}
