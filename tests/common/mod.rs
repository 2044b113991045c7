// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use co2_savings::config::Config;
use co2_savings::db::{FirestoreDb, InMemoryDb};
use co2_savings::middleware::auth::{create_jwt, ADMIN_ROLE};
use co2_savings::models::{EmissionSettingsDocument, ServiceRequest, Workshop};
use co2_savings::routes::create_router;
use co2_savings::AppState;
use std::sync::Arc;

/// Requester location used across tests (Stuttgart).
#[allow(dead_code)]
pub const REQ_LAT: f64 = 48.7758;
#[allow(dead_code)]
pub const REQ_LON: f64 = 9.1829;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Settings with a round fleet average (110 g/km) and N = 2.
#[allow(dead_code)]
pub fn test_settings() -> EmissionSettingsDocument {
    EmissionSettingsDocument {
        workshops_to_compare: 2,
        co2_per_km_combustion: 170.0,
        co2_per_km_electric: 50.0,
        ..EmissionSettingsDocument::default()
    }
}

/// Eligible workshop roughly `km` due north of the test requester.
#[allow(dead_code)]
pub fn workshop_north(id: &str, km: f64) -> Workshop {
    Workshop {
        id: id.to_string(),
        latitude: Some(REQ_LAT + km / 111.195),
        longitude: Some(REQ_LON),
        is_active: true,
        is_verified: true,
    }
}

#[allow(dead_code)]
pub fn service_request(id: &str, customer_id: &str, chosen: Option<&str>) -> ServiceRequest {
    ServiceRequest {
        id: id.to_string(),
        customer_id: Some(customer_id.to_string()),
        latitude: Some(REQ_LAT),
        longitude: Some(REQ_LON),
        chosen_workshop_id: chosen.map(str::to_string),
        ..ServiceRequest::default()
    }
}

/// In-memory store seeded with settings and workshops at 5, 12 and 20 km.
#[allow(dead_code)]
pub fn seeded_db() -> Arc<InMemoryDb> {
    let db = Arc::new(InMemoryDb::with_settings(test_settings()));
    db.insert_workshop(workshop_north("w05", 5.0));
    db.insert_workshop(workshop_north("w12", 12.0));
    db.insert_workshop(workshop_north("w20", 20.0));
    db
}

/// Create a test app over the given in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with(db: Arc<InMemoryDb>) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), db));
    (create_router(state.clone()), state)
}

/// Create a test app over a seeded in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<InMemoryDb>) {
    let db = seeded_db();
    let (app, state) = create_test_app_with(db.clone());
    (app, state, db)
}

/// Session JWT for a regular customer.
#[allow(dead_code)]
pub fn customer_token(config: &Config, user_id: &str) -> String {
    create_jwt(user_id, None, &config.jwt_signing_key).expect("Failed to create JWT")
}

/// Session JWT with the admin role.
#[allow(dead_code)]
pub fn admin_token(config: &Config) -> String {
    create_jwt("admin-1", Some(ADMIN_ROLE), &config.jwt_signing_key).expect("Failed to create JWT")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
