// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Service request model.

use crate::models::location::{GeoError, GeoPoint};
use crate::models::savings::SavingsResult;
use serde::{Deserialize, Serialize};

/// Stored service request.
///
/// Lifecycle: created without a chosen workshop (estimate possible), later
/// updated with the workshop whose offer was accepted (reconciliation), final
/// once a savings result is attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// Request ID (also used as document ID)
    pub id: String,
    /// Owning customer
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Requester latitude (None if not geocoded)
    pub latitude: Option<f64>,
    /// Requester longitude (None if not geocoded)
    pub longitude: Option<f64>,
    /// Vehicle the request was made for
    #[serde(default)]
    pub vehicle_id: Option<String>,
    /// Workshop whose offer was accepted
    #[serde(default)]
    pub chosen_workshop_id: Option<String>,
    /// Latest savings figure (overwritten on recomputation)
    #[serde(default)]
    pub savings: Option<SavingsResult>,
    /// When `savings` was last written (RFC3339)
    #[serde(default)]
    pub savings_calculated_at: Option<String>,
}

impl ServiceRequest {
    /// Validated requester location, `Ok(None)` if not geocoded.
    pub fn location(&self) -> Result<Option<GeoPoint>, GeoError> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}
