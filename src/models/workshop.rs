// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workshop (service provider) directory model.

use crate::models::location::{GeoError, GeoPoint};
use serde::{Deserialize, Serialize};

/// Workshop record as stored in the provider directory.
///
/// Owned by the workshop-management flows; read-only for savings calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workshop {
    /// Workshop ID (also used as document ID)
    pub id: String,
    /// Latitude in decimal degrees (None if not geocoded)
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees (None if not geocoded)
    pub longitude: Option<f64>,
    /// Whether the owning account is active
    #[serde(default)]
    pub is_active: bool,
    /// Whether the workshop passed verification
    #[serde(default)]
    pub is_verified: bool,
}

impl Workshop {
    /// Validated location, `Ok(None)` if not geocoded.
    pub fn location(&self) -> Result<Option<GeoPoint>, GeoError> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}
