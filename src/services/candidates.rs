// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workshops eligible as comparison points.

use crate::models::{GeoPoint, Workshop};

/// An eligible workshop with its validated location.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub workshop_id: String,
    pub location: GeoPoint,
}

/// Active, verified and geocoded workshops from the directory.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Filter the full directory down to eligible workshops.
    ///
    /// Workshops with out-of-range coordinates are dropped with a warning so
    /// they never reach the distance computation.
    pub fn from_directory(directory: &[Workshop]) -> Self {
        let candidates = directory
            .iter()
            .filter(|w| w.is_active && w.is_verified)
            .filter_map(|w| match w.location() {
                Ok(Some(location)) => Some(Candidate {
                    workshop_id: w.id.clone(),
                    location,
                }),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(workshop_id = %w.id, error = %e, "Skipping workshop with invalid coordinates");
                    None
                }
            })
            .collect();

        Self { candidates }
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
