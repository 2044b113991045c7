// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Counterfactual comparison sets.
//!
//! The avoided travel for a request is measured against the workshops the
//! customer would otherwise have visited to compare offers:
//! - Pre-decision: the N nearest eligible workshops.
//! - Reconciliation: the N-1 nearest eligible workshops plus the workshop
//!   actually chosen, which is always included exactly once.

use crate::models::{CounterfactualMode, GeoPoint};
use crate::services::candidates::Candidate;
use crate::services::distance::distance_km;
use crate::services::nearest::{nearest, RankedWorkshop};

/// Workshops the avoided trips are measured against, nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSet {
    pub mode: CounterfactualMode,
    pub workshops: Vec<RankedWorkshop>,
}

impl ComparisonSet {
    /// Number of comparison workshops actually used (may be below N).
    pub fn workshops_used(&self) -> u32 {
        self.workshops.len() as u32
    }

    /// Sum of one-way distances.
    pub fn one_way_km(&self) -> f64 {
        self.workshops.iter().map(|w| w.distance_km).sum()
    }

    /// Each comparison is an avoided outbound and return trip.
    pub fn distance_avoided_km(&self) -> f64 {
        2.0 * self.one_way_km()
    }
}

/// Workshop whose offer was accepted.
#[derive(Debug, Clone, Copy)]
pub struct ChosenWorkshop<'a> {
    pub workshop_id: &'a str,
    pub location: GeoPoint,
}

/// Comparison set before any workshop has been chosen.
pub fn pre_decision(
    requester: GeoPoint,
    candidates: &[Candidate],
    workshops_to_compare: u32,
) -> ComparisonSet {
    ComparisonSet {
        mode: CounterfactualMode::PreDecision,
        workshops: nearest(requester, candidates, workshops_to_compare as usize),
    }
}

/// Comparison set once a workshop has been chosen.
///
/// The chosen workshop need not be an eligible candidate; its distance is
/// computed from its own location because the trip actually happened.
pub fn reconciliation(
    requester: GeoPoint,
    candidates: &[Candidate],
    workshops_to_compare: u32,
    chosen: ChosenWorkshop<'_>,
) -> ComparisonSet {
    let n = workshops_to_compare.max(1) as usize;
    let nearest_count = n.saturating_sub(1).max(1);

    let mut workshops: Vec<RankedWorkshop> = nearest(requester, candidates, nearest_count)
        .into_iter()
        .filter(|w| w.workshop_id != chosen.workshop_id)
        .take(n - 1)
        .collect();

    workshops.push(RankedWorkshop {
        workshop_id: chosen.workshop_id.to_string(),
        distance_km: distance_km(requester, chosen.location),
    });
    workshops.sort_by(RankedWorkshop::rank_cmp);

    ComparisonSet {
        mode: CounterfactualMode::Reconciliation,
        workshops,
    }
}
