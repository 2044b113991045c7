// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Savings results and the portfolio/batch aggregates built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How the CO2 figure was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationMethod {
    /// Fleet-average g/km
    Standard,
    /// Vehicle-specific consumption
    Personal,
}

/// Which counterfactual set the figure was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum CounterfactualMode {
    /// N nearest workshops, no workshop chosen yet
    PreDecision,
    /// N-1 nearest plus the chosen workshop
    Reconciliation,
}

/// Savings attributed to one service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SavingsResult {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub co2_grams: u64,
    pub calculation_method: CalculationMethod,
    pub mode: CounterfactualMode,
    /// Round trip, km
    pub distance_avoided_km: f64,
    /// Liters, kg (CNG) or kWh; personal calculations only
    pub fuel_or_energy_saved: Option<f64>,
    /// Currency, 2 decimals; personal calculations only
    pub money_saved: Option<f64>,
    pub workshops_used: u32,
}

/// Fixed conversion constants for human-relatable equivalences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalenceFactors {
    pub grams_per_car_km: f64,
    pub kg_per_tree_year: f64,
    pub grams_per_phone_charge: f64,
}

impl Default for EquivalenceFactors {
    fn default() -> Self {
        Self {
            grams_per_car_km: 140.0,
            kg_per_tree_year: 20.0,
            grams_per_phone_charge: 8.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Equivalences {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub car_km: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub trees: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub phone_charges: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkshopsUsedBucket {
    pub requests: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub co2_grams: u64,
}

/// Fleet-wide totals over every request with a stored result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PortfolioReport {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_co2_grams: u64,
    /// 2 decimals
    pub total_co2_kg: f64,
    pub request_count: u32,
    /// 1 decimal
    pub total_distance_avoided_km: f64,
    /// Only present when at least one personal result carried a money figure
    pub total_money_saved: Option<f64>,
    /// Sum of workshops_used over all requests
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub avoided_trips: u64,
    pub by_workshops_used: BTreeMap<u32, WorkshopsUsedBucket>,
    pub by_method: BTreeMap<CalculationMethod, u32>,
    pub equivalences: Equivalences,
}

impl PortfolioReport {
    /// Aggregate stored results into a report.
    pub fn from_results<'a, I>(results: I, factors: &EquivalenceFactors) -> Self
    where
        I: IntoIterator<Item = &'a SavingsResult>,
    {
        let mut report = PortfolioReport::default();
        let mut distance = 0.0;
        let mut money: Option<f64> = None;

        for result in results {
            report.request_count += 1;
            report.total_co2_grams += result.co2_grams;
            report.avoided_trips += u64::from(result.workshops_used);
            distance += result.distance_avoided_km;

            if let Some(m) = result.money_saved {
                *money.get_or_insert(0.0) += m;
            }

            let bucket = report
                .by_workshops_used
                .entry(result.workshops_used)
                .or_default();
            bucket.requests += 1;
            bucket.co2_grams += result.co2_grams;

            *report
                .by_method
                .entry(result.calculation_method)
                .or_insert(0) += 1;
        }

        let total_kg = report.total_co2_grams as f64 / 1000.0;
        report.total_co2_kg = round_to(total_kg, 2);
        report.total_distance_avoided_km = round_to(distance, 1);
        report.total_money_saved = money.map(|m| round_to(m, 2));
        report.equivalences = Equivalences {
            car_km: ratio(report.total_co2_grams as f64, factors.grams_per_car_km),
            trees: ratio(total_kg, factors.kg_per_tree_year),
            phone_charges: ratio(report.total_co2_grams as f64, factors.grams_per_phone_charge),
        };

        report
    }
}

fn ratio(value: f64, per: f64) -> u64 {
    if per > 0.0 {
        (value / per).round() as u64
    } else {
        0
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// One record the batch run could not update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecordFailure {
    pub request_id: String,
    /// Stable reason code
    pub reason: String,
    pub message: String,
}

/// Outcome of a batch reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BatchSummary {
    /// Requests eligible for reconciliation
    pub total: u32,
    pub updated: u32,
    pub failed: u32,
    /// Run stopped before every record was attempted
    pub cancelled: bool,
    /// Sorted by request ID
    pub failures: Vec<RecordFailure>,
    /// workshops_used → number of updated requests
    pub workshops_histogram: BTreeMap<u32, u32>,
}

impl BatchSummary {
    pub fn record_success(&mut self, result: &SavingsResult) {
        self.updated += 1;
        *self
            .workshops_histogram
            .entry(result.workshops_used)
            .or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, failure: RecordFailure) {
        self.failed += 1;
        self.failures.push(failure);
    }

    /// Records attempted so far.
    pub fn attempted(&self) -> u32 {
        self.updated + self.failed
    }
}
