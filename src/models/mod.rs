// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod location;
pub mod request;
pub mod savings;
pub mod settings;
pub mod vehicle;
pub mod workshop;

pub use location::{GeoError, GeoPoint};
pub use request::ServiceRequest;
pub use savings::{
    BatchSummary, CalculationMethod, CounterfactualMode, EquivalenceFactors, PortfolioReport,
    RecordFailure, SavingsResult,
};
pub use settings::{EmissionSettings, EmissionSettingsDocument, EnergySource, SettingsError};
pub use vehicle::{FuelType, Vehicle};
pub use workshop::Workshop;
