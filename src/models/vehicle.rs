// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Customer vehicle model.

use serde::{Deserialize, Serialize};

/// Fuel type as recorded on the customer's vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Petrol,
    Diesel,
    Lpg,
    Cng,
    Electric,
    Hybrid,
    PluginHybrid,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Vehicle record (read-only here).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    #[serde(default)]
    pub fuel_type: FuelType,
    /// Liters (kg for CNG) per 100 km
    pub fuel_consumption_per_100: Option<f64>,
    /// kWh per 100 km
    pub electric_consumption_per_100: Option<f64>,
}

/// Vehicle-specific consumption, present only when personal calculation is possible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Consumption {
    /// kWh per 100 km
    Electric(f64),
    /// Liters (or kg) per 100 km for a combustion or hybrid fuel type
    Combustion(FuelType, f64),
}

impl Vehicle {
    /// Consumption figure usable for a personal calculation.
    ///
    /// `None` for unknown fuel types and for missing, zero, negative or
    /// non-finite consumption values.
    pub fn consumption(&self) -> Option<Consumption> {
        let usable = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);
        match self.fuel_type {
            FuelType::Unknown => None,
            FuelType::Electric => usable(self.electric_consumption_per_100).map(Consumption::Electric),
            fuel => usable(self.fuel_consumption_per_100).map(|c| Consumption::Combustion(fuel, c)),
        }
    }
}
