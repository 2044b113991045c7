// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emission model: avoided distance to CO2, fuel and money.

use crate::models::savings::round_to;
use crate::models::vehicle::Consumption;
use crate::models::{CalculationMethod, EmissionSettings, EnergySource, Vehicle};

/// CO2 and cost figures for an avoided round-trip distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub co2_grams: u64,
    pub method: CalculationMethod,
    /// Liters, kg (CNG) or kWh, full precision
    pub fuel_or_energy: Option<f64>,
    /// 2 decimals
    pub money: Option<f64>,
}

/// Estimate the emission avoided over `distance_km`.
///
/// A vehicle with a known fuel type and the matching consumption figure gets
/// a personal calculation; anything else falls back to the fleet average.
pub fn estimate(
    distance_km: f64,
    vehicle: Option<&Vehicle>,
    settings: &EmissionSettings,
) -> Emission {
    match vehicle.and_then(Vehicle::consumption) {
        Some(consumption) => personal(distance_km, consumption, settings),
        None => standard(distance_km, settings),
    }
}

fn standard(distance_km: f64, settings: &EmissionSettings) -> Emission {
    Emission {
        co2_grams: grams(distance_km * settings.fleet_average_co2_per_km()),
        method: CalculationMethod::Standard,
        fuel_or_energy: None,
        money: None,
    }
}

fn personal(distance_km: f64, consumption: Consumption, settings: &EmissionSettings) -> Emission {
    let (source, rate) = match consumption {
        Consumption::Electric(rate) => (EnergySource::Electric, rate),
        Consumption::Combustion(fuel, rate) => match EnergySource::for_fuel(fuel) {
            Some(source) => (source, rate),
            // Vehicle::consumption never yields an unknown fuel
            None => return standard(distance_km, settings),
        },
    };

    let factors = settings.factors(source);
    let used = distance_km / 100.0 * rate;

    Emission {
        co2_grams: grams(used * factors.co2_grams_per_unit),
        method: CalculationMethod::Personal,
        fuel_or_energy: Some(used),
        money: Some(round_to(used * factors.price_per_unit, 2)),
    }
}

fn grams(value: f64) -> u64 {
    // Inputs are validated non-negative; clamp guards against -0.0
    value.max(0.0).round() as u64
}
