// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Emission settings: the stored admin document and its validated form.
//!
//! The stored document keeps every per-fuel field optional (older documents
//! predate some fuels) plus the legacy generic fuel factor. All fallback
//! resolution happens once, in [`EmissionSettings::try_from`], so the
//! calculation code never sees a missing factor.

use crate::models::vehicle::FuelType;
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Emission settings document as stored and edited by admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EmissionSettingsDocument {
    /// Size of the baseline comparison set (N)
    #[validate(range(min = 1))]
    pub workshops_to_compare: i64,

    // ─── Fleet averages (g CO2 per km) ───────────────────────────
    #[validate(range(min = 0.0))]
    pub co2_per_km_combustion: f64,
    #[validate(range(min = 0.0))]
    pub co2_per_km_electric: f64,

    // ─── CO2 factors (g per liter / kg / kWh) ────────────────────
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub co2_per_liter_petrol: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub co2_per_liter_diesel: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub co2_per_liter_lpg: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub co2_per_kg_cng: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub co2_per_kwh_electric: Option<f64>,

    // ─── Prices (currency per liter / kg / kWh) ──────────────────
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub petrol_price_per_liter: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub diesel_price_per_liter: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub lpg_price_per_liter: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub cng_price_per_kg: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub electric_price_per_kwh: Option<f64>,

    // ─── Legacy generic combustion values ────────────────────────
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub co2_per_liter_fuel: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fuel_price_per_liter: Option<f64>,
}

impl Default for EmissionSettingsDocument {
    fn default() -> Self {
        Self {
            workshops_to_compare: 3,
            co2_per_km_combustion: 140.0,
            co2_per_km_electric: 50.0,
            co2_per_liter_petrol: Some(2320.0),
            co2_per_liter_diesel: Some(2640.0),
            co2_per_liter_lpg: Some(1640.0),
            co2_per_kg_cng: Some(1990.0),
            co2_per_kwh_electric: Some(420.0),
            petrol_price_per_liter: Some(1.75),
            diesel_price_per_liter: Some(1.65),
            lpg_price_per_liter: Some(0.80),
            cng_price_per_kg: Some(1.10),
            electric_price_per_kwh: Some(0.35),
            co2_per_liter_fuel: Some(2330.0),
            fuel_price_per_liter: Some(1.65),
        }
    }
}

/// Energy carrier a personal calculation is priced and weighted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnergySource {
    Petrol,
    Diesel,
    Lpg,
    Cng,
    Electric,
}

impl EnergySource {
    /// Energy source used for a vehicle's fuel type.
    ///
    /// Hybrids and plug-in hybrids are weighted as petrol.
    pub fn for_fuel(fuel: FuelType) -> Option<Self> {
        match fuel {
            FuelType::Petrol | FuelType::Hybrid | FuelType::PluginHybrid => Some(Self::Petrol),
            FuelType::Diesel => Some(Self::Diesel),
            FuelType::Lpg => Some(Self::Lpg),
            FuelType::Cng => Some(Self::Cng),
            FuelType::Electric => Some(Self::Electric),
            FuelType::Unknown => None,
        }
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnergySource::Petrol => "petrol",
            EnergySource::Diesel => "diesel",
            EnergySource::Lpg => "lpg",
            EnergySource::Cng => "cng",
            EnergySource::Electric => "electric",
        };
        f.write_str(name)
    }
}

/// CO2 and price per unit (liter, kg or kWh) of one energy source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyFactors {
    pub co2_grams_per_unit: f64,
    pub price_per_unit: f64,
}

/// Validated emission settings, loaded once per computation.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionSettings {
    workshops_to_compare: u32,
    co2_per_km_combustion: f64,
    co2_per_km_electric: f64,
    petrol: EnergyFactors,
    diesel: EnergyFactors,
    lpg: EnergyFactors,
    cng: EnergyFactors,
    electric: EnergyFactors,
}

impl EmissionSettings {
    /// Size of the baseline comparison set (N ≥ 1).
    pub fn workshops_to_compare(&self) -> u32 {
        self.workshops_to_compare
    }

    pub fn co2_per_km_combustion(&self) -> f64 {
        self.co2_per_km_combustion
    }

    pub fn co2_per_km_electric(&self) -> f64 {
        self.co2_per_km_electric
    }

    /// Mean of the combustion and electric fleet averages (g/km).
    pub fn fleet_average_co2_per_km(&self) -> f64 {
        (self.co2_per_km_combustion + self.co2_per_km_electric) / 2.0
    }

    pub fn factors(&self, source: EnergySource) -> EnergyFactors {
        match source {
            EnergySource::Petrol => self.petrol,
            EnergySource::Diesel => self.diesel,
            EnergySource::Lpg => self.lpg,
            EnergySource::Cng => self.cng,
            EnergySource::Electric => self.electric,
        }
    }
}

impl TryFrom<&EmissionSettingsDocument> for EmissionSettings {
    type Error = SettingsError;

    fn try_from(doc: &EmissionSettingsDocument) -> Result<Self, Self::Error> {
        if doc.workshops_to_compare < 1 || doc.workshops_to_compare > i64::from(u32::MAX) {
            return Err(SettingsError::InvalidWorkshopsToCompare(
                doc.workshops_to_compare,
            ));
        }

        let co2_per_km_combustion = non_negative("co2_per_km_combustion", doc.co2_per_km_combustion)?;
        let co2_per_km_electric = non_negative("co2_per_km_electric", doc.co2_per_km_electric)?;

        let resolve = |source: EnergySource| -> Result<EnergyFactors, SettingsError> {
            let (co2, price, fallback) = match source {
                EnergySource::Petrol => (doc.co2_per_liter_petrol, doc.petrol_price_per_liter, true),
                EnergySource::Diesel => (doc.co2_per_liter_diesel, doc.diesel_price_per_liter, true),
                EnergySource::Lpg => (doc.co2_per_liter_lpg, doc.lpg_price_per_liter, true),
                EnergySource::Cng => (doc.co2_per_kg_cng, doc.cng_price_per_kg, true),
                EnergySource::Electric => (doc.co2_per_kwh_electric, doc.electric_price_per_kwh, false),
            };

            let (co2, price) = if fallback {
                (
                    co2.or(doc.co2_per_liter_fuel),
                    price.or(doc.fuel_price_per_liter),
                )
            } else {
                (co2, price)
            };

            let co2 = co2.ok_or(SettingsError::MissingFactor {
                energy: source,
                kind: FactorKind::Co2,
            })?;
            let price = price.ok_or(SettingsError::MissingFactor {
                energy: source,
                kind: FactorKind::Price,
            })?;

            Ok(EnergyFactors {
                co2_grams_per_unit: non_negative("co2 factor", co2)?,
                price_per_unit: non_negative("price", price)?,
            })
        };

        Ok(Self {
            workshops_to_compare: doc.workshops_to_compare as u32,
            co2_per_km_combustion,
            co2_per_km_electric,
            petrol: resolve(EnergySource::Petrol)?,
            diesel: resolve(EnergySource::Diesel)?,
            lpg: resolve(EnergySource::Lpg)?,
            cng: resolve(EnergySource::Cng)?,
            electric: resolve(EnergySource::Electric)?,
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SettingsError::InvalidValue { field, value })
    }
}

/// Which per-unit figure is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorKind {
    Co2,
    Price,
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorKind::Co2 => f.write_str("CO2 factor"),
            FactorKind::Price => f.write_str("price"),
        }
    }
}

/// Emission settings are missing or unusable. Fatal for a whole run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Emission settings have not been configured")]
    NotConfigured,

    #[error("workshops_to_compare must be a positive integer, got {0}")]
    InvalidWorkshopsToCompare(i64),

    #[error("No {kind} configured for {energy}")]
    MissingFactor {
        energy: EnergySource,
        kind: FactorKind,
    },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}
