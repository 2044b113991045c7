// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance between validated coordinates.

use crate::models::GeoPoint;
use geo::{Distance, Haversine};

/// Mean Earth radius in km (IUGG), same radius geo's haversine uses.
const MEAN_EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let meters = Haversine.distance(geo::Point::from(a), geo::Point::from(b));
    let km = meters / 1000.0;

    // Rounding can push the haversine term just past 1 for antipodal points.
    if km.is_nan() {
        std::f64::consts::PI * MEAN_EARTH_RADIUS_KM
    } else {
        km
    }
}
