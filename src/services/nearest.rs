// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! K-nearest workshop lookup.

use crate::models::GeoPoint;
use crate::services::candidates::Candidate;
use crate::services::distance::distance_km;
use std::cmp::Ordering;

/// A workshop annotated with its one-way distance from the requester.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedWorkshop {
    pub workshop_id: String,
    pub distance_km: f64,
}

impl RankedWorkshop {
    /// Ascending by distance, ties broken by workshop ID.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.distance_km
            .total_cmp(&other.distance_km)
            .then_with(|| self.workshop_id.cmp(&other.workshop_id))
    }
}

/// The `k` candidates closest to `reference`, nearest first.
///
/// Returns every candidate when fewer than `k` exist.
pub fn nearest(reference: GeoPoint, candidates: &[Candidate], k: usize) -> Vec<RankedWorkshop> {
    if k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<RankedWorkshop> = candidates
        .iter()
        .map(|c| RankedWorkshop {
            workshop_id: c.workshop_id.clone(),
            distance_km: distance_km(reference, c.location),
        })
        .collect();

    if ranked.len() > k {
        // Partition so the first k are the smallest, then only sort those.
        ranked.select_nth_unstable_by(k - 1, RankedWorkshop::rank_cmp);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(RankedWorkshop::rank_cmp);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, lat: f64, lon: f64) -> Candidate {
        Candidate {
            workshop_id: id.to_string(),
            location: GeoPoint::new(lat, lon).unwrap(),
        }
    }

    fn origin() -> GeoPoint {
        GeoPoint::new(48.7758, 9.1829).unwrap()
    }

    #[test]
    fn test_returns_k_nearest_ascending() {
        let candidates = vec![
            candidate("far", 48.95, 9.18),
            candidate("near", 48.78, 9.19),
            candidate("mid", 48.85, 9.18),
            candidate("farthest", 49.50, 9.18),
        ];

        let result = nearest(origin(), &candidates, 2);

        let ids: Vec<&str> = result.iter().map(|r| r.workshop_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(result[0].distance_km <= result[1].distance_km);
    }

    #[test]
    fn test_fewer_than_k_returns_all() {
        let candidates = vec![candidate("b", 48.80, 9.18), candidate("a", 48.79, 9.18)];
        let result = nearest(origin(), &candidates, 5);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].workshop_id, "a");
    }

    #[test]
    fn test_ties_broken_by_id() {
        // Same location, so identical distances.
        let candidates = vec![
            candidate("w-3", 48.80, 9.18),
            candidate("w-1", 48.80, 9.18),
            candidate("w-2", 48.80, 9.18),
        ];

        let first = nearest(origin(), &candidates, 2);
        let ids: Vec<&str> = first.iter().map(|r| r.workshop_id.as_str()).collect();
        assert_eq!(ids, vec!["w-1", "w-2"]);

        let mut reversed = candidates.clone();
        reversed.reverse();
        assert_eq!(nearest(origin(), &reversed, 2), first);
    }

    #[test]
    fn test_repeatable_output() {
        let candidates: Vec<Candidate> = (0..200)
            .map(|i| {
                let offset = (i % 17) as f64 * 0.01;
                candidate(&format!("w-{:03}", i), 48.7 + offset, 9.1 + offset)
            })
            .collect();

        let a = nearest(origin(), &candidates, 10);
        let b = nearest(origin(), &candidates, 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.windows(2).all(|w| w[0].rank_cmp(&w[1]) == Ordering::Less));
        assert!(a
            .iter()
            .all(|r| candidates.iter().any(|c| c.workshop_id == r.workshop_id)));
    }

    #[test]
    fn test_zero_k_and_empty_candidates() {
        assert!(nearest(origin(), &[candidate("a", 48.8, 9.2)], 0).is_empty());
        assert!(nearest(origin(), &[], 3).is_empty());
    }
}
