// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod candidates;
pub mod counterfactual;
pub mod distance;
pub mod emission;
pub mod nearest;
pub mod savings;

pub use candidates::{Candidate, CandidateSet};
pub use counterfactual::{ChosenWorkshop, ComparisonSet};
pub use nearest::RankedWorkshop;
pub use savings::{CalculationContext, EstimateOutcome, SavingsService};
