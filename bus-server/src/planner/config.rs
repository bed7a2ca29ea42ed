//! Cost profiles and planner configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::network::Edge;

/// What the rider wants to optimize for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostProfile {
    Fast,
    FewTransfers,
    #[default]
    Balanced,
}

impl CostProfile {
    pub const ALL: [CostProfile; 3] = [
        CostProfile::Fast,
        CostProfile::FewTransfers,
        CostProfile::Balanced,
    ];

    /// Parse a profile name as used in query strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(CostProfile::Fast),
            "few_transfers" => Some(CostProfile::FewTransfers),
            "balanced" => Some(CostProfile::Balanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CostProfile::Fast => "fast",
            CostProfile::FewTransfers => "few_transfers",
            CostProfile::Balanced => "balanced",
        }
    }
}

impl fmt::Display for CostProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weights applied to minutes, transfers and kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    pub time: f64,
    pub transfer: f64,
    pub distance: f64,
}

impl CostWeights {
    pub const fn new(time: f64, transfer: f64, distance: f64) -> Self {
        Self {
            time,
            transfer,
            distance,
        }
    }

    /// Cost of riding along an edge.
    pub fn ride_cost(&self, edge: &Edge) -> f64 {
        self.time * edge.time_min + self.distance * edge.distance_km
    }
}

/// Configuration for graph building, search and fares.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Average bus speed used to derive segment times (km/h).
    pub avg_speed_kmph: f64,

    /// Top bus speed used by the search heuristic (km/h).
    /// Must not be below any speed implied by the edge times.
    pub max_speed_kmph: f64,

    /// Fixed time charged for changing lines (minutes).
    pub transfer_penalty_min: f64,

    /// Expected wait for the next bus after a change (minutes).
    pub wait_time_min: f64,

    /// Flat fare per boarding (riel).
    pub fare_riel: u32,

    /// States popped before the search gives up.
    pub max_expansions: usize,

    pub fast: CostWeights,
    pub few_transfers: CostWeights,
    pub balanced: CostWeights,
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_avg_speed(mut self, kmph: f64) -> Self {
        self.avg_speed_kmph = kmph;
        self
    }

    pub fn with_max_speed(mut self, kmph: f64) -> Self {
        self.max_speed_kmph = kmph;
        self
    }

    pub fn with_transfer_penalty(mut self, minutes: f64) -> Self {
        self.transfer_penalty_min = minutes;
        self
    }

    pub fn with_wait_time(mut self, minutes: f64) -> Self {
        self.wait_time_min = minutes;
        self
    }

    pub fn with_fare(mut self, riel: u32) -> Self {
        self.fare_riel = riel;
        self
    }

    pub fn with_max_expansions(mut self, n: usize) -> Self {
        self.max_expansions = n;
        self
    }

    pub fn with_weights(mut self, profile: CostProfile, weights: CostWeights) -> Self {
        match profile {
            CostProfile::Fast => self.fast = weights,
            CostProfile::FewTransfers => self.few_transfers = weights,
            CostProfile::Balanced => self.balanced = weights,
        }
        self
    }

    pub fn weights(&self, profile: CostProfile) -> CostWeights {
        match profile {
            CostProfile::Fast => self.fast,
            CostProfile::FewTransfers => self.few_transfers,
            CostProfile::Balanced => self.balanced,
        }
    }

    /// Cost of changing line at a stop.
    pub fn transfer_cost(&self, weights: &CostWeights) -> f64 {
        weights.time * (self.transfer_penalty_min + self.wait_time_min) + weights.transfer
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            avg_speed_kmph: 18.0,
            max_speed_kmph: 60.0,
            transfer_penalty_min: 6.0,
            wait_time_min: 5.0,
            fare_riel: 1500,
            max_expansions: 200_000,
            fast: CostWeights::new(1.0, 0.1, 0.05),
            few_transfers: CostWeights::new(0.6, 3.0, 0.05),
            balanced: CostWeights::new(1.0, 1.0, 0.05),
        }
    }
}
