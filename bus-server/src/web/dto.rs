//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::Network;
use crate::planner::{CostProfile, ItinerarySegment, TripPlan};
use crate::resolver::StopNameMatch;

/// Query string of the planner endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PlannerQuery {
    /// Free-text origin
    pub from: Option<String>,

    /// Free-text destination
    pub to: Option<String>,

    /// Cost profile name, `balanced` if absent or unknown
    pub opt: Option<String>,
}

/// The request as understood by the planner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEcho {
    pub from: String,
    pub to: String,
    pub resolved_from: String,
    pub resolved_to: String,
    pub optimize_for: CostProfile,
}

/// Trip totals.
#[derive(Debug, Serialize)]
pub struct SummaryResult {
    pub stops: usize,
    pub distance_km: f64,
    pub eta_min: i64,
    pub transfers: usize,
    pub boardings: usize,
    pub fare_riel: u64,
}

/// One ride on one line.
#[derive(Debug, Serialize)]
pub struct StepResult {
    pub line_id: String,
    pub line_name: String,
    pub from: String,
    pub to: String,
    pub stop_ids: Vec<String>,
    pub distance_km: f64,
    pub eta_min: i64,
    pub instruction: String,
}

/// Successful planner response.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub query: QueryEcho,
    pub summary: SummaryResult,
    pub steps: Vec<StepResult>,
}

/// Query string of the stop search endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StopSearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// A stop name in search results.
#[derive(Debug, Serialize)]
pub struct StopRecord {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSearchResponse {
    pub success: bool,
    pub total_results: usize,
    pub records: Vec<StopRecord>,
}

/// Result of a forced network rebuild.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub lines: usize,
    pub stops: usize,
    pub edges: usize,
    pub built_at: DateTime<Utc>,
}

/// Error response.
///
/// Only `message` is always present; the other fields depend on the error.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_resolved: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_resolved: Option<String>,

    /// Origin stop that has no outgoing edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,

    /// Underlying error detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// Conversion implementations

/// Round to a number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round minutes to whole minutes.
fn whole_minutes(minutes: f64) -> i64 {
    minutes.round() as i64
}

impl StepResult {
    pub fn from_segment(segment: &ItinerarySegment) -> Self {
        Self {
            line_id: segment.line_id.to_string(),
            line_name: segment.line_name.clone(),
            from: segment.from.clone(),
            to: segment.to.clone(),
            stop_ids: segment.stop_ids.iter().map(ToString::to_string).collect(),
            distance_km: round_to(segment.distance_km, 3),
            eta_min: whole_minutes(segment.duration_min),
            instruction: segment.instruction.clone(),
        }
    }
}

impl PlanResponse {
    /// Build the response for a plan, echoing the raw query texts.
    pub fn from_plan(plan: &TripPlan, from: &str, to: &str) -> Self {
        let summary = &plan.itinerary.summary;
        Self {
            query: QueryEcho {
                from: from.to_string(),
                to: to.to_string(),
                resolved_from: plan.from.clone(),
                resolved_to: plan.to.clone(),
                optimize_for: plan.profile,
            },
            summary: SummaryResult {
                stops: summary.stops,
                distance_km: round_to(summary.distance_km, 2),
                eta_min: whole_minutes(summary.duration_min),
                transfers: summary.transfers,
                boardings: plan.boardings,
                fare_riel: plan.fare_riel,
            },
            steps: plan
                .itinerary
                .segments
                .iter()
                .map(StepResult::from_segment)
                .collect(),
        }
    }
}

impl StopSearchResponse {
    pub fn from_matches(matches: Vec<StopNameMatch>) -> Self {
        let records: Vec<StopRecord> = matches
            .into_iter()
            .map(|m| StopRecord {
                name: m.name,
                lines: m.lines,
            })
            .collect();
        Self {
            success: true,
            total_results: records.len(),
            records,
        }
    }
}

impl RefreshResponse {
    pub fn from_network(network: &Network) -> Self {
        Self {
            lines: network.line_count(),
            stops: network.stop_count(),
            edges: network.edge_count(),
            built_at: network.built_at(),
        }
    }
}
