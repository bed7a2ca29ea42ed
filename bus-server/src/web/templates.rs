//! Askama templates for the web frontend.

use askama::Template;

use crate::planner::{CostProfile, TripPlan};

use super::dto::round_to;

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page with the trip search form.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub profiles: Vec<ProfileOption>,
}

impl IndexTemplate {
    pub fn new() -> Self {
        let profiles = CostProfile::ALL
            .into_iter()
            .map(|p| ProfileOption {
                value: p.as_str(),
                label: profile_label(p),
                selected: p == CostProfile::default(),
            })
            .collect();
        Self { profiles }
    }
}

impl Default for IndexTemplate {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Fragment Templates (AJAX responses, no base.html)
// ============================================================================

/// Planned trip fragment.
#[derive(Template)]
#[template(path = "itinerary.html")]
pub struct ItineraryTemplate {
    pub trip: TripView,
}

/// Planner failure fragment.
#[derive(Template)]
#[template(path = "plan_error.html")]
pub struct PlanErrorTemplate {
    pub message: String,
    pub details: Option<String>,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// An option of the cost profile selector.
#[derive(Debug, Clone)]
pub struct ProfileOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn profile_label(profile: CostProfile) -> &'static str {
    match profile {
        CostProfile::Fast => "Fastest",
        CostProfile::FewTransfers => "Fewest transfers",
        CostProfile::Balanced => "Balanced",
    }
}

/// Trip view model.
#[derive(Debug, Clone)]
pub struct TripView {
    pub from: String,
    pub to: String,
    pub profile: &'static str,
    pub distance_km: String,
    pub eta_min: i64,
    pub stops: usize,
    pub transfers: usize,
    pub fare_riel: String,
    pub steps: Vec<StepView>,
}

impl TripView {
    pub fn from_plan(plan: &TripPlan) -> Self {
        let summary = &plan.itinerary.summary;
        Self {
            from: plan.from.clone(),
            to: plan.to.clone(),
            profile: profile_label(plan.profile),
            distance_km: format!("{:.2}", round_to(summary.distance_km, 2)),
            eta_min: summary.duration_min.round() as i64,
            stops: summary.stops,
            transfers: summary.transfers,
            fare_riel: group_thousands(plan.fare_riel),
            steps: plan
                .itinerary
                .segments
                .iter()
                .map(|s| StepView {
                    line_name: s.line_name.clone(),
                    instruction: s.instruction.clone(),
                    hops: s.hops,
                    distance_km: format!("{:.1}", s.distance_km),
                    eta_min: s.duration_min.round() as i64,
                })
                .collect(),
        }
    }

    /// "Already there" when origin and destination are the same stop.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Step view model.
#[derive(Debug, Clone)]
pub struct StepView {
    pub line_name: String,
    pub instruction: String,
    pub hops: usize,
    pub distance_km: String,
    pub eta_min: i64,
}

impl StepView {
    /// "1 stop" / "3 stops".
    pub fn hops_label(&self) -> String {
        if self.hops == 1 {
            "1 stop".to_string()
        } else {
            format!("{} stops", self.hops)
        }
    }
}

/// Format an amount with comma thousands separators, e.g. 10,500.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
