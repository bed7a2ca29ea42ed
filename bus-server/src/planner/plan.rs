//! End-to-end trip planning: resolve, search, format, price.

use tracing::debug;

use crate::domain::StopId;
use crate::network::Network;
use crate::resolver::resolve_stop;

use super::config::{CostProfile, PlannerConfig};
use super::itinerary::{Itinerary, format_itinerary};
use super::search::{SearchError, search};

/// Error from trip planning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// One or both endpoints matched no stop. Carries the stop names that
    /// did resolve.
    #[error("could not resolve origin or destination")]
    Unresolved {
        from: Option<String>,
        to: Option<String>,
    },

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// A planned trip.
#[derive(Debug, Clone)]
pub struct TripPlan {
    /// Resolved origin stop name.
    pub from: String,
    /// Resolved destination stop name.
    pub to: String,
    pub from_stop: StopId,
    pub to_stop: StopId,
    pub profile: CostProfile,
    pub itinerary: Itinerary,
    pub boardings: usize,
    pub fare_riel: u64,
    /// Search cost under `profile`.
    pub cost: f64,
}

/// Plan a trip between two free-text stop queries.
pub fn plan_trip(
    network: &Network,
    from: &str,
    to: &str,
    profile: CostProfile,
    config: &PlannerConfig,
) -> Result<TripPlan, PlanError> {
    let origin = resolve_stop(from, network).and_then(|idx| Some((idx, network.stop(idx)?)));
    let destination = resolve_stop(to, network).and_then(|idx| Some((idx, network.stop(idx)?)));

    let (Some((start, origin)), Some((goal, destination))) = (origin, destination) else {
        debug!(from, to, "unresolved endpoint");
        return Err(PlanError::Unresolved {
            from: origin.map(|(_, s)| s.name.clone()),
            to: destination.map(|(_, s)| s.name.clone()),
        });
    };

    let route = search(start, goal, network, profile, config)?;
    let itinerary = format_itinerary(&route.states, network);

    let boardings = itinerary.summary.transfers + 1;
    let fare_riel = boardings as u64 * u64::from(config.fare_riel);

    Ok(TripPlan {
        from: origin.name.clone(),
        to: destination.name.clone(),
        from_stop: origin.id.clone(),
        to_stop: destination.id.clone(),
        profile,
        itinerary,
        boardings,
        fare_riel,
        cost: route.cost,
    })
}
