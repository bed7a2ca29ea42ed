//! Bus trip planner.
//!
//! Answers "how do I get from this stop to that one?" with an A* search
//! over (stop, line) states. The route is grouped into one segment per
//! line ridden and priced at a flat fare per boarding.

mod config;
mod itinerary;
mod plan;
mod search;


pub use config::{CostProfile, CostWeights, PlannerConfig};
pub use itinerary::{Itinerary, ItinerarySegment, TripSummary, format_itinerary};
pub use plan::{PlanError, TripPlan, plan_trip};
pub use search::{Route, SearchError, SearchState, path_cost, search};
