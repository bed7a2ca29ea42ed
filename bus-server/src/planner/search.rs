//! A* route search over (stop, line) states.
//!
//! A state is "standing at stop S, on line L". Riding moves along an edge
//! of the current line; changing line stays at S and pays the transfer
//! cost. Each cost profile weighs minutes, kilometres and transfers
//! differently, so the same query can produce different routes.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::{debug, trace};

use crate::domain::StopId;
use crate::network::{LineIdx, Network, StopIdx};

use super::config::{CostProfile, CostWeights, PlannerConfig};

/// Error from route search.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// No bus leaves the origin
    #[error("no bus lines leave {name} ({stop})")]
    NoOutgoingEdges { stop: StopId, name: String },

    /// Frontier exhausted without reaching the destination
    #[error("no route from {from} to {to}")]
    NoRoute { from: StopId, to: StopId },

    /// Search stopped by the expansion bound
    #[error("search abandoned after expanding {limit} states")]
    ExpansionLimit { limit: usize },

    /// Stop index not present in the network
    #[error("unknown stop {index}")]
    UnknownStop { index: StopIdx },
}

/// A search node: a stop and the line the rider is on there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchState {
    pub stop: StopIdx,
    pub line: LineIdx,
}

/// A minimum-cost route found by [`search`].
#[derive(Debug, Clone)]
pub struct Route {
    /// States from origin to destination, inclusive.
    pub states: Vec<SearchState>,

    /// Accumulated cost under the search profile.
    pub cost: f64,

    /// Number of states expanded.
    pub expanded: usize,
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    priority: f64,
    cost: f64,
    state: SearchState,
}

// Reversed so the max-heap pops the lowest priority, then the lowest state.
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.state.cmp(&self.state))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// Find the cheapest route from `start` to `goal` under `profile`.
///
/// Both ends are free at the location level: the search starts on every
/// line serving `start` and stops at the first popped state at `goal` or
/// at any node sharing its name, on any line. Alighting never pays a line
/// change, just as boarding never does.
pub fn search(
    start: StopIdx,
    goal: StopIdx,
    network: &Network,
    profile: CostProfile,
    config: &PlannerConfig,
) -> Result<Route, SearchError> {
    let origin = network
        .stop(start)
        .ok_or(SearchError::UnknownStop { index: start })?;
    let destination = network
        .stop(goal)
        .ok_or(SearchError::UnknownStop { index: goal })?;

    let start_lines = network.lines_at(start);
    if start_lines.is_empty() {
        return Err(SearchError::NoOutgoingEdges {
            stop: origin.id.clone(),
            name: origin.name.clone(),
        });
    }

    let weights = config.weights(profile);
    let transfer_cost = config.transfer_cost(&weights);
    let goal_coords = destination.coordinates;

    // Same-name nodes are exactly the transfer neighbours of the goal
    let goals: Vec<StopIdx> = std::iter::once(goal)
        .chain(
            network
                .edges_from(goal)
                .iter()
                .filter(|e| e.transfer)
                .map(|e| e.to),
        )
        .collect();

    // Great-circle time at top speed never exceeds the riding time left
    let heuristic = |stop: StopIdx| -> f64 {
        match (network.stop(stop).and_then(|s| s.coordinates), goal_coords) {
            (Some(here), Some(there)) if config.max_speed_kmph > 0.0 => {
                weights.time * here.distance_km(&there) / config.max_speed_kmph * 60.0
            }
            _ => 0.0,
        }
    };

    let mut best: HashMap<SearchState, f64> = HashMap::new();
    let mut came_from: HashMap<SearchState, SearchState> = HashMap::new();
    let mut heap = BinaryHeap::new();

    let start_h = heuristic(start);
    for &line in start_lines {
        let state = SearchState { stop: start, line };
        best.insert(state, 0.0);
        heap.push(QueueEntry {
            priority: start_h,
            cost: 0.0,
            state,
        });
    }

    let mut expanded = 0;

    while let Some(QueueEntry { cost, state, .. }) = heap.pop() {
        if best.get(&state).is_some_and(|&known| cost > known) {
            continue;
        }

        if goals.contains(&state.stop) {
            let states = reconstruct(&came_from, state);
            debug!(
                from = %origin.id,
                to = %destination.id,
                %profile,
                cost,
                expanded,
                hops = states.len().saturating_sub(1),
                "route found"
            );
            return Ok(Route {
                states,
                cost,
                expanded,
            });
        }

        if expanded >= config.max_expansions {
            debug!(limit = config.max_expansions, "expansion limit reached");
            return Err(SearchError::ExpansionLimit {
                limit: config.max_expansions,
            });
        }
        expanded += 1;
        trace!(stop = %state.stop, line = state.line.0, cost, "expanding");

        let mut relax = |next: SearchState, next_cost: f64| {
            if best.get(&next).is_none_or(|&known| next_cost < known) {
                best.insert(next, next_cost);
                came_from.insert(next, state);
                heap.push(QueueEntry {
                    priority: next_cost + heuristic(next.stop),
                    cost: next_cost,
                    state: next,
                });
            }
        };

        for edge in network.edges_from(state.stop) {
            if edge.line == state.line {
                let next = SearchState {
                    stop: edge.to,
                    line: state.line,
                };
                relax(next, cost + weights.ride_cost(edge));
            }
        }

        for &line in network.lines_at(state.stop) {
            if line != state.line {
                let next = SearchState {
                    stop: state.stop,
                    line,
                };
                relax(next, cost + transfer_cost);
            }
        }
    }

    Err(SearchError::NoRoute {
        from: origin.id.clone(),
        to: destination.id.clone(),
    })
}

fn reconstruct(came_from: &HashMap<SearchState, SearchState>, goal: SearchState) -> Vec<SearchState> {
    let mut states = vec![goal];
    let mut current = goal;
    // Bounded by the number of recorded predecessors
    while let Some(&prev) = came_from.get(&current) {
        if states.len() > came_from.len() {
            break;
        }
        states.push(prev);
        current = prev;
    }
    states.reverse();
    states
}

/// Recompute the cost of a state sequence transition by transition.
///
/// Returns `None` if two consecutive states are not joined by a ride edge
/// of the current line or a line change at the same stop.
pub fn path_cost(
    states: &[SearchState],
    network: &Network,
    weights: &CostWeights,
    config: &PlannerConfig,
) -> Option<f64> {
    let transfer_cost = config.transfer_cost(weights);
    let mut total = 0.0;

    for pair in states.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if from.stop == to.stop && from.line != to.line {
            total += transfer_cost;
        } else if from.line == to.line {
            let step = network
                .edges_from(from.stop)
                .iter()
                .filter(|e| e.to == to.stop && e.line == from.line)
                .map(|e| weights.ride_cost(e))
                .min_by(f64::total_cmp)?;
            total += step;
        } else {
            return None;
        }
    }

    Some(total)
}
