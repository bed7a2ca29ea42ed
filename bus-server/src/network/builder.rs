//! Network construction from line records.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::{Coordinates, Line, Stop, StopId, normalize_name};
use crate::source::{LineRecord, StopLocation};

use super::graph::{Edge, LineIdx, Network, StopIdx};

/// Split a comma-delimited stop list into trimmed, non-empty names,
/// preserving order.
pub fn split_stop_names(stops: &str) -> Vec<String> {
    stops
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Travel time in minutes for a distance at an average speed.
pub fn travel_time_min(distance_km: f64, avg_speed_kmph: f64) -> f64 {
    if avg_speed_kmph > 0.0 {
        distance_km / avg_speed_kmph * 60.0
    } else {
        0.0
    }
}

/// Builds a [`Network`] from validated line records.
///
/// Segment distances are the line's total distance split evenly over its
/// segments, unless both ends of a segment have known coordinates, in
/// which case the great-circle distance is used.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    avg_speed_kmph: f64,

    /// Known locations keyed by normalized stop name.
    locations: HashMap<String, Coordinates>,
}

impl NetworkBuilder {
    pub fn new(avg_speed_kmph: f64) -> Self {
        Self {
            avg_speed_kmph,
            locations: HashMap::new(),
        }
    }

    /// Attach stop locations. The first location listed for a name wins.
    pub fn with_locations(mut self, locations: &[StopLocation]) -> Self {
        for loc in locations {
            self.locations
                .entry(normalize_name(&loc.name))
                .or_insert_with(|| loc.coordinates());
        }
        self
    }

    /// Build the network. Never fails: an empty or stop-less listing gives
    /// a network with isolated (or no) stops.
    pub fn build(&self, records: &[LineRecord]) -> Network {
        let mut lines: Vec<Line> = Vec::with_capacity(records.len());
        let mut stops: Vec<Stop> = Vec::new();
        let mut stop_lines: Vec<LineIdx> = Vec::new();
        let mut adjacency: Vec<Vec<Edge>> = Vec::new();
        let mut stop_ids = HashMap::new();
        let mut line_ids = HashMap::new();

        // Same-name groups in first-seen order, keyed by normalized name
        let mut groups: Vec<Vec<StopIdx>> = Vec::new();
        let mut group_of: HashMap<String, usize> = HashMap::new();
        let mut stop_group: Vec<usize> = Vec::new();

        for record in records {
            if line_ids.contains_key(&record.id) {
                warn!(line = %record.id, "duplicate line id in listing, skipping");
                continue;
            }

            let line_idx = LineIdx(lines.len());
            let names = split_stop_names(&record.stops);
            let first = stops.len();

            for (i, name) in names.iter().enumerate() {
                let idx = StopIdx(stops.len());
                let key = normalize_name(name);
                let stop = Stop {
                    id: StopId::new(&record.id, i + 1),
                    name: name.clone(),
                    coordinates: self.locations.get(&key).copied(),
                    line_id: record.id.clone(),
                    seq: i + 1,
                    line_names: Vec::new(),
                };

                let group = *group_of.entry(key).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[group].push(idx);
                stop_group.push(group);

                stop_ids.insert(stop.id.clone(), idx);
                stops.push(stop);
                stop_lines.push(line_idx);
                adjacency.push(Vec::new());
            }

            let segment_km = if names.len() > 1 {
                record.distance_km / (names.len() - 1) as f64
            } else {
                0.0
            };

            for k in first..stops.len().saturating_sub(1) {
                let distance_km = match (stops[k].coordinates, stops[k + 1].coordinates) {
                    (Some(a), Some(b)) => a.distance_km(&b),
                    _ => segment_km,
                };
                let time_min = travel_time_min(distance_km, self.avg_speed_kmph);

                adjacency[k].push(Edge {
                    to: StopIdx(k + 1),
                    line: line_idx,
                    distance_km,
                    time_min,
                    transfer: false,
                });
                adjacency[k + 1].push(Edge {
                    to: StopIdx(k),
                    line: line_idx,
                    distance_km,
                    time_min,
                    transfer: false,
                });
            }

            line_ids.insert(record.id.clone(), line_idx);
            lines.push(Line {
                id: record.id.clone(),
                name: record.name.clone(),
                distance_km: record.distance_km,
                stop_names: names,
            });
        }

        // Zero-cost transfer hops between every pair of same-name nodes
        let mut transfer_pairs = 0;
        for group in groups.iter().filter(|g| g.len() > 1) {
            for (i, &a) in group.iter().enumerate() {
                for &b in &group[i + 1..] {
                    adjacency[a.0].push(transfer_edge(b, stop_lines[b.0]));
                    adjacency[b.0].push(transfer_edge(a, stop_lines[a.0]));
                    transfer_pairs += 1;
                }
            }
        }

        // Matching context: every line serving the location, own line first
        for (i, stop) in stops.iter_mut().enumerate() {
            let mut names: Vec<String> = Vec::new();
            let own = std::iter::once(stop_lines[i]);
            let others = groups[stop_group[i]].iter().map(|s| stop_lines[s.0]);
            for line in own.chain(others) {
                let name = lines[line.0].display_name();
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            stop.line_names = names;
        }

        let search_keys = stops
            .iter()
            .map(|s| normalize_name(&format!("{} {}", s.name, s.line_names.join(" "))))
            .collect();

        let lines_at = adjacency
            .iter()
            .map(|edges| {
                let mut seen: Vec<LineIdx> = Vec::new();
                for e in edges {
                    if !seen.contains(&e.line) {
                        seen.push(e.line);
                    }
                }
                seen
            })
            .collect();

        debug!(
            lines = lines.len(),
            stops = stops.len(),
            transfer_pairs,
            "built transit network"
        );

        Network {
            lines,
            stops,
            adjacency,
            lines_at,
            search_keys,
            stop_ids,
            line_ids,
            built_at: Utc::now(),
        }
    }
}

fn transfer_edge(to: StopIdx, line: LineIdx) -> Edge {
    Edge {
        to,
        line,
        distance_km: 0.0,
        time_min: 0.0,
        transfer: true,
    }
}
