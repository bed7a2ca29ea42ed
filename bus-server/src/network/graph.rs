//! The built transit network.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{Line, LineId, Stop, StopId};

/// Dense index of a stop node within a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIdx(pub usize);

/// Dense index of a line within a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineIdx(pub usize);

impl fmt::Display for StopIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directed edge.
///
/// Always stored with its mirror. A transfer edge joins two nodes sharing
/// a stop name and belongs to the line of its destination node.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub to: StopIdx,
    pub line: LineIdx,
    pub distance_km: f64,
    pub time_min: f64,
    pub transfer: bool,
}

/// Immutable transit network: lines, line-scoped stops, and the
/// adjacency list between them.
///
/// Built once per data load by [`NetworkBuilder`](super::NetworkBuilder)
/// and shared read-only between requests. A rebuild produces a whole new
/// `Network`; nothing here is ever patched in place.
#[derive(Debug)]
pub struct Network {
    pub(super) lines: Vec<Line>,
    pub(super) stops: Vec<Stop>,
    pub(super) adjacency: Vec<Vec<Edge>>,

    /// Distinct line indices of each stop's outgoing edges, first-seen order.
    pub(super) lines_at: Vec<Vec<LineIdx>>,

    /// Normalized "<stop name> <line names>" strings used by the resolver.
    pub(super) search_keys: Vec<String>,

    pub(super) stop_ids: HashMap<StopId, StopIdx>,
    pub(super) line_ids: HashMap<LineId, LineIdx>,
    pub(super) built_at: DateTime<Utc>,
}

impl Network {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn line(&self, idx: LineIdx) -> Option<&Line> {
        self.lines.get(idx.0)
    }

    pub fn stop(&self, idx: StopIdx) -> Option<&Stop> {
        self.stops.get(idx.0)
    }

    /// Look up a stop by its public id.
    pub fn stop_index(&self, id: &StopId) -> Option<StopIdx> {
        self.stop_ids.get(id).copied()
    }

    /// Look up a line by its public id.
    pub fn line_index(&self, id: &LineId) -> Option<LineIdx> {
        self.line_ids.get(id).copied()
    }

    /// Iterate over all stops with their indices, in build order.
    pub fn iter_stops(&self) -> impl Iterator<Item = (StopIdx, &Stop)> {
        self.stops.iter().enumerate().map(|(i, s)| (StopIdx(i), s))
    }

    /// Outgoing edges of a stop (empty for unknown stops).
    pub fn edges_from(&self, stop: StopIdx) -> &[Edge] {
        self.adjacency.get(stop.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct lines reachable directly from a stop, including lines
    /// reached through transfer edges.
    pub fn lines_at(&self, stop: StopIdx) -> &[LineIdx] {
        self.lines_at.get(stop.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Normalized matching key of a stop.
    pub fn search_key(&self, stop: StopIdx) -> Option<&str> {
        self.search_keys.get(stop.0).map(String::as_str)
    }

    /// The cheapest edge from `from` to `to` owned by `line`.
    ///
    /// Parallel edges only arise where a line lists the same stop name
    /// twice in a row; the zero-cost transfer hop then wins.
    pub fn cheapest_edge(&self, from: StopIdx, to: StopIdx, line: LineIdx) -> Option<&Edge> {
        self.edges_from(from)
            .iter()
            .filter(|e| e.to == to && e.line == line)
            .min_by(|a, b| {
                a.time_min
                    .total_cmp(&b.time_min)
                    .then_with(|| a.distance_km.total_cmp(&b.distance_km))
            })
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// When this network was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}
