//! The transit network graph.
//!
//! Every (line, position) pair is its own node, so the same physical stop
//! served by three lines appears three times. Consecutive stops of a line
//! are joined by ride edges in both directions; nodes sharing a stop name
//! are joined by zero-cost transfer edges.

mod builder;
mod graph;

pub use builder::{NetworkBuilder, split_stop_names, travel_time_min};
pub use graph::{Edge, LineIdx, Network, StopIdx};
