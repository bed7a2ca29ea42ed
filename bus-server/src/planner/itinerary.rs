//! Turning a state sequence into rider-facing segments.

use crate::domain::{LineId, StopId};
use crate::network::{LineIdx, Network, StopIdx};

use super::search::SearchState;

/// One ride on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct ItinerarySegment {
    pub line_id: LineId,
    pub line_name: String,
    pub from: String,
    pub to: String,
    /// Stop nodes visited, boarding and alighting included.
    pub stop_ids: Vec<StopId>,
    pub distance_km: f64,
    pub duration_min: f64,
    /// Ride hops (stops travelled).
    pub hops: usize,
    pub instruction: String,
}

/// Totals over a whole trip.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TripSummary {
    pub stops: usize,
    pub distance_km: f64,
    pub duration_min: f64,
    pub transfers: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Itinerary {
    pub segments: Vec<ItinerarySegment>,
    pub summary: TripSummary,
}

/// A segment while it is being accumulated.
struct OpenSegment {
    line: LineIdx,
    boarding: StopIdx,
    stops: Vec<StopIdx>,
    distance_km: f64,
    duration_min: f64,
    hops: usize,
}

impl OpenSegment {
    fn start(state: SearchState) -> Self {
        Self {
            line: state.line,
            boarding: state.stop,
            stops: vec![state.stop],
            distance_km: 0.0,
            duration_min: 0.0,
            hops: 0,
        }
    }
}

/// Group a route's states into per-line segments and total them up.
///
/// A hop along a transfer edge moves the rider to a same-name node without
/// counting as a stop; segments without any ride hop are dropped.
pub fn format_itinerary(states: &[SearchState], network: &Network) -> Itinerary {
    let Some(&first) = states.first() else {
        return Itinerary::default();
    };

    let mut closed: Vec<OpenSegment> = Vec::new();
    let mut open = OpenSegment::start(first);

    for pair in states.windows(2) {
        let (from, to) = (pair[0], pair[1]);

        if from.line != to.line {
            closed.push(std::mem::replace(&mut open, OpenSegment::start(to)));
            continue;
        }

        match network.cheapest_edge(from.stop, to.stop, from.line) {
            Some(edge) if edge.transfer => {
                if let Some(last) = open.stops.last_mut() {
                    *last = to.stop;
                }
                if open.hops == 0 {
                    open.boarding = to.stop;
                }
            }
            edge => {
                open.stops.push(to.stop);
                open.hops += 1;
                if let Some(edge) = edge {
                    open.distance_km += edge.distance_km;
                    open.duration_min += edge.time_min;
                }
            }
        }
    }
    closed.push(open);

    let mut segments = Vec::new();
    let mut summary = TripSummary::default();

    for seg in closed.into_iter().filter(|s| s.hops > 0) {
        let (line_id, line_name) = match network.line(seg.line) {
            Some(line) => (line.id.clone(), line.display_name().to_string()),
            None => continue,
        };
        let stop_name = |idx: StopIdx| {
            network
                .stop(idx)
                .map(|s| s.name.clone())
                .unwrap_or_default()
        };
        let from = stop_name(seg.boarding);
        let to = stop_name(seg.stops.last().copied().unwrap_or(seg.boarding));

        let instruction = if segments.is_empty() {
            format!("Take Line {} from {} to {}", line_name, from, to)
        } else {
            format!(
                "Transfer to Line {} at {}, then continue to {}",
                line_name, from, to
            )
        };

        summary.stops += seg.hops;
        summary.distance_km += seg.distance_km;
        summary.duration_min += seg.duration_min;

        segments.push(ItinerarySegment {
            line_id,
            line_name,
            from,
            to,
            stop_ids: seg
                .stops
                .iter()
                .filter_map(|&s| network.stop(s).map(|stop| stop.id.clone()))
                .collect(),
            distance_km: seg.distance_km,
            duration_min: seg.duration_min,
            hops: seg.hops,
            instruction,
        });
    }

    summary.transfers = segments.len().saturating_sub(1);
    Itinerary { segments, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use crate::source::LineRecord;

    fn record(id: &str, name: &str, km: f64, stops: &str) -> LineRecord {
        LineRecord {
            id: LineId::parse(id).unwrap(),
            name: name.to_string(),
            distance_km: km,
            stops: stops.to_string(),
        }
    }

    fn network() -> Network {
        NetworkBuilder::new(18.0).build(&[
            record("1", "1", 10.0, "Freedom Park, National Road No 5, Central Market"),
            record("2", "2", 8.0, "Central Market, Wat Phnom, Borey Santepheap 2"),
        ])
    }

    fn state(stop: usize, line: usize) -> SearchState {
        SearchState {
            stop: StopIdx(stop),
            line: LineIdx(line),
        }
    }

    #[test]
    fn two_segments_with_one_transfer() {
        let network = network();
        // 0..=2 on line 1, 3..=5 on line 2; 2 and 3 are both Central Market
        let states = vec![
            state(0, 0),
            state(1, 0),
            state(2, 0),
            state(2, 1),
            state(3, 1),
            state(4, 1),
            state(5, 1),
        ];
        let itinerary = format_itinerary(&states, &network);

        assert_eq!(itinerary.segments.len(), 2);
        let first = &itinerary.segments[0];
        assert_eq!(first.instruction, "Take Line 1 from Freedom Park to Central Market");
        assert_eq!(first.hops, 2);
        assert!((first.distance_km - 10.0).abs() < 1e-9);
        assert_eq!(
            first.stop_ids.iter().map(StopId::as_str).collect::<Vec<_>>(),
            vec!["1_S1", "1_S2", "1_S3"]
        );

        let second = &itinerary.segments[1];
        assert_eq!(
            second.instruction,
            "Transfer to Line 2 at Central Market, then continue to Borey Santepheap 2"
        );
        // The transfer hop moved boarding to line 2's own Central Market node
        assert_eq!(
            second.stop_ids.iter().map(StopId::as_str).collect::<Vec<_>>(),
            vec!["2_S1", "2_S2", "2_S3"]
        );
        assert_eq!(second.hops, 2);
        assert!((second.distance_km - 8.0).abs() < 1e-9);

        let summary = itinerary.summary;
        assert_eq!(summary.stops, 4);
        assert_eq!(summary.transfers, 1);
        assert!((summary.distance_km - 18.0).abs() < 1e-9);
        assert!((summary.duration_min - 60.0).abs() < 1e-9);
    }

    #[test]
    fn single_state_has_no_segments() {
        let itinerary = format_itinerary(&[state(1, 0)], &network());
        assert!(itinerary.segments.is_empty());
        assert_eq!(itinerary.summary, TripSummary::default());
    }

    #[test]
    fn empty_route() {
        assert_eq!(format_itinerary(&[], &network()), Itinerary::default());
    }

    #[test]
    fn trailing_transfer_hop_adds_no_segment() {
        let network = network();
        let states = vec![state(0, 0), state(1, 0), state(2, 0), state(2, 1), state(3, 1)];
        let itinerary = format_itinerary(&states, &network);

        assert_eq!(itinerary.segments.len(), 1);
        assert_eq!(itinerary.summary.transfers, 0);
        assert_eq!(itinerary.summary.stops, 2);
    }

    #[test]
    fn line_name_falls_back_to_id() {
        let network = NetworkBuilder::new(18.0).build(&[record("7", "", 3.0, "A, B")]);
        let itinerary = format_itinerary(&[state(0, 0), state(1, 0)], &network);
        assert_eq!(itinerary.segments[0].instruction, "Take Line 7 from A to B");
        assert_eq!(itinerary.segments[0].line_name, "7");
    }
}
