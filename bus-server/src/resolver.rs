//! Free-text stop resolution.
//!
//! Matching is a plain text comparison on normalized strings: a stop's
//! matching key is its name followed by the names of the lines serving it.
//! There is no geocoding and no edit-distance matching, so "central mkt"
//! does not find "Central Market".

use std::collections::HashMap;

use crate::domain::normalize_name;
use crate::network::{Network, StopIdx};

/// Score of an exact normalized match.
pub const EXACT_SCORE: u32 = 100;

/// Upper bound for a substring match, so it never ties with an exact one.
const MAX_SUBSTRING_SCORE: u32 = 99;

/// Score a normalized query against a normalized candidate key.
///
/// Exact match scores 100; containment scores the query's length in
/// characters, capped at 99; anything else scores 0.
pub fn match_score(query: &str, key: &str) -> u32 {
    if query == key {
        EXACT_SCORE
    } else if key.contains(query) {
        let len = u32::try_from(query.chars().count()).unwrap_or(u32::MAX);
        len.min(MAX_SUBSTRING_SCORE)
    } else {
        0
    }
}

/// Resolve a free-text query to the best-matching stop node.
///
/// Ties go to the first stop in build order. Returns `None` for an empty
/// query or when nothing scores above zero.
pub fn resolve_stop(query: &str, network: &Network) -> Option<StopIdx> {
    let query = normalize_name(query);
    if query.is_empty() {
        return None;
    }

    let mut best: Option<(StopIdx, u32)> = None;
    for (idx, _) in network.iter_stops() {
        let Some(key) = network.search_key(idx) else {
            continue;
        };
        let score = match_score(&query, key);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((idx, score));
            if score == EXACT_SCORE {
                break;
            }
        }
    }
    best.map(|(idx, _)| idx)
}

/// A distinct stop name and the lines serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopNameMatch {
    pub name: String,
    pub lines: Vec<String>,
}

/// List distinct stop names containing the query, in build order.
///
/// Names are compared after normalization, so "Psar Thmei" and
/// "psar  thmei" are one entry, shown with the first spelling seen.
/// An empty query lists every stop name.
pub fn search_stop_names(query: &str, network: &Network, limit: usize) -> Vec<StopNameMatch> {
    let query = normalize_name(query);
    let mut matches: Vec<StopNameMatch> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (_, stop) in network.iter_stops() {
        let key = normalize_name(&stop.name);
        if !key.contains(&query) {
            continue;
        }

        let slot = match seen.get(&key) {
            Some(&i) => i,
            None => {
                if matches.len() >= limit {
                    continue;
                }
                seen.insert(key, matches.len());
                matches.push(StopNameMatch {
                    name: stop.name.clone(),
                    lines: Vec::new(),
                });
                matches.len() - 1
            }
        };

        let lines = &mut matches[slot].lines;
        for name in &stop.line_names {
            if !lines.contains(name) {
                lines.push(name.clone());
            }
        }
    }

    matches
}
