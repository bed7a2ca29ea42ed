//! Bus line types.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Error returned when parsing an invalid line identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line id: {reason}")]
pub struct InvalidLineId {
    reason: &'static str,
}

/// Identifier of a bus line, as published by the line listing.
///
/// Always non-empty and free of surrounding whitespace.
///
/// # Examples
///
/// ```
/// use bus_server::domain::LineId;
///
/// let line = LineId::parse(" 07 ").unwrap();
/// assert_eq!(line.as_str(), "07");
///
/// assert!(LineId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(Arc<str>);

impl LineId {
    /// Parse a line identifier, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidLineId> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidLineId {
                reason: "must not be empty",
            });
        }
        Ok(LineId(Arc::from(trimmed)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.as_str())
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LineId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A bus line: an ordered sequence of stops served by one route.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: LineId,

    /// Display name (e.g. "Line 03").
    pub name: String,

    /// Total operated distance of the line, end to end.
    pub distance_km: f64,

    /// Stop names in operating order.
    pub stop_names: Vec<String>,
}

impl Line {
    /// The name shown to riders, falling back to the id when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    pub fn first_stop(&self) -> Option<&str> {
        self.stop_names.first().map(String::as_str)
    }

    pub fn last_stop(&self) -> Option<&str> {
        self.stop_names.last().map(String::as_str)
    }
}
