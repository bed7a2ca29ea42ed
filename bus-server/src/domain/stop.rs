//! Line-scoped stop types.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::{Coordinates, LineId};

/// Identifier of a line-scoped stop node.
///
/// Derived from the owning line and the 1-based position on that line,
/// so it is unique across the whole network.
///
/// # Examples
///
/// ```
/// use bus_server::domain::{LineId, StopId};
///
/// let line = LineId::parse("07").unwrap();
/// assert_eq!(StopId::new(&line, 3).as_str(), "07_S3");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(Arc<str>);

impl StopId {
    /// Build the id of the stop at `seq` (1-based) on `line`.
    pub fn new(line: &LineId, seq: usize) -> Self {
        StopId(Arc::from(format!("{}_S{}", line, seq)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.as_str())
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StopId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One occurrence of a stop on one line.
///
/// Physically identical stops on different lines are distinct nodes,
/// joined in the network by transfer edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,

    /// Display name as published.
    pub name: String,

    /// Location, when the data source knows it.
    pub coordinates: Option<Coordinates>,

    /// Line this node belongs to.
    pub line_id: LineId,

    /// 1-based position within the line's stop sequence.
    pub seq: usize,

    /// Names of the lines associated with this location.
    /// Only used as fuzzy-matching context.
    pub line_names: Vec<String>,
}
