//! Domain types for the bus route planner.
//!
//! Lines and line-scoped stops as loaded from the line listing. Identifiers
//! enforce their invariants at construction time, so code that receives
//! them can trust their validity.

mod geo;
mod line;
mod name;
mod stop;

pub use geo::Coordinates;
pub use line::{InvalidLineId, Line, LineId};
pub use name::normalize_name;
pub use stop::{Stop, StopId};
