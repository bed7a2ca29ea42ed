//! Web layer for the bus trip planner.
//!
//! Provides HTTP endpoints for planning trips and looking up stop names.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
