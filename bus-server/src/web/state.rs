//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::NetworkCache;
use crate::planner::PlannerConfig;
use crate::source::DataSource;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Lazily built transit network
    pub network: Arc<NetworkCache<DataSource>>,

    /// Search, speed and fare settings
    pub config: Arc<PlannerConfig>,
}

impl AppState {
    pub fn new(network: Arc<NetworkCache<DataSource>>, config: PlannerConfig) -> Self {
        Self {
            network,
            config: Arc::new(config),
        }
    }
}
