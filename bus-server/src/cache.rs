//! Process-wide cache of the built transit network.
//!
//! The network is expensive to build (a paged upstream fetch plus graph
//! construction) and identical for every request, so one copy is shared
//! behind an `Arc`. Rebuilds produce a new `Network` and swap the
//! reference; readers holding the old one keep using it undisturbed.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::network::{Network, NetworkBuilder};
use crate::source::{LineSource, SourceError};

/// Default interval between background rebuilds (24 hours).
const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the network cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How often the background task rebuilds the network.
    pub refresh_interval: Duration,
}

impl CacheConfig {
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Lazily built, shared transit network.
pub struct NetworkCache<S> {
    source: S,
    avg_speed_kmph: f64,
    refresh_interval: Duration,
    // Single entry keyed by ()
    network: MokaCache<(), Arc<Network>>,
}

impl<S: LineSource + Send + Sync + 'static> NetworkCache<S> {
    /// Create an empty cache. Nothing is fetched until first use.
    pub fn new(source: S, avg_speed_kmph: f64, config: &CacheConfig) -> Self {
        Self {
            source,
            avg_speed_kmph,
            refresh_interval: config.refresh_interval,
            network: MokaCache::builder().initial_capacity(1).build(),
        }
    }

    /// The line source backing this cache.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get the network, building it on first use.
    ///
    /// Concurrent first callers wait on a single build. A failed build is
    /// not cached; the next call tries again.
    pub async fn get(&self) -> Result<Arc<Network>, Arc<SourceError>> {
        self.network.try_get_with((), self.build()).await
    }

    /// The cached network, if one has been built.
    pub async fn current(&self) -> Option<Arc<Network>> {
        self.network.get(&()).await
    }

    /// Rebuild from the source and swap the result in.
    ///
    /// On failure the previously cached network stays in place.
    pub async fn refresh(&self) -> Result<Arc<Network>, SourceError> {
        match self.build().await {
            Ok(network) => {
                self.network.insert((), network.clone()).await;
                Ok(network)
            }
            Err(e) => {
                warn!(error = %e, "network refresh failed, keeping previous network");
                Err(e)
            }
        }
    }

    /// Drop the cached network; the next `get` rebuilds it.
    pub async fn invalidate(&self) {
        self.network.invalidate(&()).await;
    }

    async fn build(&self) -> Result<Arc<Network>, SourceError> {
        let listing = self.source.fetch_lines().await?;
        let network = NetworkBuilder::new(self.avg_speed_kmph)
            .with_locations(&listing.locations)
            .build(&listing.lines);

        info!(
            lines = network.line_count(),
            stops = network.stop_count(),
            edges = network.edge_count(),
            "transit network built"
        );
        Ok(Arc::new(network))
    }
}

/// Spawn a task that rebuilds the network at the configured interval.
///
/// The first tick is skipped; the initial build happens on first request.
pub fn spawn_refresh<S>(cache: Arc<NetworkCache<S>>) -> JoinHandle<()>
where
    S: LineSource + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cache.refresh_interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            // Failures are already logged by refresh
            if let Ok(network) = cache.refresh().await {
                info!(built_at = %network.built_at(), "scheduled network refresh done");
            }
        }
    })
}
