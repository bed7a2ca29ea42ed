use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bus_server::cache::{CacheConfig, NetworkCache, spawn_refresh};
use bus_server::planner::PlannerConfig;
use bus_server::source::{CkanClient, CkanConfig, DataSource, FileSource};
use bus_server::web::{AppState, create_router};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_LOG_FILTER: &str = "bus_server=info,tower_http=info";

/// Read an environment variable, treating empty as unset.
fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(name: &str) -> bool {
    env(name).is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // Local JSON files take precedence over the CKAN datastore
    let source = match env("BUS_PLANNER_DATA_DIR") {
        Some(dir) => DataSource::File(FileSource::new(dir)),
        None => {
            let mut ckan_config = CkanConfig::new()
                .with_accept_invalid_certs(env_flag("CKAN_ACCEPT_INVALID_CERTS"));
            if let Some(url) = env("CKAN_BASE_URL") {
                ckan_config = ckan_config.with_base_url(url);
            }
            if let Some(id) = env("CKAN_RESOURCE_ID") {
                ckan_config = ckan_config.with_resource_id(id);
            }
            if ckan_config.accept_invalid_certs {
                warn!("TLS certificate verification disabled for the CKAN datastore");
            }
            DataSource::Ckan(CkanClient::new(ckan_config).expect("Failed to create CKAN client"))
        }
    };
    info!(source = %source.describe(), "line source configured");

    let mut cache_config = CacheConfig::default();
    if let Some(secs) = env("BUS_PLANNER_REFRESH_SECS") {
        match secs.parse::<u64>() {
            Ok(secs) if secs > 0 => {
                cache_config = cache_config.with_refresh_interval(Duration::from_secs(secs));
            }
            _ => warn!(value = %secs, "ignoring invalid BUS_PLANNER_REFRESH_SECS"),
        }
    }

    let planner_config = PlannerConfig::default();
    let network = Arc::new(NetworkCache::new(
        source,
        planner_config.avg_speed_kmph,
        &cache_config,
    ));

    // Rebuild the network in the background; the first build is lazy
    spawn_refresh(network.clone());
    info!(
        every_secs = cache_config.refresh_interval.as_secs(),
        "scheduled network refresh"
    );

    let state = AppState::new(network, planner_config);
    let static_dir = env("BUS_PLANNER_STATIC_DIR").unwrap_or_else(|| "static".to_string());
    let app = create_router(state, &static_dir);

    let addr: SocketAddr = env("BUS_PLANNER_ADDR")
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
        .parse()
        .expect("BUS_PLANNER_ADDR must be a socket address");

    info!("Bus planner listening on http://{addr}");
    info!("  GET  /api/planner?from=&to=&opt=  - Plan a trip");
    info!("  GET  /api/stops?q=                - Search stop names");
    info!("  POST /api/network/refresh         - Rebuild the network");
    info!("  GET  /health                      - Health check");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
