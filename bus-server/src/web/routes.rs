//! HTTP route handlers.

use std::sync::Arc;

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::planner::{CostProfile, PlanError, SearchError, plan_trip};
use crate::resolver::search_stop_names;
use crate::source::SourceError;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

const DEFAULT_STOP_LIMIT: usize = 20;
const MAX_STOP_LIMIT: usize = 200;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/api/planner", get(plan_route))
        .route("/planner", get(plan_route))
        .route("/api/stops", get(search_stops))
        .route("/api/network/refresh", post(refresh_network))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Index page with the trip form.
async fn index_page() -> impl IntoResponse {
    Html(
        IndexTemplate::new()
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Plan a trip between two free-text stops.
///
/// Responds with JSON, or an HTML fragment when the client accepts HTML
/// (errors included).
async fn plan_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PlannerQuery>,
) -> Response {
    let html = accepts_html(&headers);
    match plan(&state, &query, html).await {
        Ok(response) => response,
        Err(e) if html => e.into_html_response(),
        Err(e) => e.into_response(),
    }
}

async fn plan(state: &AppState, query: &PlannerQuery, html: bool) -> Result<Response, AppError> {
    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let (Some(from), Some(to)) = (non_empty(&query.from), non_empty(&query.to)) else {
        return Err(AppError::BadRequest {
            message: "Query params required: from, to".to_string(),
        });
    };

    let profile = match query.opt.as_deref() {
        None => CostProfile::default(),
        Some(opt) => CostProfile::parse(opt).unwrap_or_else(|| {
            warn!(opt, "unknown cost profile, using balanced");
            CostProfile::Balanced
        }),
    };

    let network = state.network.get().await?;

    let plan = plan_trip(&network, &from, &to, profile, &state.config)?;

    debug!(
        from = %plan.from_stop,
        to = %plan.to_stop,
        %profile,
        transfers = plan.itinerary.summary.transfers,
        "trip planned"
    );

    if html {
        let template = ItineraryTemplate {
            trip: TripView::from_plan(&plan),
        };
        let html = template.render().map_err(|e| AppError::Internal {
            message: format!("Template error: {}", e),
            error: None,
        })?;
        Ok(Html(html).into_response())
    } else {
        Ok(Json(PlanResponse::from_plan(&plan, &from, &to)).into_response())
    }
}

/// Search stop names for autocompletion.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<StopSearchQuery>,
) -> Result<Json<StopSearchResponse>, AppError> {
    let limit = req.limit.unwrap_or(DEFAULT_STOP_LIMIT).min(MAX_STOP_LIMIT);
    let network = state.network.get().await?;
    let matches = search_stop_names(&req.q, &network, limit);

    Ok(Json(StopSearchResponse::from_matches(matches)))
}

/// Rebuild the network from the source now.
async fn refresh_network(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let network = state.network.refresh().await?;
    Ok(Json(RefreshResponse::from_network(&network)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound(ErrorResponse),
    Internal { message: String, error: Option<String> },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorResponse {
        match self {
            AppError::BadRequest { message } => ErrorResponse {
                message,
                ..Default::default()
            },
            AppError::NotFound(body) => body,
            AppError::Internal { message, error } => ErrorResponse {
                message,
                error,
                ..Default::default()
            },
        }
    }

    fn log(&self) {
        match self {
            AppError::Internal { message, error } => {
                error!(reason = %message, detail = error.as_deref().unwrap_or(""), "request failed");
            }
            other => debug!(status = %other.status(), "request rejected"),
        }
    }

    /// Render the error as an HTML fragment.
    fn into_html_response(self) -> Response {
        self.log();
        let status = self.status();
        let body = self.into_body();

        let details = body.error.clone().or_else(|| {
            match (&body.from_resolved, &body.to_resolved, &body.stop) {
                (_, _, Some(stop)) => Some(format!("No bus leaves {}", stop)),
                (Some(from), None, _) => Some(format!("Origin matched {}", from)),
                (None, Some(to), _) => Some(format!("Destination matched {}", to)),
                _ => None,
            }
        });
        let template = PlanErrorTemplate {
            message: body.message,
            details,
        };
        match template.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Template error: {}", e))
                .into_response(),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Unresolved { from, to } => AppError::NotFound(ErrorResponse {
                message: "Could not resolve from/to stop".to_string(),
                from_resolved: from,
                to_resolved: to,
                ..Default::default()
            }),
            PlanError::Search(e) => e.into(),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::NoOutgoingEdges { name, .. } => AppError::NotFound(ErrorResponse {
                message: "Start stop has no outgoing edges".to_string(),
                stop: Some(name),
                ..Default::default()
            }),
            SearchError::NoRoute { .. } | SearchError::ExpansionLimit { .. } => {
                AppError::NotFound(ErrorResponse {
                    message: "No route found between selected stops".to_string(),
                    error: Some(e.to_string()),
                    ..Default::default()
                })
            }
            SearchError::UnknownStop { .. } => AppError::Internal {
                message: "Route planning failed".to_string(),
                error: Some(e.to_string()),
            },
        }
    }
}

impl From<SourceError> for AppError {
    fn from(e: SourceError) -> Self {
        AppError::Internal {
            message: "Bus network unavailable".to_string(),
            error: Some(e.to_string()),
        }
    }
}

impl From<Arc<SourceError>> for AppError {
    fn from(e: Arc<SourceError>) -> Self {
        AppError::Internal {
            message: "Bus network unavailable".to_string(),
            error: Some(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;
    use serde_json::Value;
    use tempfile::{TempDir, tempdir};

    use crate::cache::{CacheConfig, NetworkCache};
    use crate::planner::PlannerConfig;
    use crate::source::{DataSource, FileSource};

    const LINES: &str = r#"[
        {"map_id": 1, "name": "Line 1", "distance_k": 10, "operating_": "Freedom Park, National Road No 5, Central Market"},
        {"map_id": 2, "name": "Line 2", "distance_k": 8, "operating_": "Central Market, Wat Phnom, Borey Santepheap 2"},
        {"map_id": 3, "name": "Line 3", "distance_k": 0, "operating_": "Lonely Stop"}
    ]"#;

    fn state_with(lines: Option<&str>) -> (TempDir, AppState) {
        let dir = tempdir().unwrap();
        if let Some(lines) = lines {
            std::fs::write(dir.path().join("lines.json"), lines).unwrap();
        }
        let source = DataSource::File(FileSource::new(dir.path()));
        let cache = NetworkCache::new(source, 18.0, &CacheConfig::default());
        let state = AppState::new(Arc::new(cache), PlannerConfig::default());
        (dir, state)
    }

    fn query(from: Option<&str>, to: Option<&str>, opt: Option<&str>) -> Query<PlannerQuery> {
        Query(PlannerQuery {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            opt: opt.map(str::to_string),
        })
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn accepts_html_header() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_html(&headers));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html,*/*"));
        assert!(accepts_html(&headers));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!accepts_html(&headers));
    }

    #[tokio::test]
    async fn plans_a_trip() {
        let (_dir, state) = state_with(Some(LINES));
        let response = plan_route(
            State(state),
            HeaderMap::new(),
            query(Some("Freedom Park"), Some("Borey Santepheap 2"), None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["query"]["optimizeFor"], "balanced");
        assert_eq!(json["summary"]["transfers"], 1);
        assert_eq!(json["summary"]["fare_riel"], 3000);
        assert_eq!(json["steps"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn same_stop_trip() {
        let (_dir, state) = state_with(Some(LINES));
        let response = plan_route(
            State(state),
            HeaderMap::new(),
            query(Some("Wat Phnom"), Some("Wat Phnom"), Some("fast")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["summary"]["transfers"], 0);
        assert_eq!(json["summary"]["fare_riel"], 1500);
        assert!(json["steps"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_profile_falls_back_to_balanced() {
        let (_dir, state) = state_with(Some(LINES));
        let response = plan_route(
            State(state),
            HeaderMap::new(),
            query(Some("Freedom Park"), Some("Wat Phnom"), Some("scenic")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["query"]["optimizeFor"], "balanced");
    }

    #[tokio::test]
    async fn missing_endpoint_is_bad_request() {
        let (_dir, state) = state_with(Some(LINES));
        let response = plan_route(
            State(state),
            HeaderMap::new(),
            query(Some("Freedom Park"), Some("   "), None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "Query params required: from, to"
        );
    }

    #[tokio::test]
    async fn unresolved_stop_is_not_found() {
        let (_dir, state) = state_with(Some(LINES));
        let response = plan_route(
            State(state),
            HeaderMap::new(),
            query(Some("Freedom Park"), Some("central mkt"), None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["fromResolved"], "Freedom Park");
        assert!(json.get("toResolved").is_none());
    }

    #[tokio::test]
    async fn isolated_origin_is_not_found() {
        let (_dir, state) = state_with(Some(LINES));
        let response = plan_route(
            State(state),
            HeaderMap::new(),
            query(Some("Lonely Stop"), Some("Wat Phnom"), None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Start stop has no outgoing edges");
        assert_eq!(json["stop"], "Lonely Stop");
    }

    #[test]
    fn isolated_origin_error_names_the_stop() {
        let err = AppError::from(PlanError::Search(SearchError::NoOutgoingEdges {
            stop: crate::domain::StopId::new(&crate::domain::LineId::parse("3").unwrap(), 1),
            name: "Lonely Stop".to_string(),
        }));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let body = err.into_body();
        assert_eq!(body.message, "Start stop has no outgoing edges");
        assert_eq!(body.stop.as_deref(), Some("Lonely Stop"));
        assert!(body.error.is_none());
    }

    #[tokio::test]
    async fn missing_data_is_internal_error() {
        let (_dir, state) = state_with(None);
        let response = plan_route(
            State(state),
            HeaderMap::new(),
            query(Some("Freedom Park"), Some("Wat Phnom"), None),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Bus network unavailable");
        assert!(json["error"].as_str().unwrap().contains("lines.json"));
    }

    #[tokio::test]
    async fn html_fragment_when_accepted() {
        let (_dir, state) = state_with(Some(LINES));
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));

        let response = plan_route(
            State(state.clone()),
            headers.clone(),
            query(Some("Freedom Park"), Some("Borey Santepheap 2"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Transfer to Line Line 2 at Central Market"));
        assert!(html.contains("3,000 riel"));

        let response = plan_route(
            State(state),
            headers,
            query(Some("Freedom Park"), Some("nowhere at all"), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Could not resolve from/to stop"));
        assert!(html.contains("Origin matched Freedom Park"));
    }

    #[tokio::test]
    async fn stop_search() {
        let (_dir, state) = state_with(Some(LINES));
        let Json(response) = search_stops(
            State(state),
            Query(StopSearchQuery {
                q: "market".to_string(),
                limit: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.total_results, 1);
        assert_eq!(response.records[0].name, "Central Market");
        assert_eq!(response.records[0].lines, vec!["Line 1", "Line 2"]);
    }

    #[tokio::test]
    async fn refresh_reports_counts_and_keeps_network_on_failure() {
        let (dir, state) = state_with(Some(LINES));
        let Json(first) = refresh_network(State(state.clone())).await.unwrap();
        assert_eq!(first.lines, 3);
        assert_eq!(first.stops, 7);

        std::fs::write(dir.path().join("lines.json"), "{broken").unwrap();
        let err = refresh_network(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let current = state.network.current().await.unwrap();
        assert_eq!(current.line_count(), 3);
    }

    #[test]
    fn search_errors_map_to_not_found() {
        let err: AppError = SearchError::ExpansionLimit { limit: 5 }.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let body = err.into_body();
        assert_eq!(body.message, "No route found between selected stops");
        assert_eq!(
            body.error.as_deref(),
            Some("search abandoned after expanding 5 states")
        );
    }
}
