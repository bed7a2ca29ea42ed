//! CKAN datastore client for the bus line listing.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::error::SourceError;
use super::types::{LineListing, RawLineRow, validate_rows};
use super::LineSource;

/// Default base URL of the Open Development Cambodia CKAN action API.
const DEFAULT_BASE_URL: &str = "https://data.opendevelopmentcambodia.net/en/api/3/action";

/// Datastore resource holding the Phnom Penh city bus lines.
const DEFAULT_RESOURCE_ID: &str = "8efae0bf-319e-4ca5-9f6a-4fb75129ea3d";

/// Default number of rows requested per page.
const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default number of page requests in flight at once.
const DEFAULT_MAX_CONCURRENT_PAGES: usize = 4;

/// Envelope of a `datastore_search` response.
#[derive(Debug, Deserialize)]
struct DatastoreResponse {
    success: bool,
    #[serde(default)]
    result: Option<DatastoreResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DatastoreResult {
    #[serde(default)]
    records: Vec<RawLineRow>,
    #[serde(default)]
    total: Option<usize>,
}

/// One page of rows plus the total row count reported by the server.
#[derive(Debug)]
struct Page {
    records: Vec<RawLineRow>,
    total: Option<usize>,
}

/// Configuration for the CKAN client.
#[derive(Debug, Clone)]
pub struct CkanConfig {
    /// Base URL of the CKAN action API
    pub base_url: String,
    /// Datastore resource id of the line listing
    pub resource_id: String,
    /// Rows requested per page
    pub page_size: usize,
    /// Page requests in flight at once after the first page
    pub max_concurrent_pages: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Skip TLS certificate verification.
    /// The upstream host has served certificates that fail validation.
    pub accept_invalid_certs: bool,
}

impl CkanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = id.into();
        self
    }

    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    pub fn with_max_concurrent_pages(mut self, n: usize) -> Self {
        self.max_concurrent_pages = n.max(1);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

impl Default for CkanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            resource_id: DEFAULT_RESOURCE_ID.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            timeout_secs: 5,
            accept_invalid_certs: false,
        }
    }
}

/// Client for the CKAN `datastore_search` action.
#[derive(Debug, Clone)]
pub struct CkanClient {
    http: reqwest::Client,
    base_url: String,
    resource_id: String,
    page_size: usize,
    max_concurrent_pages: usize,
}

impl CkanClient {
    /// Create a new CKAN client.
    pub fn new(config: CkanConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            resource_id: config.resource_id,
            page_size: config.page_size,
            max_concurrent_pages: config.max_concurrent_pages.max(1),
        })
    }

    /// Fetch every row of the listing.
    ///
    /// The first page tells us the total; the remaining pages are fetched
    /// concurrently, at most `max_concurrent_pages` at a time, and kept in
    /// listing order.
    pub async fn fetch_rows(&self) -> Result<Vec<RawLineRow>, SourceError> {
        let first = self.fetch_page(0).await?;
        let total = first.total.unwrap_or(first.records.len());
        let offsets = remaining_offsets(first.records.len(), total);

        debug!(total, pages = offsets.len() + 1, "fetching line listing");

        let rest: Vec<Page> = stream::iter(offsets)
            .map(|offset| self.fetch_page(offset))
            .buffered(self.max_concurrent_pages)
            .try_collect()
            .await?;

        let mut rows = first.records;
        for page in rest {
            rows.extend(page.records);
        }
        Ok(rows)
    }

    async fn fetch_page(&self, offset: usize) -> Result<Page, SourceError> {
        let url = format!("{}/datastore_search", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("resource_id", self.resource_id.clone()),
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_page(&body, status.as_u16())
    }
}

impl LineSource for CkanClient {
    async fn fetch_lines(&self) -> Result<LineListing, SourceError> {
        let rows = self.fetch_rows().await?;
        Ok(LineListing {
            lines: validate_rows(rows)?,
            locations: Vec::new(),
        })
    }
}

/// Parse a `datastore_search` body.
fn parse_page(body: &str, status: u16) -> Result<Page, SourceError> {
    let response: DatastoreResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Json {
            message: e.to_string(),
        })?;

    if !response.success {
        let message = response
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(SourceError::Api { status, message });
    }

    let result = response.result.ok_or_else(|| SourceError::Json {
        message: "missing result".to_string(),
    })?;

    Ok(Page {
        records: result.records,
        total: result.total,
    })
}

/// Offsets of the pages still to fetch after a first page of `fetched`
/// rows. The server may cap the page below the requested limit, so the
/// first page's length is the stride.
fn remaining_offsets(fetched: usize, total: usize) -> Vec<usize> {
    if fetched == 0 || fetched >= total {
        return Vec::new();
    }
    (fetched..total).step_by(fetched).collect()
}
