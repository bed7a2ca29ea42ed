//! Line listing sources.
//!
//! The network is built from a listing of bus lines, each with an ordered,
//! comma-delimited stop list. In production the listing comes from the
//! Open Development Cambodia CKAN datastore; for development it can be read
//! from local JSON files.

mod ckan;
mod error;
mod file;
mod types;

use std::future::Future;

pub use ckan::{CkanClient, CkanConfig};
pub use error::SourceError;
pub use file::FileSource;
pub use types::{LineListing, LineRecord, RawLineRow, StopLocation, validate_rows};

/// Something that can produce a validated line listing.
///
/// This abstraction allows the network cache to be tested with mock data.
pub trait LineSource {
    fn fetch_lines(&self) -> impl Future<Output = Result<LineListing, SourceError>> + Send;
}

/// The line sources the server can be configured with.
#[derive(Debug, Clone)]
pub enum DataSource {
    Ckan(CkanClient),
    File(FileSource),
}

impl DataSource {
    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            DataSource::Ckan(_) => "CKAN datastore".to_string(),
            DataSource::File(f) => format!("files in {}", f.dir().display()),
        }
    }
}

impl LineSource for DataSource {
    async fn fetch_lines(&self) -> Result<LineListing, SourceError> {
        match self {
            DataSource::Ckan(client) => client.fetch_lines().await,
            DataSource::File(files) => files.fetch_lines().await,
        }
    }
}
