//! File-backed line source for offline development and tests.
//!
//! Reads the listing from a directory holding `lines.json` (an array of
//! upstream rows, same schema as the CKAN datastore) and, optionally,
//! `stops.json` (an array of `{name, lat, lon}` stop locations).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::error::SourceError;
use super::types::{LineListing, RawLineRow, StopLocation, validate_rows};
use super::LineSource;

const LINES_FILE: &str = "lines.json";
const STOPS_FILE: &str = "stops.json";

/// Line source reading JSON files from a directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, SourceError> {
        let path = self.dir.join(name);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SourceError::Io { path, source }),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| SourceError::Json {
                message: format!("{}: {}", path.display(), e),
            })
    }
}

impl LineSource for FileSource {
    async fn fetch_lines(&self) -> Result<LineListing, SourceError> {
        let rows: Vec<RawLineRow> = self
            .read_json(LINES_FILE)
            .await?
            .ok_or_else(|| SourceError::Io {
                path: self.dir.join(LINES_FILE),
                source: ErrorKind::NotFound.into(),
            })?;

        let locations: Vec<StopLocation> = self
            .read_json(STOPS_FILE)
            .await?
            .unwrap_or_default();

        Ok(LineListing {
            lines: validate_rows(rows)?,
            locations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LINES: &str = r#"[
        {"map_id": 1, "name": "Line 01", "distance_k": 10, "operating_": "Freedom Park, National Road No 5, Central Market"},
        {"map_id": 2, "name": "Line 02", "distance_k": 8, "operating_": "Central Market, Wat Phnom, Borey Santepheap 2"}
    ]"#;

    #[tokio::test]
    async fn reads_lines_without_locations() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("lines.json"), LINES).unwrap();

        let listing = FileSource::new(dir.path()).fetch_lines().await.unwrap();
        assert_eq!(listing.lines.len(), 2);
        assert_eq!(listing.lines[1].id.as_str(), "2");
        assert!(listing.locations.is_empty());
    }

    #[tokio::test]
    async fn reads_locations() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("lines.json"), LINES).unwrap();
        std::fs::write(
            dir.path().join("stops.json"),
            r#"[{"name": "Wat Phnom", "lat": 11.5762, "lon": 104.9231}]"#,
        )
        .unwrap();

        let listing = FileSource::new(dir.path()).fetch_lines().await.unwrap();
        assert_eq!(listing.locations.len(), 1);
        assert_eq!(listing.locations[0].name, "Wat Phnom");
    }

    #[tokio::test]
    async fn missing_lines_file() {
        let dir = tempdir().unwrap();
        let err = FileSource::new(dir.path()).fetch_lines().await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_json() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("lines.json"), "{not json").unwrap();
        let err = FileSource::new(dir.path()).fetch_lines().await.unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }

    #[tokio::test]
    async fn invalid_row_fails_the_listing() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("lines.json"),
            r#"[{"map_id": 1, "name": "Line 01", "operating_": "A, B"}, {"name": "orphan"}]"#,
        )
        .unwrap();
        let err = FileSource::new(dir.path()).fetch_lines().await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord { index: 1, .. }));
    }
}
