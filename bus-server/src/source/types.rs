//! Line listing schema.
//!
//! Upstream rows are loosely typed: ids arrive as numbers or strings,
//! distances as numbers, numeric strings, or nothing at all. Everything is
//! validated here, at the ingestion boundary, so the network builder only
//! ever sees well-formed [`LineRecord`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Coordinates, LineId};

use super::error::SourceError;

/// A validated line record.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub id: LineId,
    pub name: String,

    /// Total line distance; 0 when the listing does not say.
    pub distance_km: f64,

    /// Comma-delimited stop names in operating order, as published.
    pub stops: String,
}

/// A known stop location, keyed by stop display name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StopLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl StopLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Everything a source provides for one network build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineListing {
    pub lines: Vec<LineRecord>,

    /// Optional stop locations; empty when the source has none.
    pub locations: Vec<StopLocation>,
}

/// A line row as published by the CKAN datastore.
///
/// Field names follow the upstream dataset (`map_id`, `distance_k`,
/// `operating_`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLineRow {
    #[serde(default)]
    pub map_id: Value,

    #[serde(default)]
    pub name: Value,

    #[serde(default)]
    pub distance_k: Value,

    #[serde(default, rename = "operating_")]
    pub operating: Value,
}

impl RawLineRow {
    /// Validate this row. `index` is its position in the listing, used in
    /// error messages.
    pub fn validate(self, index: usize) -> Result<LineRecord, SourceError> {
        let invalid = |reason: String| SourceError::InvalidRecord { index, reason };

        let raw_id = match self.map_id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Null => return Err(invalid("missing map_id".to_string())),
            other => {
                return Err(invalid(format!(
                    "map_id must be a string or number, got {other}"
                )));
            }
        };
        let id = LineId::parse(&raw_id).map_err(|e| invalid(e.to_string()))?;

        let name = match self.name {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Null => return Err(invalid("missing name".to_string())),
            other => return Err(invalid(format!("name must be a non-empty string, got {other}"))),
        };

        let distance_km = parse_distance(&self.distance_k).map_err(invalid)?;

        let stops = match self.operating {
            Value::String(s) => s,
            Value::Null => return Err(invalid("missing operating_ stop list".to_string())),
            other => return Err(invalid(format!("operating_ must be a string, got {other}"))),
        };

        Ok(LineRecord {
            id,
            name,
            distance_km,
            stops,
        })
    }
}

/// Validate a whole listing, failing on the first bad row.
pub fn validate_rows(rows: Vec<RawLineRow>) -> Result<Vec<LineRecord>, SourceError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| row.validate(index))
        .collect()
}

/// Parse `distance_k`: absent means unknown (0 km).
fn parse_distance(value: &Value) -> Result<f64, String> {
    let km = match value {
        Value::Null => return Ok(0.0),
        Value::String(s) if s.trim().is_empty() => return Ok(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("distance_k is not a number: {s:?}"))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("distance_k out of range: {n}"))?,
        other => return Err(format!("distance_k must be a number, got {other}")),
    };

    if !km.is_finite() || km < 0.0 {
        return Err(format!(
            "distance_k must be finite and non-negative, got {km}"
        ));
    }

    Ok(km)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawLineRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn numeric_id_and_string_distance() {
        let record = row(json!({
            "map_id": 3,
            "name": "Line 03",
            "distance_k": "17.4",
            "operating_": "Freedom Park, Wat Phnom"
        }))
        .validate(0)
        .unwrap();

        assert_eq!(record.id.as_str(), "3");
        assert_eq!(record.name, "Line 03");
        assert!((record.distance_km - 17.4).abs() < 1e-9);
        assert_eq!(record.stops, "Freedom Park, Wat Phnom");
    }

    #[test]
    fn missing_distance_is_zero() {
        let record = row(json!({
            "map_id": "A",
            "name": "Airport Shuttle",
            "operating_": ""
        }))
        .validate(0)
        .unwrap();
        assert_eq!(record.distance_km, 0.0);

        let record = row(json!({
            "map_id": "A",
            "name": "Airport Shuttle",
            "distance_k": " ",
            "operating_": ""
        }))
        .validate(0)
        .unwrap();
        assert_eq!(record.distance_km, 0.0);
    }

    #[test]
    fn rejects_missing_id() {
        let err = row(json!({ "name": "Line 1", "operating_": "A, B" }))
            .validate(7)
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord { index: 7, .. }));
        assert!(err.to_string().contains("missing map_id"));
    }

    #[test]
    fn rejects_blank_id_and_name() {
        assert!(
            row(json!({ "map_id": "  ", "name": "Line 1", "operating_": "A" }))
                .validate(0)
                .is_err()
        );
        assert!(
            row(json!({ "map_id": 1, "name": "", "operating_": "A" }))
                .validate(0)
                .is_err()
        );
    }

    #[test]
    fn rejects_missing_stop_list() {
        let err = row(json!({ "map_id": 1, "name": "Line 1", "distance_k": 4 }))
            .validate(0)
            .unwrap_err();
        assert!(err.to_string().contains("operating_"));
    }

    #[test]
    fn rejects_bad_distances() {
        for bad in [json!("ten"), json!(-2.5), json!("NaN"), json!(true)] {
            let result = row(json!({
                "map_id": 1,
                "name": "Line 1",
                "distance_k": bad,
                "operating_": "A, B"
            }))
            .validate(0);
            assert!(result.is_err(), "accepted distance {bad}");
        }
    }

    #[test]
    fn validate_rows_reports_first_bad_index() {
        let rows = vec![
            row(json!({ "map_id": 1, "name": "Line 1", "operating_": "A, B" })),
            row(json!({ "map_id": 2, "name": "Line 2", "operating_": "B, C" })),
            row(json!({ "map_id": 3, "operating_": "C, D" })),
        ];
        let err = validate_rows(rows).unwrap_err();
        assert!(matches!(err, SourceError::InvalidRecord { index: 2, .. }));
    }

    #[test]
    fn stop_location_coordinates() {
        let loc: StopLocation =
            serde_json::from_value(json!({ "name": "Wat Phnom", "lat": 11.576, "lon": 104.923 }))
                .unwrap();
        assert_eq!(loc.coordinates(), Coordinates::new(11.576, 104.923));
    }
}
