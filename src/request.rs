use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{HmsError, Result};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

/// Spatial scope of a query: exactly one of a catchment (NHDPlus comID), an
/// NCEI station, or a lat/long point. The variant is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Geometry {
    #[serde(rename = "point")]
    Point(Point),
    #[serde(rename = "comID")]
    Catchment(i64),
    #[serde(rename = "stationID")]
    Station(String),
}

impl Geometry {
    pub fn point(latitude: f64, longitude: f64) -> Self {
        Geometry::Point(Point {
            latitude,
            longitude,
        })
    }

    pub fn catchment(com_id: i64) -> Self {
        Geometry::Catchment(com_id)
    }

    pub fn station(station_id: impl Into<String>) -> Self {
        Geometry::Station(station_id.into())
    }

    /// Selects a variant from a key/value map, the way the HMS reference
    /// clients accept geometry input.
    ///
    /// Keys are checked in fixed priority order: `latitude` (with
    /// `longitude`), then `comID`, then `stationID`; the first match wins.
    /// Numeric values may be JSON numbers or numeric strings. If no key
    /// matches, construction fails instead of leaving the variant unset.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        if let Some(lat) = map.get("latitude") {
            let latitude = as_float(lat)
                .ok_or_else(|| HmsError::InvalidGeometry("latitude is not a number".into()))?;
            let longitude = map
                .get("longitude")
                .and_then(as_float)
                .ok_or_else(|| HmsError::InvalidGeometry("latitude without longitude".into()))?;
            return Ok(Geometry::point(latitude, longitude));
        }

        if let Some(com_id) = map.get("comID") {
            let com_id = as_integer(com_id)
                .ok_or_else(|| HmsError::InvalidGeometry("comID is not an integer".into()))?;
            return Ok(Geometry::Catchment(com_id));
        }

        if let Some(station_id) = map.get("stationID") {
            let station_id = station_id
                .as_str()
                .ok_or_else(|| HmsError::InvalidGeometry("stationID is not a string".into()))?;
            return Ok(Geometry::station(station_id));
        }

        Err(HmsError::InvalidGeometry(
            "expected one of latitude/longitude, comID, or stationID".into(),
        ))
    }
}

fn as_float(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_integer(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Start/end date pair for the requested time series.
///
/// Dates are passed through verbatim; the service validates ordering and
/// format on its side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSpan {
    #[serde(rename = "startDate")]
    pub start: String,
    #[serde(rename = "endDate")]
    pub end: String,
}

impl TimeSpan {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        TimeSpan {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// One HMS data query: source, time span, geometry, and temporal resolution.
///
/// Built once per logical query and handed to [`Client::submit`].
///
/// [`Client::submit`]: crate::Client::submit
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub source: String,
    pub span: TimeSpan,
    pub geometry: Geometry,
    pub resolution: String,
}

impl DataRequest {
    pub fn new(
        source: impl Into<String>,
        span: TimeSpan,
        geometry: Geometry,
        resolution: impl Into<String>,
    ) -> Self {
        DataRequest {
            source: source.into(),
            span,
            geometry,
            resolution: resolution.into(),
        }
    }

    /// Renders the wire body the HMS submission endpoint parses.
    ///
    /// The reference clients emit an extra closing brace after the geometry
    /// fragment, before `temporalResolution`, and the backend parser expects
    /// exactly those bytes. Each field is rendered through serde_json and
    /// the body is assembled fragment by fragment to keep byte parity with
    /// that format: no whitespace, fixed field order, the stray brace kept.
    pub fn to_body(&self) -> Result<String> {
        let source = serde_json::to_string(&self.source)?;
        let span = serde_json::to_string(&self.span)?;
        let geometry = serde_json::to_string(&self.geometry)?;
        let resolution = serde_json::to_string(&self.resolution)?;
        Ok(format!(
            "{{\"source\":{source},\"dateTimeSpan\":{span},\"geometry\":{geometry}}},\"temporalResolution\":{resolution}}}"
        ))
    }
}
