/// Google Earth Engine subset extraction
///
/// Samples an image collection at a site for a date window and returns one
/// row per image. Requests go to the REST `value:compute` endpoint as an
/// expression graph equivalent to
///
/// ```text
/// ImageCollection(product).filterDate(start, end).getRegion(geometry, scale)
/// ```
///
/// Authentication is an OAuth access token handed in through
/// `EarthEngineSession`; obtaining or refreshing it is the caller's job.
///
/// API Documentation: https://developers.google.com/earth-engine/reference/rest

use crate::model::{Cell, ExtractError, ConfigError, SubsetRequest};
use crate::table::SubsetTable;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;

pub const ENV_PROJECT: &str = "EE_PROJECT";
pub const ENV_ACCESS_TOKEN: &str = "EE_ACCESS_TOKEN";

/// Kilometres per degree of latitude, used to turn `pad_km` into a box.
const KM_PER_DEGREE: f64 = 111.32;

// ============================================================================
// Extractor seam
// ============================================================================

/// Anything that can turn a subset request into a table.
pub trait SubsetExtractor {
    fn extract(&self, request: &SubsetRequest) -> Result<SubsetTable, ExtractError>;
}

// ============================================================================
// Session
// ============================================================================

/// Cloud project and access token for Earth Engine calls.
#[derive(Clone, PartialEq)]
pub struct EarthEngineSession {
    pub project: String,
    access_token: String,
}

impl fmt::Debug for EarthEngineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EarthEngineSession")
            .field("project", &self.project)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl EarthEngineSession {
    pub fn new(project: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            access_token: access_token.into(),
        }
    }

    /// Reads `EE_PROJECT` and `EE_ACCESS_TOKEN`, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingCredential(name.to_string()))
        };

        Ok(Self::new(require(ENV_PROJECT)?, require(ENV_ACCESS_TOKEN)?))
    }
}

// ============================================================================
// Request construction
// ============================================================================

fn invoke(function_name: &str, arguments: Value) -> Value {
    json!({
        "functionInvocationValue": {
            "functionName": function_name,
            "arguments": arguments,
        }
    })
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn geometry(request: &SubsetRequest) -> Value {
    if request.pad_km > 0.0 {
        let dlat = request.pad_km / KM_PER_DEGREE;
        let dlon = dlat / request.latitude.to_radians().cos().abs().max(1e-6);
        invoke(
            "GeometryConstructors.Rectangle",
            json!({
                "coordinates": constant(json!([
                    request.longitude - dlon,
                    request.latitude - dlat,
                    request.longitude + dlon,
                    request.latitude + dlat,
                ])),
                "geodesic": constant(json!(false)),
            }),
        )
    } else {
        invoke(
            "GeometryConstructors.Point",
            json!({ "coordinates": constant(json!([request.longitude, request.latitude])) }),
        )
    }
}

/// Builds the `value:compute` request body for one subset request.
pub fn build_region_expression(request: &SubsetRequest) -> Value {
    let date = |d: chrono::NaiveDate| {
        invoke("Date", json!({ "value": constant(json!(d.format("%Y-%m-%d").to_string())) }))
    };

    let collection = invoke(
        "Collection.filter",
        json!({
            "collection": invoke("ImageCollection.load", json!({ "id": constant(json!(request.product)) })),
            "filter": invoke(
                "Filter.dateRangeContains",
                json!({
                    "leftValue": invoke(
                        "DateRange",
                        json!({
                            "start": date(request.window.start),
                            "end": date(request.window.end),
                        }),
                    ),
                    "rightField": constant(json!("system:time_start")),
                }),
            ),
        }),
    );

    let region = invoke(
        "ImageCollection.getRegion",
        json!({
            "collection": collection,
            "geometry": geometry(request),
            "scale": constant(json!(request.scale)),
        }),
    );

    json!({
        "expression": {
            "result": "0",
            "values": { "0": region },
        }
    })
}

// ============================================================================
// Response parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    result: Vec<Vec<Value>>,
}

fn header_index(header: &[String], name: &str) -> Result<usize, ExtractError> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ExtractError::ParseError(format!("column '{}' missing from region response", name)))
}

/// Converts a `getRegion` result into a subset table.
///
/// Output columns are `id, longitude, latitude, date`, the requested bands in
/// request order, then `product, latitude_original, longitude_original`.
pub fn parse_region_response(body: &str, request: &SubsetRequest) -> Result<SubsetTable, ExtractError> {
    let response: ComputeValueResponse =
        serde_json::from_str(body).map_err(|e| ExtractError::ParseError(e.to_string()))?;

    let mut rows = response.result.into_iter();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| ExtractError::ParseError("region response has no header row".to_string()))?
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();

    let id_idx = header_index(&header, "id")?;
    let lon_idx = header_index(&header, "longitude")?;
    let lat_idx = header_index(&header, "latitude")?;
    let time_idx = header_index(&header, "time")?;
    let band_idx = request
        .bands
        .iter()
        .map(|b| header_index(&header, b))
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns = vec![
        "id".to_string(),
        "longitude".to_string(),
        "latitude".to_string(),
        "date".to_string(),
    ];
    columns.extend(request.bands.iter().cloned());
    columns.extend(["product", "latitude_original", "longitude_original"].map(String::from));

    let mut table = SubsetTable::new(columns);
    for raw in rows {
        let get = |idx: usize| raw.get(idx).map(Cell::from_json).unwrap_or(Cell::Null);

        let date = match raw.get(time_idx).and_then(Value::as_f64) {
            Some(ms) => DateTime::from_timestamp_millis(ms as i64)
                .map(|dt| Cell::Text(dt.date_naive().format("%Y-%m-%d").to_string()))
                .ok_or_else(|| ExtractError::ParseError(format!("time out of range: {}", ms)))?,
            None => Cell::Null,
        };

        let mut row = vec![get(id_idx), get(lon_idx), get(lat_idx), date];
        row.extend(band_idx.iter().map(|&i| get(i)));
        row.push(Cell::Text(request.product.clone()));
        row.push(Cell::Number(request.latitude));
        row.push(Cell::Number(request.longitude));
        table.push_row(row);
    }

    Ok(table)
}

/// Pulls `error.message` out of a Google API error body, falling back to
/// the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

// ============================================================================
// REST extractor
// ============================================================================

pub struct EarthEngineExtractor {
    client: reqwest::blocking::Client,
    api_url: String,
    session: EarthEngineSession,
}

impl EarthEngineExtractor {
    pub fn new(client: reqwest::blocking::Client, api_url: &str, session: EarthEngineSession) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn compute_url(&self) -> String {
        format!("{}/projects/{}/value:compute", self.api_url, self.session.project)
    }
}

impl SubsetExtractor for EarthEngineExtractor {
    fn extract(&self, request: &SubsetRequest) -> Result<SubsetTable, ExtractError> {
        let response = self
            .client
            .post(self.compute_url())
            .bearer_auth(&self.session.access_token)
            .json(&build_region_expression(request))
            .send()
            .map_err(|e| ExtractError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ExtractError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(ExtractError::HttpError {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        parse_region_response(&body, request)
    }
}

// ============================================================================
// Tests
// ============================================================================
