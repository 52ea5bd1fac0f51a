/// PhenoCam camera metadata API client
///
/// Looks up a site by name and returns its coordinates and operating period.
///
/// API: https://phenocam.sr.unh.edu/api/cameras/?Sitename__iexact=<site>

use crate::logging::{self, DataSource};
use crate::model::{SiteInfo, SiteInfoError};
use serde::Deserialize;

// ============================================================================
// API Response Structures
// ============================================================================

/// Paged camera list response. Only the first page is ever read.
#[derive(Debug, Deserialize)]
pub struct CameraListResponse {
    pub count: u64,
    #[serde(default)]
    pub results: Vec<CameraRecord>,
}

/// Single camera record; the API returns many more fields than these.
#[derive(Debug, Deserialize)]
pub struct CameraRecord {
    #[serde(rename = "Sitename")]
    pub sitename: Option<String>,
    #[serde(rename = "Lat")]
    pub lat: Coordinate,
    #[serde(rename = "Lon")]
    pub lon: Coordinate,
    pub date_first: String,
    pub date_last: String,
}

/// Coordinates have been served both as JSON numbers and numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn to_f64(&self, field: &str) -> Result<f64, SiteInfoError> {
        match self {
            Coordinate::Number(v) => Ok(*v),
            Coordinate::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| SiteInfoError::ParseError(format!("{} is not a number: '{}'", field, s))),
        }
    }
}

// ============================================================================
// URL Construction / Parsing
// ============================================================================

/// Builds the site lookup URL. The site name is matched case-insensitively
/// by the API and percent-encoded here.
pub fn build_info_url(base_url: &str, sitename: &str) -> Result<String, SiteInfoError> {
    reqwest::Url::parse_with_params(base_url, &[("Sitename__iexact", sitename)])
        .map(|url| url.to_string())
        .map_err(|e| SiteInfoError::RequestFailed(format!("invalid API URL '{}': {}", base_url, e)))
}

/// Turns a raw API response into site metadata.
///
/// The first matching record wins when the API returns several.
pub fn parse_site_info(sitename: &str, status: u16, body: &str) -> Result<SiteInfo, SiteInfoError> {
    if status != 200 {
        return Err(SiteInfoError::HttpError(status));
    }

    let response: CameraListResponse =
        serde_json::from_str(body).map_err(|e| SiteInfoError::ParseError(e.to_string()))?;

    if response.count == 0 {
        return Err(SiteInfoError::SiteNotFound(sitename.to_string()));
    }

    let record = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| SiteInfoError::SiteNotFound(sitename.to_string()))?;

    Ok(SiteInfo {
        sitename: record.sitename.unwrap_or_else(|| sitename.to_string()),
        latitude: record.lat.to_f64("Lat")?,
        longitude: record.lon.to_f64("Lon")?,
        date_first: record.date_first,
        date_last: record.date_last,
    })
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch site metadata for `sitename`.
///
/// Every failure is reported on standard error before the error is
/// returned; the caller decides whether to exit.
pub fn fetch_site_info(
    client: &reqwest::blocking::Client,
    base_url: &str,
    sitename: &str,
) -> Result<SiteInfo, SiteInfoError> {
    let result = request_site_info(client, base_url, sitename);
    if let Err(ref err) = result {
        for line in failure_messages(sitename, err) {
            logging::error(DataSource::PhenoCam, Some(sitename), &line);
        }
    }
    result
}

fn request_site_info(
    client: &reqwest::blocking::Client,
    base_url: &str,
    sitename: &str,
) -> Result<SiteInfo, SiteInfoError> {
    let url = build_info_url(base_url, sitename)?;
    logging::debug(DataSource::PhenoCam, Some(sitename), &format!("GET {}", url));

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .map_err(|e| SiteInfoError::RequestFailed(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|e| SiteInfoError::RequestFailed(e.to_string()))?;

    parse_site_info(sitename, status, &body)
}

/// Lines written to standard error for a failed lookup.
pub fn failure_messages(sitename: &str, err: &SiteInfoError) -> Vec<String> {
    match err {
        SiteInfoError::HttpError(code) => vec![
            format!("Error getting site info for {}.", sitename),
            format!("HTTP Status_code: {}", code),
        ],
        SiteInfoError::SiteNotFound(_) => vec![format!("Site {} not found.", sitename)],
        other => vec![format!("Error getting site info for {}: {}", sitename, other)],
    }
}

// ============================================================================
// Tests
// ============================================================================


// ---------------------------------------------------------------------------
// Integration Tests - live PhenoCam API
// ---------------------------------------------------------------------------
//
// Marked #[ignore] so CI does not depend on the PhenoCam server.
//
//   cargo test -- --ignored phenocam_api
