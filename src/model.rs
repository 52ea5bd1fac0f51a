/// Core data types for the site subset extractor.
///
/// This module defines the shared domain model imported by all other modules:
/// site metadata, subset requests, the tabular result, and the error types
/// each stage can produce. It contains no I/O.

use chrono::NaiveDate;
use std::fmt;

// ---------------------------------------------------------------------------
// Product defaults
// ---------------------------------------------------------------------------

/// MODIS collection 6 BRDF-adjusted daily reflectance.
pub const DEFAULT_PRODUCT: &str = "MODIS/006/MCD43A4";

/// Red, NIR and blue nadir reflectance, enough to derive NDVI and EVI.
pub const DEFAULT_BANDS: &[&str] = &[
    "Nadir_Reflectance_Band1",
    "Nadir_Reflectance_Band2",
    "Nadir_Reflectance_Band3",
];

/// Native MODIS resolution in metres.
pub const DEFAULT_SCALE_M: f64 = 500.0;

/// Last year extracted unless configured otherwise.
pub const DEFAULT_END_YEAR: i32 = 2017;

// ---------------------------------------------------------------------------
// Site metadata
// ---------------------------------------------------------------------------

/// Location and operating period of a PhenoCam site.
///
/// Produced by `ingest::phenocam::parse_site_info` from the first matching
/// record of the camera API. Dates are kept as the API reports them
/// (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq)]
pub struct SiteInfo {
    pub sitename: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date_first: String,
    pub date_last: String,
}

// ---------------------------------------------------------------------------
// Subset requests
// ---------------------------------------------------------------------------

/// Half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

/// Everything the extractor needs for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetRequest {
    pub product: String,
    pub bands: Vec<String>,
    pub window: DateWindow,
    pub latitude: f64,
    pub longitude: f64,
    /// Spatial resolution in metres.
    pub scale: f64,
    /// Half-width of the sampling box in kilometres; 0 samples a single point.
    pub pad_km: f64,
}

// ---------------------------------------------------------------------------
// Tabular results
// ---------------------------------------------------------------------------

/// A single value in a subset table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Converts a JSON scalar as returned by the extraction service.
    /// Arrays and objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Cell {
        match value {
            serde_json::Value::Null => Cell::Null,
            serde_json::Value::Bool(b) => Cell::Text(b.to_string()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Integer(i),
                None => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            },
            serde_json::Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when looking up a site in the PhenoCam API.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteInfoError {
    /// Non-200 HTTP response from the camera API.
    HttpError(u16),
    /// The request never produced a response (DNS, TLS, connection reset).
    RequestFailed(String),
    /// The response body could not be deserialized.
    ParseError(String),
    /// The API answered but reported zero matching sites.
    SiteNotFound(String),
}

impl fmt::Display for SiteInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteInfoError::HttpError(code) => write!(f, "HTTP error: {}", code),
            SiteInfoError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            SiteInfoError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SiteInfoError::SiteNotFound(site) => write!(f, "Site {} not found", site),
        }
    }
}

impl std::error::Error for SiteInfoError {}

/// Errors from the yearly extraction loop and the extraction service.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// `date_first` did not start with a four digit year.
    InvalidDate(String),
    /// The site's first year is after the configured end year.
    EmptyYearRange { start: i32, end: i32 },
    /// The request never produced a response.
    RequestFailed(String),
    /// Non-2xx response from the extraction service.
    HttpError { status: u16, message: String },
    /// The response could not be turned into a table.
    ParseError(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::InvalidDate(date) => write!(f, "Invalid date: {}", date),
            ExtractError::EmptyYearRange { start, end } => {
                write!(f, "No years to extract: start year {} is after end year {}", start, end)
            }
            ExtractError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            ExtractError::HttpError { status, message } => {
                write!(f, "HTTP error: {} {}", status, message)
            }
            ExtractError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Errors writing the combined table to disk.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputError {
    Io(String),
    Csv(String),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Io(msg) => write!(f, "I/O error: {}", msg),
            OutputError::Csv(msg) => write!(f, "CSV error: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}

impl From<std::io::Error> for OutputError {
    fn from(err: std::io::Error) -> Self {
        OutputError::Io(err.to_string())
    }
}

impl From<csv::Error> for OutputError {
    fn from(err: csv::Error) -> Self {
        OutputError::Csv(err.to_string())
    }
}

/// Errors loading configuration or credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    /// A required environment variable is unset or empty.
    MissingCredential(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::MissingCredential(name) => {
                write!(f, "Missing credential: environment variable {} is not set", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level error returned by a complete run.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    SiteInfo(SiteInfoError),
    Extract(ExtractError),
    Output(OutputError),
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::SiteInfo(e) => write!(f, "{}", e),
            AppError::Extract(e) => write!(f, "{}", e),
            AppError::Output(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::SiteInfo(e) => Some(e),
            AppError::Extract(e) => Some(e),
            AppError::Output(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

impl From<SiteInfoError> for AppError {
    fn from(err: SiteInfoError) -> Self {
        AppError::SiteInfo(err)
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Extract(err)
    }
}

impl From<OutputError> for AppError {
    fn from(err: OutputError) -> Self {
        AppError::Output(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}
