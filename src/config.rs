/// Run configuration.
///
/// Settings come from an optional TOML file (`gee_subset.toml` in the working
/// directory unless a path is given). Every key has a default, so an absent
/// file or an empty one yields the stock MODIS extraction. Credentials are
/// never read from this file; see `ingest::earthengine::EarthEngineSession`.

use crate::model::{
    ConfigError, DEFAULT_BANDS, DEFAULT_END_YEAR, DEFAULT_PRODUCT, DEFAULT_SCALE_M,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "./gee_subset.toml";
pub const PHENOCAM_API_URL: &str = "https://phenocam.sr.unh.edu/api/cameras/";
pub const EARTHENGINE_API_URL: &str = "https://earthengine.googleapis.com/v1";
pub const DEFAULT_OUTPUT_DIR: &str = "./modis_time_series";

/// Bounds for `end_year`; MODIS Terra data start in 2000.
pub const MIN_END_YEAR: i32 = 2000;
pub const MAX_END_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub phenocam_api_url: String,
    pub earthengine_api_url: String,
    pub product: String,
    pub bands: Vec<String>,
    /// Spatial resolution in metres.
    pub scale: f64,
    pub pad_km: f64,
    /// Last year extracted, inclusive.
    pub end_year: i32,
    pub output_dir: PathBuf,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            phenocam_api_url: PHENOCAM_API_URL.to_string(),
            earthengine_api_url: EARTHENGINE_API_URL.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            bands: DEFAULT_BANDS.iter().map(|b| b.to_string()).collect(),
            scale: DEFAULT_SCALE_M,
            pad_km: 0.0,
            end_year: DEFAULT_END_YEAR,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_file: None,
        }
    }
}

/// The part of the configuration the yearly loop needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSettings {
    pub product: String,
    pub bands: Vec<String>,
    pub scale: f64,
    pub pad_km: f64,
    pub end_year: i32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Config::default().extraction_settings()
    }
}

impl Config {
    pub fn extraction_settings(&self) -> ExtractionSettings {
        ExtractionSettings {
            product: self.product.clone(),
            bands: self.bands.clone(),
            scale: self.scale,
            pad_km: self.pad_km,
            end_year: self.end_year,
        }
    }
}

/// Checks an end year from the config file or the command line.
pub fn validate_end_year(year: i32) -> Result<i32, ConfigError> {
    if (MIN_END_YEAR..=MAX_END_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(ConfigError::Parse(format!(
            "end_year must be between {} and {}, got {}",
            MIN_END_YEAR, MAX_END_YEAR, year
        )))
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if config.bands.is_empty() {
        return Err(ConfigError::Parse("bands must list at least one band".to_string()));
    }
    if !(config.scale > 0.0) {
        return Err(ConfigError::Parse(format!("scale must be positive, got {}", config.scale)));
    }
    if config.pad_km < 0.0 {
        return Err(ConfigError::Parse(format!("pad_km must not be negative, got {}", config.pad_km)));
    }
    validate_end_year(config.end_year)?;

    Ok(config)
}

/// Loads configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    parse_config(&text)
}

/// Loads the explicit path if given; otherwise the default path if it
/// exists; otherwise built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}
