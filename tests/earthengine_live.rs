/// Live Earth Engine check.
///
/// Needs EE_PROJECT and EE_ACCESS_TOKEN (environment or .env) and network.
/// Marked #[ignore] so CI does not depend on credentials:
///
///   cargo test --test earthengine_live -- --ignored

use chrono::NaiveDate;
use gee_subset::config::EARTHENGINE_API_URL;
use gee_subset::ingest::earthengine::{EarthEngineExtractor, EarthEngineSession, SubsetExtractor};
use gee_subset::model::{DateWindow, SubsetRequest, DEFAULT_BANDS, DEFAULT_PRODUCT};

#[test]
#[ignore] // Don't run in CI - depends on external API and credentials
fn earthengine_harvard_january_returns_daily_rows() {
    let session = EarthEngineSession::from_env().expect("EE_PROJECT and EE_ACCESS_TOKEN must be set");
    let extractor = EarthEngineExtractor::new(reqwest::blocking::Client::new(), EARTHENGINE_API_URL, session);

    let request = SubsetRequest {
        product: DEFAULT_PRODUCT.to_string(),
        bands: DEFAULT_BANDS.iter().map(|b| b.to_string()).collect(),
        window: DateWindow {
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2015, 2, 1).unwrap(),
        },
        latitude: 42.5378,
        longitude: -72.1715,
        scale: 500.0,
        pad_km: 0.0,
    };

    let table = extractor.extract(&request).expect("region request should succeed");
    println!("   ✓ {} rows for January 2015", table.len());
    assert!(table.len() > 0 && table.len() <= 31);
    assert!(table.column_index("Nadir_Reflectance_Band1").is_some());
}
