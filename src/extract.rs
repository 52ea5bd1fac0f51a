/// Yearly extraction loop.
///
/// MCD43A4 is a daily product, so a full site record is far too many layers
/// for one request. The record is split into calendar years, each year is
/// extracted on its own, and the yearly tables are appended in order.

use crate::config::ExtractionSettings;
use crate::ingest::earthengine::SubsetExtractor;
use crate::model::{DateWindow, ExtractError, SiteInfo, SubsetRequest};
use crate::table::SubsetTable;
use chrono::{Datelike, NaiveDate};
use std::ops::RangeInclusive;

/// Year component of an ISO date such as `2015-06-01`.
pub fn start_year(date_first: &str) -> Result<i32, ExtractError> {
    if let Ok(date) = NaiveDate::parse_from_str(date_first.trim(), "%Y-%m-%d") {
        return Ok(date.year());
    }

    // Some records carry only a partial date; the year prefix is enough.
    let year = date_first.trim().split('-').next().unwrap_or("");
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        year.parse().map_err(|_| ExtractError::InvalidDate(date_first.to_string()))
    } else {
        Err(ExtractError::InvalidDate(date_first.to_string()))
    }
}

/// January 1 of `year` up to, not including, January 1 of the next year.
pub fn year_window(year: i32) -> Result<DateWindow, ExtractError> {
    let jan1 = |y: i32| {
        NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(|| ExtractError::InvalidDate(format!("{}-01-01", y)))
    };
    Ok(DateWindow {
        start: jan1(year)?,
        end: jan1(year + 1)?,
    })
}

/// Inclusive range of years to extract for a site.
pub fn years_to_extract(site: &SiteInfo, end_year: i32) -> Result<RangeInclusive<i32>, ExtractError> {
    let start = start_year(&site.date_first)?;
    if start > end_year {
        return Err(ExtractError::EmptyYearRange { start, end: end_year });
    }
    Ok(start..=end_year)
}

/// The request issued for one year at one site.
pub fn build_request(site: &SiteInfo, settings: &ExtractionSettings, year: i32) -> Result<SubsetRequest, ExtractError> {
    Ok(SubsetRequest {
        product: settings.product.clone(),
        bands: settings.bands.clone(),
        window: year_window(year)?,
        latitude: site.latitude,
        longitude: site.longitude,
        scale: settings.scale,
        pad_km: settings.pad_km,
    })
}

/// Runs one extraction per year and concatenates the results.
///
/// `on_year` is called before each request. The first failed request stops
/// the loop; tables already extracted are dropped with it.
pub fn extract_years<E, F>(
    extractor: &E,
    site: &SiteInfo,
    settings: &ExtractionSettings,
    mut on_year: F,
) -> Result<SubsetTable, ExtractError>
where
    E: SubsetExtractor + ?Sized,
    F: FnMut(i32),
{
    let mut yearly = Vec::new();

    for year in years_to_extract(site, settings.end_year)? {
        on_year(year);
        let request = build_request(site, settings, year)?;
        yearly.push(extractor.extract(&request)?);
    }

    Ok(SubsetTable::concat(yearly))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;
    use std::cell::RefCell;

    /// Records every request and returns `rows_per_year` rows per call.
    struct RecordingExtractor {
        calls: RefCell<Vec<SubsetRequest>>,
        rows_per_year: usize,
        fail_on_year: Option<i32>,
    }

    impl RecordingExtractor {
        fn new(rows_per_year: usize) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                rows_per_year,
                fail_on_year: None,
            }
        }
    }

    impl SubsetExtractor for RecordingExtractor {
        fn extract(&self, request: &SubsetRequest) -> Result<SubsetTable, ExtractError> {
            self.calls.borrow_mut().push(request.clone());
            let year = request.window.start.year();
            if self.fail_on_year == Some(year) {
                return Err(ExtractError::HttpError { status: 500, message: "boom".into() });
            }
            let mut table = SubsetTable::new(vec!["year".into(), "row".into()]);
            for i in 0..self.rows_per_year {
                table.push_row(vec![Cell::Integer(year as i64), Cell::Integer(i as i64)]);
            }
            Ok(table)
        }
    }

    fn site(date_first: &str) -> SiteInfo {
        SiteInfo {
            sitename: "harvard".to_string(),
            latitude: 42.5378,
            longitude: -72.1715,
            date_first: date_first.to_string(),
            date_last: "2017-01-01".to_string(),
        }
    }

    #[test]
    fn test_start_year_from_full_and_partial_dates() {
        assert_eq!(start_year("2015-06-01").unwrap(), 2015);
        assert_eq!(start_year("2008-04").unwrap(), 2008);
        assert!(matches!(start_year("June 2015"), Err(ExtractError::InvalidDate(_))));
        assert!(start_year("").is_err());
    }

    #[test]
    fn test_year_window_spans_calendar_year() {
        let window = year_window(2016).unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2017, 1, 1).unwrap());
    }

    #[test]
    fn test_one_call_per_year_inclusive() {
        let extractor = RecordingExtractor::new(2);
        let settings = ExtractionSettings::default();

        let mut announced = Vec::new();
        extract_years(&extractor, &site("2015-06-01"), &settings, |y| announced.push(y)).unwrap();

        let years: Vec<i32> = extractor.calls.borrow().iter().map(|r| r.window.start.year()).collect();
        assert_eq!(years, vec![2015, 2016, 2017]);
        assert_eq!(announced, vec![2015, 2016, 2017]);
    }

    #[test]
    fn test_requests_carry_site_and_product_settings() {
        let extractor = RecordingExtractor::new(1);
        let settings = ExtractionSettings::default();
        extract_years(&extractor, &site("2017-03-15"), &settings, |_| {}).unwrap();

        let calls = extractor.calls.borrow();
        assert_eq!(calls.len(), 1);
        let req = &calls[0];
        assert_eq!(req.product, "MODIS/006/MCD43A4");
        assert_eq!(req.bands.len(), 3);
        assert_eq!(req.scale, 500.0);
        assert_eq!(req.pad_km, 0.0);
        assert_eq!(req.latitude, 42.5378);
        assert_eq!(req.longitude, -72.1715);
        assert_eq!(req.window.to_string(), "2017-01-01..2018-01-01");
    }

    #[test]
    fn test_combined_rows_equal_sum_in_year_order() {
        let extractor = RecordingExtractor::new(3);
        let settings = ExtractionSettings::default();
        let table = extract_years(&extractor, &site("2015-06-01"), &settings, |_| {}).unwrap();

        assert_eq!(table.len(), 9);
        let years: Vec<_> = table.column_values("year").unwrap().cloned().collect();
        assert_eq!(years[0], Cell::Integer(2015));
        assert_eq!(years[3], Cell::Integer(2016));
        assert_eq!(years[8], Cell::Integer(2017));
    }

    #[test]
    fn test_years_to_extract_is_inclusive() {
        let years: Vec<i32> = years_to_extract(&site("2015-06-01"), 2017).unwrap().collect();
        assert_eq!(years, vec![2015, 2016, 2017]);
        assert_eq!(years_to_extract(&site("2017-01-01"), 2017).unwrap().count(), 1);
    }

    #[test]
    fn test_start_after_end_year_is_empty_range() {
        let extractor = RecordingExtractor::new(1);
        let settings = ExtractionSettings::default();
        let err = extract_years(&extractor, &site("2019-01-01"), &settings, |_| {}).unwrap_err();
        assert_eq!(err, ExtractError::EmptyYearRange { start: 2019, end: 2017 });
        assert!(extractor.calls.borrow().is_empty());
    }

    #[test]
    fn test_extraction_failure_stops_the_loop() {
        let mut extractor = RecordingExtractor::new(1);
        extractor.fail_on_year = Some(2016);
        let settings = ExtractionSettings::default();

        let err = extract_years(&extractor, &site("2015-06-01"), &settings, |_| {}).unwrap_err();
        assert!(matches!(err, ExtractError::HttpError { status: 500, .. }));
        // 2017 never requested
        assert_eq!(extractor.calls.borrow().len(), 2);
    }
}
