/// Console/log output of a site run.
///
/// Lives in its own test binary because it installs the global logger with
/// a log file, and the lines it checks must come from this run only.
///
/// Run with: cargo test --test run_output

use chrono::Datelike;
use gee_subset::config::ExtractionSettings;
use gee_subset::ingest::earthengine::SubsetExtractor;
use gee_subset::logging::{init_logger, LogLevel};
use gee_subset::model::{Cell, ExtractError, SiteInfo, SubsetRequest};
use gee_subset::pipeline::extract_site;
use gee_subset::table::SubsetTable;

/// Returns `year - 2014` rows per year.
struct CountingExtractor;

impl SubsetExtractor for CountingExtractor {
    fn extract(&self, request: &SubsetRequest) -> Result<SubsetTable, ExtractError> {
        let year = request.window.start.year();
        let mut table = SubsetTable::new(vec!["date".to_string()]);
        for day in 0..(year - 2014) {
            table.push_row(vec![Cell::Text(format!("{}-01-{:02}", year, day + 1))]);
        }
        Ok(table)
    }
}

#[test]
fn test_run_logs_each_year_and_saved_line_count() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("gee_subset.log");
    init_logger(LogLevel::Info, Some(log_path.to_str().unwrap()), false);

    let site = SiteInfo {
        sitename: "harvard".to_string(),
        latitude: 42.5378,
        longitude: -72.1715,
        date_first: "2015-06-01".to_string(),
        date_last: "2017-01-01".to_string(),
    };

    let summary = extract_site(&site, &ExtractionSettings::default(), &CountingExtractor, dir.path()).unwrap();
    assert_eq!(summary.rows_written, 1 + 2 + 3);

    let log = std::fs::read_to_string(&log_path).unwrap();
    let year_lines: Vec<&str> = log.lines().filter(|l| l.contains("year: ")).collect();
    assert_eq!(year_lines.len(), 3);
    assert!(year_lines[0].ends_with("GEE [harvard]: year: 2015"), "got '{}'", year_lines[0]);
    assert!(year_lines[1].ends_with("GEE [harvard]: year: 2016"));
    assert!(year_lines[2].ends_with("GEE [harvard]: year: 2017"));

    let expected = format!("INFO OUTPUT [harvard]: {} lines saved to output file", summary.rows_written);
    assert!(log.lines().any(|l| l.ends_with(&expected)), "missing '{}' in:\n{}", expected, log);
}
