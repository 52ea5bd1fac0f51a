/// One complete site run: yearly extraction followed by the CSV write.

use crate::config::ExtractionSettings;
use crate::extract;
use crate::ingest::earthengine::SubsetExtractor;
use crate::logging::{self, DataSource};
use crate::model::{AppError, SiteInfo};
use crate::output;
use std::path::{Path, PathBuf};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSummary {
    pub sitename: String,
    pub years: Vec<i32>,
    pub rows_written: usize,
    pub output_file: PathBuf,
}

/// Extracts every year for `site` and writes `<output_dir>/<site>_gee_subset.csv`.
///
/// Prints `year: <year>` before each extraction and the saved line count at
/// the end.
pub fn extract_site<E>(
    site: &SiteInfo,
    settings: &ExtractionSettings,
    extractor: &E,
    output_dir: &Path,
) -> Result<ExtractionSummary, AppError>
where
    E: SubsetExtractor + ?Sized,
{
    let mut years = Vec::new();
    let table = extract::extract_years(extractor, site, settings, |year| {
        logging::info(DataSource::EarthEngine, Some(&site.sitename), &format!("year: {}", year));
        years.push(year);
    })?;
    logging::log_extraction_summary(&site.sitename, years.len(), table.len());

    let output_file = output::output_path(output_dir, &site.sitename);
    let rows_written = output::write_csv(&table, &output_file)?;
    logging::info(
        DataSource::Output,
        Some(&site.sitename),
        &format!("{} lines saved to output file", rows_written),
    );

    Ok(ExtractionSummary {
        sitename: site.sitename.clone(),
        years,
        rows_written,
        output_file,
    })
}
