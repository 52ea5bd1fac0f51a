use clap::Parser;
use gee_subset::config::{self, Config};
use gee_subset::ingest::earthengine::{EarthEngineExtractor, EarthEngineSession};
use gee_subset::ingest::phenocam;
use gee_subset::logging::{self, DataSource, LogLevel};
use gee_subset::model::{AppError, SiteInfo};
use gee_subset::pipeline;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Extract reflectances to be used to create EVI and NDVI time series for a site's location.",
    after_help = "Reflectances come from the MODIS MCD43A4 collection on Google Earth Engine. \
                  Set EE_PROJECT and EE_ACCESS_TOKEN (or put them in .env) before running."
)]
struct Args {
    /// verbose debugging
    #[arg(short, long)]
    verbose: bool,

    /// TOML configuration file (defaults to ./gee_subset.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// last year to extract, inclusive
    #[arg(long)]
    end_year: Option<i32>,

    /// directory the CSV is written to (must exist)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// PhenoCam site name
    sitename: String,
}

fn print_site(site: &SiteInfo) {
    let id = Some(site.sitename.as_str());
    logging::debug(DataSource::PhenoCam, id, &format!("Lat: {}", site.latitude));
    logging::debug(DataSource::PhenoCam, id, &format!("Lon: {}", site.longitude));
    logging::debug(DataSource::PhenoCam, id, &format!("Date First: {}", site.date_first));
    logging::debug(DataSource::PhenoCam, id, &format!("Date Last: {}", site.date_last));
}

fn run(
    args: &Args,
    mut config: Config,
    client: reqwest::blocking::Client,
) -> Result<pipeline::ExtractionSummary, AppError> {
    if let Some(end_year) = args.end_year {
        config.end_year = config::validate_end_year(end_year)?;
    }
    if let Some(ref dir) = args.output_dir {
        config.output_dir = dir.clone();
    }

    let site = phenocam::fetch_site_info(&client, &config.phenocam_api_url, &args.sitename)?;
    print_site(&site);

    // Fail before any extraction if credentials are missing.
    let session = EarthEngineSession::from_env()?;
    logging::debug(
        DataSource::EarthEngine,
        None,
        &format!("Earth Engine project: {}", session.project),
    );
    let extractor = EarthEngineExtractor::new(client, &config.earthengine_api_url, session);

    pipeline::extract_site(
        &site,
        &config.extraction_settings(),
        &extractor,
        &config.output_dir,
    )
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match config::load_or_default(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let min_level = if args.verbose { LogLevel::Debug } else { LogLevel::Info };
    logging::init_logger(min_level, config.log_file.as_deref(), false);

    logging::debug(DataSource::System, None, &format!("Verbose: {}", args.verbose));
    logging::debug(DataSource::System, None, &format!("Site Name: {}", args.sitename));

    let client = match reqwest::blocking::Client::builder()
        .user_agent(concat!("gee_subset/", env!("CARGO_PKG_VERSION")))
        // Yearly region requests can run for minutes; wait for them.
        .timeout(None::<std::time::Duration>)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("Failed to build HTTP client: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match run(&args, config, client) {
        Ok(_) => ExitCode::SUCCESS,
        // Fetch failures were already reported by the fetcher.
        Err(AppError::SiteInfo(_)) => ExitCode::FAILURE,
        Err(e) => {
            logging::error(DataSource::System, Some(&args.sitename), &e.to_string());
            ExitCode::FAILURE
        }
    }
}
