/// Structured logging for the subset extractor
///
/// Provides context-rich logging with source and site identifiers,
/// timestamps, and severity levels. Supports console output and an
/// optional append-only log file for unattended batch runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    PhenoCam,
    EarthEngine,
    Output,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::PhenoCam => write!(f, "PHENOCAM"),
            DataSource::EarthEngine => write!(f, "GEE"),
            DataSource::Output => write!(f, "OUTPUT"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        // A poisoned lock only means a previous writer panicked mid-log.
        let mut guard = LOGGER.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(logger);
    }

    fn log(&self, level: LogLevel, source: &DataSource, site_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(level, source, site_id, message);
        let site_part = site_part(site_id);

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("{}", message),
                LogLevel::Warning => eprintln!("⚠ {}{}: {}", source, site_part, message),
                LogLevel::Info => println!("{}", message),
                LogLevel::Debug => println!("{}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn site_part(site_id: Option<&str>) -> String {
    site_id.map(|s| format!(" [{}]", s)).unwrap_or_default()
}

/// Formats a timestamped log line as written to the log file.
pub fn format_entry(level: LogLevel, source: &DataSource, site_id: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    format!("{} {} {}{}: {}", timestamp, level, source, site_part(site_id), message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, source: DataSource, site_id: Option<&str>, message: &str) {
    let guard = LOGGER.lock().unwrap_or_else(|e| e.into_inner());
    match guard.as_ref() {
        Some(logger) => logger.log(level, &source, site_id, message),
        // Errors must reach stderr even before init.
        None if level == LogLevel::Error => eprintln!("{}", message),
        None => {}
    }
}

/// Log a general informational message
pub fn info(source: DataSource, site_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, source, site_id, message);
}

/// Log a warning message
pub fn warn(source: DataSource, site_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, source, site_id, message);
}

/// Log an error message
pub fn error(source: DataSource, site_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, source, site_id, message);
}

/// Log a debug message
pub fn debug(source: DataSource, site_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, source, site_id, message);
}

// ---------------------------------------------------------------------------
// Extraction Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of the yearly extraction loop
pub fn log_extraction_summary(site_id: &str, years: usize, rows: usize) {
    let message = format!(
        "Extraction complete: {} year(s), {} row(s)",
        years,
        rows
    );

    if rows == 0 {
        warn(DataSource::EarthEngine, Some(site_id), &message);
    } else {
        debug(DataSource::EarthEngine, Some(site_id), &message);
    }
}
