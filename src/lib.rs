/// Extracts yearly MODIS reflectance subsets for a PhenoCam site and saves
/// them as a single CSV file.

pub mod config;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod table;
