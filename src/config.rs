/// Environment-based configuration.
///
/// The deployment configures the service through `.env` files (loaded via
/// dotenv) and plain environment variables, one set per machine. Variable
/// names match the operational configuration:
///
/// - `MET_OFFICE_WAVE_FOLDER` / `MET_OFFICE_WIND_FOLDER` — gridded inputs
/// - `MET_OFFICE_NO_OVERTOP_*` / `MET_OFFICE_STORM_BERT_*` — alternate
///   validation datasets selectable per request
/// - `WATER_LEVEL_FILE` / `PENZANCE_WATER_LEVEL_FILE` — tide tables
/// - `DAWLISH_MODELS_FOLDER` / `PENZANCE_MODELS_FOLDER` — model banks
/// - `STATE_FILE` — last-processed block marker
/// - `SPLASH_BLOCK_LOOKBACK_DAYS` — previous-day fallback bound (default 7)

use std::path::PathBuf;

use crate::model::{TwinError, TwinResult};
use crate::sites::Site;

/// Default bound on the previous-day block fallback.
const DEFAULT_LOOKBACK_DAYS: u32 = 7;

// ---------------------------------------------------------------------------
// Dataset options
// ---------------------------------------------------------------------------

/// Which input dataset a request runs against. The live feeds are the
/// default; the other two are frozen validation sets kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetOption {
    /// The live Met Office feeds.
    Standard,
    /// The archived no-overtopping validation period.
    NoOvertopping,
    /// The archived Storm Bert period.
    StormBert,
}

impl DatasetOption {
    /// Parses the request-level option string. The site keys select the
    /// live feeds.
    pub fn parse(option: &str) -> TwinResult<DatasetOption> {
        match option {
            "dawlish" | "penzance" => Ok(DatasetOption::Standard),
            "no_overtopping" => Ok(DatasetOption::NoOvertopping),
            "storm_bert" => Ok(DatasetOption::StormBert),
            other => Err(TwinError::Config(format!("unknown dataset option: {}", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Resolved paths and limits for one site's forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub wave_folder: PathBuf,
    pub wind_folder: PathBuf,
    pub tide_file: PathBuf,
    pub models_folder: PathBuf,
    pub state_file: PathBuf,
    /// How many days the previous-day block fallback may walk back.
    pub block_lookback_days: u32,
}

impl Config {
    /// Resolves the configuration for a site and dataset option from the
    /// environment, loading a `.env` file first if one is present.
    pub fn from_env(site: Site, option: DatasetOption) -> TwinResult<Config> {
        dotenv::dotenv().ok();

        let (wave_var, wind_var) = match option {
            DatasetOption::Standard => ("MET_OFFICE_WAVE_FOLDER", "MET_OFFICE_WIND_FOLDER"),
            DatasetOption::NoOvertopping => (
                "MET_OFFICE_NO_OVERTOP_WAVE_FOLDER",
                "MET_OFFICE_NO_OVERTOP_WIND_FOLDER",
            ),
            DatasetOption::StormBert => (
                "MET_OFFICE_STORM_BERT_WAVE_FOLDER",
                "MET_OFFICE_STORM_BERT_WIND_FOLDER",
            ),
        };
        let (tide_var, models_var) = match site {
            Site::Dawlish => ("WATER_LEVEL_FILE", "DAWLISH_MODELS_FOLDER"),
            Site::Penzance => ("PENZANCE_WATER_LEVEL_FILE", "PENZANCE_MODELS_FOLDER"),
        };

        Ok(Config {
            wave_folder: PathBuf::from(required(wave_var)?),
            wind_folder: PathBuf::from(required(wind_var)?),
            tide_file: PathBuf::from(required(tide_var)?),
            models_folder: PathBuf::from(required(models_var)?),
            state_file: PathBuf::from(required("STATE_FILE")?),
            block_lookback_days: lookback_days()?,
        })
    }
}

fn required(name: &str) -> TwinResult<String> {
    std::env::var(name).map_err(|_| TwinError::Config(format!("{} is not set", name)))
}

fn lookback_days() -> TwinResult<u32> {
    match std::env::var("SPLASH_BLOCK_LOOKBACK_DAYS") {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TwinError::Config(format!("SPLASH_BLOCK_LOOKBACK_DAYS: {:?}", raw))),
        Err(_) => Ok(DEFAULT_LOOKBACK_DAYS),
    }
}
