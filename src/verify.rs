//! Data Source Verification Module
//!
//! Framework for testing a site's configured folders and model bank to
//! determine which inputs are present and usable before a forecast run.
//!
//! Use this after (re)configuring a deployment to validate the layout.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::ingest::tide::read_tide_file;
use crate::ingest::wave::WAVE_FILE_PREFIX;
use crate::ingest::wind::{WIND_DIRECTION_PREFIX, WIND_SPEED_PREFIX};
use crate::model::TwinResult;
use crate::models::ModelBank;
use crate::sites::SiteProfile;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub sites: Vec<SiteVerification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteVerification {
    pub site: String,
    pub status: VerificationStatus,
    /// Wave files matching the block prefix, any date.
    pub wave_files: usize,
    /// Wind files per quantity, any date.
    pub wind_speed_files: usize,
    pub wind_direction_files: usize,
    /// Parsed rows in the tide table.
    pub tide_rows: usize,
    /// Loaded model-bank slots out of the twelve required.
    pub model_slots_loaded: usize,
    pub models_missing: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Site Verification
// ============================================================================

/// Checks one site's configured inputs: counts the gridded files, parses
/// the tide table, and loads the model bank. Failures are recorded in
/// the result rather than propagated, so a partially broken deployment
/// still produces a full report.
pub fn verify_site(profile: &SiteProfile, config: &Config) -> SiteVerification {
    let mut result = SiteVerification {
        site: profile.name.to_string(),
        status: VerificationStatus::Failed,
        wave_files: 0,
        wind_speed_files: 0,
        wind_direction_files: 0,
        tide_rows: 0,
        model_slots_loaded: 0,
        models_missing: Vec::new(),
        error_message: None,
    };

    result.wave_files = count_matching(&config.wave_folder, WAVE_FILE_PREFIX);
    result.wind_speed_files = count_matching(&config.wind_folder, WIND_SPEED_PREFIX);
    result.wind_direction_files = count_matching(&config.wind_folder, WIND_DIRECTION_PREFIX);

    match read_tide_file(&config.tide_file) {
        Ok(series) => result.tide_rows = series.len(),
        Err(e) => result.error_message = Some(format!("tide table: {}", e)),
    }

    match ModelBank::load(&config.models_folder) {
        Ok(bank) => {
            let missing = bank.missing_slots();
            result.model_slots_loaded = 12 - missing.len();
            result.models_missing = missing
                .iter()
                .map(|(family, horizon)| format!("{} {}", family, horizon))
                .collect();
        }
        Err(e) => {
            result.error_message = Some(format!("model bank: {}", e));
        }
    }

    let sources_ok = result.wave_files > 0
        && result.wind_speed_files > 0
        && result.wind_direction_files > 0
        && result.tide_rows > 0;
    let any_source = result.wave_files > 0
        || result.wind_speed_files > 0
        || result.wind_direction_files > 0
        || result.tide_rows > 0;

    result.status = if sources_ok && result.model_slots_loaded == 12 {
        VerificationStatus::Success
    } else if any_source || result.model_slots_loaded > 0 {
        VerificationStatus::PartialSuccess
    } else {
        VerificationStatus::Failed
    };
    result
}

fn count_matching(folder: &std::path::Path, prefix: &str) -> usize {
    let Ok(entries) = std::fs::read_dir(folder) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .count()
}

// ============================================================================
// Full Report
// ============================================================================

/// Verifies every (profile, config) pair handed in and assembles the
/// report.
pub fn run_verification(targets: &[(&SiteProfile, Config)]) -> TwinResult<VerificationReport> {
    let sites = targets
        .iter()
        .map(|(profile, config)| verify_site(profile, config))
        .collect();
    Ok(VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        sites,
    })
}

/// Prints a human-readable summary of a report.
pub fn print_summary(report: &VerificationReport) {
    println!("\n🔍 Forecast Input Verification");
    println!("═══════════════════════════════════════════════════════════");
    for site in &report.sites {
        println!("\n{}", site.site);
        println!("  Status: {:?}", site.status);
        println!("  Wave files: {}", site.wave_files);
        println!(
            "  Wind files: {} speed, {} direction",
            site.wind_speed_files, site.wind_direction_files
        );
        println!("  Tide rows: {}", site.tide_rows);
        println!("  Models: {}/12 loaded", site.model_slots_loaded);
        if !site.models_missing.is_empty() {
            println!("    Missing: {}", site.models_missing.join(", "));
        }
        if let Some(error) = &site.error_message {
            println!("  Error: {}", error);
        }
    }
    println!("\n═══════════════════════════════════════════════════════════\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forest::Forest;
    use crate::sites::{profile, Site};
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> Config {
        Config {
            wave_folder: dir.join("wave"),
            wind_folder: dir.join("wind"),
            tide_file: dir.join("tide.txt"),
            models_folder: dir.join("models"),
            state_file: dir.join("state.txt"),
            block_lookback_days: 7,
        }
    }

    #[test]
    fn test_empty_deployment_fails_verification() {
        let dir = TempDir::new().unwrap();
        let result = verify_site(profile(Site::Dawlish), &config_in(dir.path()));
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(result.wave_files, 0);
    }

    #[test]
    fn test_partial_deployment_reports_partial_success() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.wave_folder).unwrap();
        std::fs::write(
            config
                .wave_folder
                .join("metoffice_wave_amm15_NWS_WAV_b20241105_hi00.nc"),
            b"",
        )
        .unwrap();
        let result = verify_site(profile(Site::Dawlish), &config);
        assert_eq!(result.status, VerificationStatus::PartialSuccess);
        assert_eq!(result.wave_files, 1);
        assert_eq!(result.model_slots_loaded, 0);
    }

    #[test]
    fn test_complete_deployment_succeeds() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        std::fs::create_dir_all(&config.wave_folder).unwrap();
        std::fs::create_dir_all(&config.wind_folder).unwrap();
        std::fs::create_dir_all(&config.models_folder).unwrap();
        std::fs::write(
            config
                .wave_folder
                .join("metoffice_wave_amm15_NWS_WAV_b20241105_hi00.nc"),
            b"",
        )
        .unwrap();
        std::fs::write(config.wind_folder.join("agl_wind-speed-20241105.grib"), b"").unwrap();
        std::fs::write(
            config.wind_folder.join("agl_wind-direction-20241105.grib"),
            b"",
        )
        .unwrap();
        std::fs::write(
            &config.tide_file,
            "h1\nh2\n05/11/2024 00:00 2.0\n05/11/2024 01:00 2.2\n",
        )
        .unwrap();
        for family in ["RF1", "RF3"] {
            for horizon in ["T24", "T48", "T72"] {
                let forest = Forest::constant_classifier(0.7);
                std::fs::write(
                    config.models_folder.join(format!("{}_{}.json", family, horizon)),
                    serde_json::to_string(&forest).unwrap(),
                )
                .unwrap();
            }
        }
        for family in ["RF2", "RF4"] {
            for horizon in ["T24", "T48", "T72"] {
                let forest = Forest::constant_regressor(3.0);
                std::fs::write(
                    config.models_folder.join(format!("{}_{}.json", family, horizon)),
                    serde_json::to_string(&forest).unwrap(),
                )
                .unwrap();
            }
        }

        let result = verify_site(profile(Site::Dawlish), &config);
        assert_eq!(result.status, VerificationStatus::Success);
        assert_eq!(result.model_slots_loaded, 12);
        assert!(result.models_missing.is_empty());
    }
}
