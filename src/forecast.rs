/// End-to-end forecast orchestration for one site: select the block,
/// assemble the feature table, apply any scenario adjustments, load the
/// model bank, run the cascade, and package the two structure series.

use chrono::NaiveDate;

use crate::adjust::{adjust_features, Adjustments};
use crate::assemble::{assemble_block, select_block_date, FileBlockSources};
use crate::cascade::run_cascade;
use crate::config::Config;
use crate::logging::{self, Source};
use crate::models::ModelBank;
use crate::package::{package_predictions, to_json_records, StructureSeries};
use crate::sites::{self, Site};
use crate::model::TwinResult;

/// A finished forecast: the two structure series plus the block that
/// actually produced them (which may be earlier than requested when the
/// fallback engaged).
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub site: Site,
    pub block_date: NaiveDate,
    pub primary: StructureSeries,
    pub secondary: StructureSeries,
}

impl Forecast {
    /// The consumer-facing response body: one record list per structure,
    /// under the site's series keys.
    pub fn to_json(&self) -> serde_json::Value {
        let profile = sites::profile(self.site);
        let mut body = serde_json::Map::new();
        body.insert(
            profile.primary_series_key.to_string(),
            serde_json::to_value(to_json_records(&self.primary)).unwrap_or_default(),
        );
        body.insert(
            profile.secondary_series_key.to_string(),
            serde_json::to_value(to_json_records(&self.secondary)).unwrap_or_default(),
        );
        serde_json::Value::Object(body)
    }
}

/// Runs the full pipeline for a site and requested date.
///
/// The model bank is loaded before any inference and passed by reference
/// into the cascade; the bank never outlives the call, so there is no
/// shared mutable model state between requests.
pub fn run_forecast(
    site: Site,
    requested_date: NaiveDate,
    adjustments: &Adjustments,
    config: &Config,
) -> TwinResult<Forecast> {
    let profile = sites::profile(site);
    logging::info(
        Source::System,
        Some(profile.name),
        &format!("starting forecast for {}", requested_date),
    );

    let sources = FileBlockSources {
        profile,
        wave_folder: config.wave_folder.clone(),
        wind_folder: config.wind_folder.clone(),
        tide_file: config.tide_file.clone(),
    };

    let block_date = select_block_date(profile, &config.state_file, requested_date)?;
    let (table, processed_date) = assemble_block(
        &sources,
        block_date,
        config.block_lookback_days,
        &config.state_file,
    )?;

    let table = if adjustments.is_baseline() {
        table
    } else {
        adjust_features(&table, adjustments)
    };

    let bank = ModelBank::load(&config.models_folder)?;
    let predictions = run_cascade(profile, &bank, &table)?;
    let (primary, secondary) = package_predictions(profile, &predictions);

    logging::info(
        Source::System,
        Some(profile.name),
        &format!(
            "forecast complete: block {}, {} scored timestamps",
            processed_date,
            predictions.len()
        ),
    );

    Ok(Forecast {
        site,
        block_date: processed_date,
        primary,
        secondary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::OvertoppingPoint;
    use chrono::NaiveDate;

    #[test]
    fn test_forecast_json_uses_site_series_keys() {
        let point = OvertoppingPoint {
            time: NaiveDate::from_ymd_opt(2024, 11, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            overtopping_count: 3.0,
            confidence: 0.9,
        };
        let forecast = Forecast {
            site: Site::Dawlish,
            block_date: NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(),
            primary: StructureSeries {
                structure: "Dawlish Seawall Crest",
                railway_scale: false,
                points: vec![point.clone()],
            },
            secondary: StructureSeries {
                structure: "Dawlish Railway Line",
                railway_scale: true,
                points: vec![point],
            },
        };
        let body = forecast.to_json();
        assert!(body.get("seawall_crest_overtopping").is_some());
        assert!(body.get("railway_line_overtopping").is_some());
        assert_eq!(
            body["seawall_crest_overtopping"][0]["time"],
            "Tue, 05 Nov 2024 00:00:00 GMT"
        );
    }
}
