/// The four-stage conditional model cascade.
///
/// Each feature-table row is scored independently: the horizon variant is
/// selected from the row's lead time, RF1 answers whether the primary
/// structure overtops, the revision rules trim that verdict, and only a
/// surviving positive goes on to the count model (RF2) and the secondary
/// structure's classifier/regressor pair (RF3/RF4). A suppressed verdict
/// short-circuits the whole remainder of the row to zeros.
///
/// The secondary count is capped by the primary count: the sheltered
/// structure cannot see more overtopping events than the one in front
/// of it.

pub mod revision;

use chrono::NaiveDateTime;

use crate::model::{
    FeatureTable, Horizon, ModelFamily, TwinResult, HOURLY_LEAD_LIMIT,
};
use crate::models::ModelBank;
use crate::sites::SiteProfile;

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

/// The cascade's verdicts and counts for a single timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub time: NaiveDateTime,
    /// Horizon variant the row was scored with.
    pub horizon: Horizon,
    /// Final (revised) primary occurrence verdict, 0 or 1.
    pub rf1_verdict: u8,
    /// Positive-class probability behind the primary verdict.
    pub rf1_confidence: f64,
    /// Predicted overtopping count at the primary structure.
    pub primary_count: f64,
    /// Predicted overtopping count at the secondary structure.
    pub secondary_count: f64,
    /// Positive-class probability behind the secondary verdict;
    /// 0 whenever the secondary branch was not computed.
    pub rf3_confidence: f64,
}

// ---------------------------------------------------------------------------
// Horizon selection
// ---------------------------------------------------------------------------

/// Selects the horizon variant for a lead time in hours. The 48 h
/// boundary inequality is site-specific (see `SiteProfile`).
pub fn horizon_for(profile: &SiteProfile, lead_hours: f64) -> Horizon {
    if lead_hours < 24.0 {
        Horizon::T24
    } else if lead_hours < 48.0 || (profile.t48_upper_inclusive && lead_hours <= 48.0) {
        Horizon::T48
    } else {
        Horizon::T72
    }
}

/// Pre-assigns the horizon variant for every table row, measured from
/// the first row's timestamp.
pub fn horizon_column(profile: &SiteProfile, table: &FeatureTable) -> Vec<Horizon> {
    let Some(start) = table.start_time() else {
        return Vec::new();
    };
    table
        .rows
        .iter()
        .map(|row| horizon_for(profile, lead_hours(row.time, start)))
        .collect()
}

fn lead_hours(time: NaiveDateTime, start: NaiveDateTime) -> f64 {
    (time - start).num_seconds() as f64 / 3600.0
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// Runs the cascade over every applicable row of the table.
///
/// Penzance predicts only on its declared cadence (hourly to 54 h, then
/// 3-hourly): off-grid rows are absent from the output, not zero-filled.
/// Dawlish scores every row. A `MissingModel` lookup aborts the run.
pub fn run_cascade(
    profile: &SiteProfile,
    bank: &ModelBank,
    table: &FeatureTable,
) -> TwinResult<Vec<PredictionRow>> {
    let Some(start) = table.start_time() else {
        return Ok(Vec::new());
    };
    let horizons = horizon_column(profile, table);

    let mut predictions = Vec::with_capacity(table.len());
    for (row, horizon) in table.rows.iter().zip(horizons) {
        let lead = lead_hours(row.time, start);
        if profile.skip_offgrid_rows && lead > HOURLY_LEAD_LIMIT && lead % 3.0 != 0.0 {
            continue;
        }

        let features = row.features();

        let rf1 = bank.model(ModelFamily::Rf1, horizon)?;
        let rf1_raw = if rf1.predict(&features) != 0.0 { 1 } else { 0 };
        let rf1_confidence = rf1.predict_proba(&features)[1];
        let rf1_verdict = revision::revise_rf1(profile, rf1_raw, row);

        if rf1_verdict == 0 {
            predictions.push(PredictionRow {
                time: row.time,
                horizon,
                rf1_verdict: 0,
                rf1_confidence,
                primary_count: 0.0,
                secondary_count: 0.0,
                rf3_confidence: 0.0,
            });
            continue;
        }

        let rf2 = bank.model(ModelFamily::Rf2, horizon)?;
        let primary_count = rf2.predict(&features);

        let rf3 = bank.model(ModelFamily::Rf3, horizon)?;
        let rf3_raw = if rf3.predict(&features) != 0.0 { 1 } else { 0 };
        let rf3_confidence = rf3.predict_proba(&features)[1];
        let rf3_verdict = revision::revise_rf3(profile, rf3_raw, row);

        let secondary_count = if rf3_verdict == 0 {
            0.0
        } else {
            let rf4 = bank.model(ModelFamily::Rf4, horizon)?;
            rf4.predict(&features).min(primary_count)
        };

        predictions.push(PredictionRow {
            time: row.time,
            horizon,
            rf1_verdict: 1,
            rf1_confidence,
            primary_count,
            secondary_count,
            rf3_confidence,
        });
    }
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::{profile, Site};

    #[test]
    fn test_dawlish_horizon_boundaries() {
        let dawlish = profile(Site::Dawlish);
        assert_eq!(horizon_for(dawlish, 0.0), Horizon::T24);
        assert_eq!(horizon_for(dawlish, 23.9), Horizon::T24);
        // Exactly 24 h fails the < 24 test and falls into T48.
        assert_eq!(horizon_for(dawlish, 24.0), Horizon::T48);
        assert_eq!(horizon_for(dawlish, 47.9), Horizon::T48);
        // Dawlish's upper bound is exclusive: 48 h is already T72.
        assert_eq!(horizon_for(dawlish, 48.0), Horizon::T72);
        assert_eq!(horizon_for(dawlish, 71.0), Horizon::T72);
    }

    #[test]
    fn test_penzance_horizon_boundary_is_inclusive_at_48() {
        let penzance = profile(Site::Penzance);
        assert_eq!(horizon_for(penzance, 24.0), Horizon::T48);
        assert_eq!(horizon_for(penzance, 48.0), Horizon::T48);
        assert_eq!(horizon_for(penzance, 48.1), Horizon::T72);
    }
}
