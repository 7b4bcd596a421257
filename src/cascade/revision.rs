/// Post-hoc correction of the occurrence classifiers' raw verdicts.
///
/// Each site ships threshold rules tuned against its validation seasons
/// to trim known false positives (and, at Penzance, recover known false
/// negatives). The shapes differ: Dawlish applies one combined sweet-spot
/// check per classifier, Penzance applies five independent overrides in a
/// fixed order. All comparisons treat NaN features as outside every band,
/// so gap rows can only lose a positive verdict, never gain one.
///
/// The numbers are calibration constants tied to the trained models;
/// changing any of them invalidates the validation runs.

use crate::model::FeatureRow;
use crate::sites::{RevisionScheme, SiteProfile, Sweetspot};

// ---------------------------------------------------------------------------
// Penzance sequential-override calibration
// ---------------------------------------------------------------------------

/// Positive verdicts below this wave height are suppressed (m).
const HS_SUPPRESS_BELOW: f64 = 0.84;
/// Wave-height bands (inclusive) where a negative verdict is recovered.
const HS_RECOVER_BANDS: [(f64, f64); 2] = [(2.08, 2.17), (2.32, 2.37)];
/// Positive verdicts below this wind speed are suppressed (m/s).
const WIND_SUPPRESS_BELOW: f64 = 2.8;
/// Positive verdicts above this wind direction are suppressed (degrees).
const WIND_DIR_SUPPRESS_ABOVE: f64 = 300.0;
/// Exact wave directions where a negative verdict is recovered (degrees).
const WAVE_DIR_RECOVER: [f64; 7] = [98.0, 99.0, 100.0, 102.0, 103.0, 104.0, 107.0];
/// Freeboard bands (inclusive) where a positive verdict is suppressed (m).
const FREEBOARD_SUPPRESS_BANDS: [(f64, f64); 4] = [
    (5.367, 5.491),
    (5.561, 5.647),
    (3.615, 3.692),
    (5.677, 5.788),
];

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Revises the primary (RF1) verdict according to the site's scheme.
pub fn revise_rf1(profile: &SiteProfile, verdict: u8, row: &FeatureRow) -> u8 {
    match &profile.revision {
        RevisionScheme::Sweetspot { rf1, .. } => sweetspot_revise(verdict, rf1, row),
        RevisionScheme::Sequential => sequential_revise(verdict, row),
    }
}

/// Revises the secondary (RF3) verdict. Only the sweet-spot scheme
/// touches RF3; the sequential scheme leaves it as predicted.
pub fn revise_rf3(profile: &SiteProfile, verdict: u8, row: &FeatureRow) -> u8 {
    match &profile.revision {
        RevisionScheme::Sweetspot { rf3, .. } => sweetspot_revise(verdict, rf3, row),
        RevisionScheme::Sequential => verdict,
    }
}

// ---------------------------------------------------------------------------
// Sweet-spot scheme (Dawlish)
// ---------------------------------------------------------------------------

/// A positive verdict survives only if at least one driver sits in its
/// sweet spot; negatives pass through untouched.
fn sweetspot_revise(verdict: u8, spot: &Sweetspot, row: &FeatureRow) -> u8 {
    let hs_sweetspot = row.hs > spot.hs;
    let wind_sweetspot = row.wind_speed > spot.wind;
    let wave_dir_sweetspot =
        spot.wave_dir_min <= row.shore_wave_dir && row.shore_wave_dir <= spot.wave_dir_max;
    if verdict == 1 && !(hs_sweetspot || wind_sweetspot || wave_dir_sweetspot) {
        0
    } else {
        verdict
    }
}

// ---------------------------------------------------------------------------
// Sequential scheme (Penzance)
// ---------------------------------------------------------------------------

/// The five overrides, applied in the deployed order: wave height, wind
/// speed, wind direction, wave direction, freeboard. Later rules see the
/// verdict earlier rules produced.
fn sequential_revise(verdict: u8, row: &FeatureRow) -> u8 {
    let v = revise_hs(verdict, row.hs);
    let v = revise_wind(v, row.wind_speed);
    let v = revise_wind_dir(v, row.shore_wind_dir);
    let v = revise_wave_dir(v, row.shore_wave_dir);
    revise_freeboard(v, row.freeboard)
}

fn revise_hs(verdict: u8, hs: f64) -> u8 {
    if verdict == 1 && hs < HS_SUPPRESS_BELOW {
        return 0;
    }
    if verdict == 0 && in_any_band(hs, &HS_RECOVER_BANDS) {
        return 1;
    }
    verdict
}

fn revise_wind(verdict: u8, wind_speed: f64) -> u8 {
    if verdict == 1 && wind_speed < WIND_SUPPRESS_BELOW {
        0
    } else {
        verdict
    }
}

fn revise_wind_dir(verdict: u8, wind_dir: f64) -> u8 {
    if verdict == 1 && wind_dir > WIND_DIR_SUPPRESS_ABOVE {
        0
    } else {
        verdict
    }
}

fn revise_wave_dir(verdict: u8, wave_dir: f64) -> u8 {
    // Exact membership, not a band: these specific directions were
    // observed to overtop while the classifier said otherwise.
    if verdict == 0 && WAVE_DIR_RECOVER.contains(&wave_dir) {
        1
    } else {
        verdict
    }
}

fn revise_freeboard(verdict: u8, freeboard: f64) -> u8 {
    if verdict == 1 && in_any_band(freeboard, &FREEBOARD_SUPPRESS_BANDS) {
        0
    } else {
        verdict
    }
}

fn in_any_band(value: f64, bands: &[(f64, f64)]) -> bool {
    bands.iter().any(|&(lo, hi)| lo <= value && value <= hi)
}
