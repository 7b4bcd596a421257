/// Result packager: turns cascade predictions into the two per-structure
/// output series and their consumer-facing JSON records.
///
/// Both series are built row-by-row from the same prediction set, so they
/// stay aligned by construction — a skipped secondary branch contributes
/// its zero count and zero confidence in place rather than shortening one
/// list.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::cascade::PredictionRow;
use crate::sites::SiteProfile;

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// One point of a structure's forecast series.
#[derive(Debug, Clone, PartialEq)]
pub struct OvertoppingPoint {
    pub time: NaiveDateTime,
    pub overtopping_count: f64,
    pub confidence: f64,
}

/// A structure's forecast: counts and confidences per timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSeries {
    pub structure: &'static str,
    /// Whether confidence displays use the railway bucket scale.
    pub railway_scale: bool,
    pub points: Vec<OvertoppingPoint>,
}

/// Builds the primary and secondary structure series from the cascade
/// output: RF1 confidence with the RF2 counts, RF3 confidence with the
/// capped RF3/RF4 counts.
pub fn package_predictions(
    profile: &SiteProfile,
    predictions: &[PredictionRow],
) -> (StructureSeries, StructureSeries) {
    let primary = StructureSeries {
        structure: profile.primary_structure,
        railway_scale: false,
        points: predictions
            .iter()
            .map(|p| OvertoppingPoint {
                time: p.time,
                overtopping_count: p.primary_count,
                confidence: p.rf1_confidence,
            })
            .collect(),
    };
    let secondary = StructureSeries {
        structure: profile.secondary_structure,
        railway_scale: profile.railway_confidence_scale,
        points: predictions
            .iter()
            .map(|p| OvertoppingPoint {
                time: p.time,
                overtopping_count: p.secondary_count,
                confidence: p.rf3_confidence,
            })
            .collect(),
    };
    (primary, secondary)
}

/// Timestamps whose final primary verdict was positive — the event list
/// the feature report highlights.
pub fn overtopping_times(predictions: &[PredictionRow]) -> Vec<NaiveDateTime> {
    predictions
        .iter()
        .filter(|p| p.rf1_verdict == 1)
        .map(|p| p.time)
        .collect()
}

// ---------------------------------------------------------------------------
// Confidence buckets
// ---------------------------------------------------------------------------

/// Advisory confidence classification for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
    Unknown,
}

/// Buckets a confidence value. The standard scale is >0.8 high,
/// 0.5–0.8 medium, otherwise low. The railway scale is >0.6 high and
/// everything else medium — on that scale medium and low collapse into
/// one bucket. That asymmetry is deployed behaviour and is kept as-is.
/// Non-finite values bucket as unknown.
pub fn confidence_bucket(confidence: f64, railway_scale: bool) -> ConfidenceBucket {
    if !confidence.is_finite() {
        return ConfidenceBucket::Unknown;
    }
    if railway_scale {
        if confidence > 0.6 {
            ConfidenceBucket::High
        } else {
            ConfidenceBucket::Medium
        }
    } else if confidence > 0.8 {
        ConfidenceBucket::High
    } else if confidence > 0.5 {
        ConfidenceBucket::Medium
    } else {
        ConfidenceBucket::Low
    }
}

// ---------------------------------------------------------------------------
// JSON records
// ---------------------------------------------------------------------------

/// Timestamp layout of the consumer-facing records.
const RECORD_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// One consumer-facing record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonPoint {
    pub confidence: f64,
    pub overtopping_count: f64,
    pub time: String,
}

/// Converts a structure series into consumer-facing records.
pub fn to_json_records(series: &StructureSeries) -> Vec<JsonPoint> {
    series
        .points
        .iter()
        .map(|p| JsonPoint {
            confidence: p.confidence,
            overtopping_count: p.overtopping_count,
            time: p.time.format(RECORD_TIME_FORMAT).to_string(),
        })
        .collect()
}
