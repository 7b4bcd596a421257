/// Scenario feature adjustment — the "what-if" controls.
///
/// Percentage deltas scale wave height, period, wind speed, and
/// freeboard; the two direction controls are absolute and *overwrite*
/// every row's direction rather than scaling it. A pure copy: the
/// assembled table is never mutated, so the baseline forecast stays
/// available for comparison.

use crate::model::{FeatureRow, FeatureTable};

/// The six scenario controls. Percentages are whole percent (so `10.0`
/// scales by 1.1); directions are degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustments {
    pub hs_pct: f64,
    pub tm_pct: f64,
    pub wave_dir_deg: f64,
    pub wind_speed_pct: f64,
    pub wind_dir_deg: f64,
    pub freeboard_pct: f64,
}

impl Adjustments {
    /// All controls at rest.
    pub fn none() -> Self {
        Adjustments {
            hs_pct: 0.0,
            tm_pct: 0.0,
            wave_dir_deg: 0.0,
            wind_speed_pct: 0.0,
            wind_dir_deg: 0.0,
            freeboard_pct: 0.0,
        }
    }

    /// True when every control is zero. The forecast pipeline skips the
    /// adjustment pass entirely in that case — applying it would zero out
    /// both direction columns, since directions overwrite.
    pub fn is_baseline(&self) -> bool {
        self.hs_pct == 0.0
            && self.tm_pct == 0.0
            && self.wave_dir_deg == 0.0
            && self.wind_speed_pct == 0.0
            && self.wind_dir_deg == 0.0
            && self.freeboard_pct == 0.0
    }
}

impl Default for Adjustments {
    fn default() -> Self {
        Adjustments::none()
    }
}

/// Returns an adjusted copy of the table; the input is untouched.
pub fn adjust_features(table: &FeatureTable, adjustments: &Adjustments) -> FeatureTable {
    let rows = table
        .rows
        .iter()
        .map(|row| FeatureRow {
            time: row.time,
            hs: row.hs * (1.0 + adjustments.hs_pct / 100.0),
            tm: row.tm * (1.0 + adjustments.tm_pct / 100.0),
            shore_wave_dir: adjustments.wave_dir_deg,
            wind_speed: row.wind_speed * (1.0 + adjustments.wind_speed_pct / 100.0),
            shore_wind_dir: adjustments.wind_dir_deg,
            freeboard: row.freeboard * (1.0 + adjustments.freeboard_pct / 100.0),
        })
        .collect();
    FeatureTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> FeatureTable {
        FeatureTable {
            rows: vec![FeatureRow {
                time: NaiveDate::from_ymd_opt(2024, 11, 5)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                hs: 2.0,
                tm: 8.0,
                shore_wave_dir: 75.0,
                wind_speed: 10.0,
                shore_wind_dir: 180.0,
                freeboard: 4.0,
            }],
        }
    }

    #[test]
    fn test_percent_columns_scale_and_directions_overwrite() {
        let input = table();
        let adjusted = adjust_features(
            &input,
            &Adjustments {
                hs_pct: 50.0,
                tm_pct: -25.0,
                wave_dir_deg: 90.0,
                wind_speed_pct: 10.0,
                wind_dir_deg: 200.0,
                freeboard_pct: -50.0,
            },
        );
        let row = &adjusted.rows[0];
        assert_eq!(row.hs, 3.0);
        assert_eq!(row.tm, 6.0);
        assert_eq!(row.shore_wave_dir, 90.0, "wave direction is absolute, not scaled");
        assert_eq!(row.wind_speed, 11.0);
        assert_eq!(row.shore_wind_dir, 200.0, "wind direction is absolute, not scaled");
        assert_eq!(row.freeboard, 2.0);
    }

    #[test]
    fn test_input_table_is_untouched() {
        let input = table();
        let _ = adjust_features(
            &input,
            &Adjustments {
                hs_pct: 100.0,
                ..Adjustments::none()
            },
        );
        assert_eq!(input.rows[0].hs, 2.0);
    }

    #[test]
    fn test_baseline_detection() {
        assert!(Adjustments::none().is_baseline());
        assert!(
            !Adjustments {
                wave_dir_deg: 0.1,
                ..Adjustments::none()
            }
            .is_baseline()
        );
    }
}
