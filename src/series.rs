/// Time-series container and resampling primitives.
///
/// Everything downstream of the source readers operates on `Series`: a
/// timestamp-ordered list of (time, value) points where gaps are carried
/// as `f64::NAN`. The resampling rules deliberately mirror the upstream
/// data pipeline's conventions:
///
/// - bins are anchored at midnight (a 3-hour grid lands on 00, 03, 06, ...),
/// - mean-resampling skips NaN and yields NaN for empty bins,
/// - reindexing (`resample_asfreq`) takes exact-timestamp values only,
/// - linear interpolation fills interior gaps by position, leaves leading
///   gaps untouched, and clamps trailing gaps to the last valid value.
///
/// All operations are pure and deterministic: re-running an assembly on
/// identical inputs yields identical output.

use chrono::{Duration, NaiveDateTime, NaiveTime};

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// A single-quantity time series. Points are kept in insertion order;
/// the resampling constructors all emit chronologically sorted grids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    points: Vec<(NaiveDateTime, f64)>,
}

impl Series {
    pub fn new() -> Self {
        Series { points: Vec::new() }
    }

    pub fn from_points(points: Vec<(NaiveDateTime, f64)>) -> Self {
        Series { points }
    }

    pub fn push(&mut self, time: NaiveDateTime, value: f64) {
        self.points.push((time, value));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDateTime, f64)] {
        &self.points
    }

    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.points.first().map(|(t, _)| *t)
    }

    pub fn last_time(&self) -> Option<NaiveDateTime> {
        self.points.last().map(|(t, _)| *t)
    }

    /// Exact-timestamp lookup, used by the left joins in block assembly.
    /// Absent timestamps read as NaN, the same as an unmatched join row.
    pub fn value_at(&self, time: NaiveDateTime) -> f64 {
        self.points
            .iter()
            .find(|(t, _)| *t == time)
            .map(|(_, v)| *v)
            .unwrap_or(f64::NAN)
    }

    /// Drops duplicate timestamps, keeping the first occurrence.
    pub fn dedup_keep_first(mut self) -> Self {
        let mut seen: Vec<NaiveDateTime> = Vec::with_capacity(self.points.len());
        self.points.retain(|(t, _)| {
            if seen.contains(t) {
                false
            } else {
                seen.push(*t);
                true
            }
        });
        self
    }

    // -----------------------------------------------------------------------
    // Resampling
    // -----------------------------------------------------------------------

    /// Downsample (or upsample) onto a `freq` grid, averaging the points
    /// that fall in each bin. NaN inputs are skipped; bins with no finite
    /// value come out as NaN rows rather than being dropped, so the grid
    /// stays continuous from the first to the last bin.
    pub fn resample_mean(&self, freq: Duration) -> Series {
        let Some(grid) = self.bin_grid(freq) else {
            return Series::new();
        };
        let step = freq.num_seconds();
        let first_bin = grid[0];

        let mut sums = vec![0.0_f64; grid.len()];
        let mut counts = vec![0_u32; grid.len()];
        for &(t, v) in &self.points {
            if v.is_nan() {
                continue;
            }
            let idx = ((t - first_bin).num_seconds().div_euclid(step)) as usize;
            sums[idx] += v;
            counts[idx] += 1;
        }

        let points = grid
            .into_iter()
            .enumerate()
            .map(|(i, bin)| {
                let value = if counts[i] > 0 {
                    sums[i] / f64::from(counts[i])
                } else {
                    f64::NAN
                };
                (bin, value)
            })
            .collect();
        Series { points }
    }

    /// Reindex onto a `freq` grid without aggregating: each grid timestamp
    /// takes the exact-match value if one exists, otherwise NaN.
    pub fn resample_asfreq(&self, freq: Duration) -> Series {
        let Some(grid) = self.bin_grid(freq) else {
            return Series::new();
        };
        let points = grid.into_iter().map(|t| (t, self.value_at(t))).collect();
        Series { points }
    }

    /// Reindex onto a `freq` grid and fill the gaps linearly — the standard
    /// treatment for tide-gauge data, which is denser than the grid but must
    /// be carried as a continuous curve.
    pub fn resample_interpolate(&self, freq: Duration) -> Series {
        self.resample_asfreq(freq).interpolate()
    }

    /// Linear gap filling by position: interior NaN runs are interpolated
    /// between their valid neighbours, NaN before the first valid value is
    /// left in place, and NaN after the last valid value repeats it.
    pub fn interpolate(&self) -> Series {
        let mut points = self.points.clone();
        let n = points.len();

        let mut prev_valid: Option<usize> = None;
        for i in 0..n {
            if !points[i].1.is_nan() {
                if let Some(p) = prev_valid {
                    if i > p + 1 {
                        let (v0, v1) = (points[p].1, points[i].1);
                        let span = (i - p) as f64;
                        for j in (p + 1)..i {
                            points[j].1 = v0 + (v1 - v0) * ((j - p) as f64) / span;
                        }
                    }
                }
                prev_valid = Some(i);
            }
        }
        // Trailing gap: clamp to the last observed value.
        if let Some(p) = prev_valid {
            let last = points[p].1;
            for point in points.iter_mut().skip(p + 1) {
                point.1 = last;
            }
        }
        Series { points }
    }

    /// Continuous bin grid from the floor of the earliest point to the floor
    /// of the latest, anchored at midnight. Returns None for an empty series.
    fn bin_grid(&self, freq: Duration) -> Option<Vec<NaiveDateTime>> {
        let min_t = self.points.iter().map(|(t, _)| *t).min()?;
        let max_t = self.points.iter().map(|(t, _)| *t).max()?;
        let start = floor_to_freq(min_t, freq);
        let end = floor_to_freq(max_t, freq);

        let mut grid = Vec::new();
        let mut t = start;
        while t <= end {
            grid.push(t);
            t += freq;
        }
        Some(grid)
    }
}

/// Floors a timestamp onto a frequency grid anchored at midnight.
/// Only meaningful for frequencies that divide a day evenly.
pub fn floor_to_freq(t: NaiveDateTime, freq: Duration) -> NaiveDateTime {
    let midnight = t.date().and_time(NaiveTime::MIN);
    let offset = (t - midnight).num_seconds();
    let step = freq.num_seconds();
    midnight + Duration::seconds(offset - offset.rem_euclid(step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_floor_to_freq_three_hourly() {
        let freq = Duration::hours(3);
        assert_eq!(floor_to_freq(ts(1, 7, 30), freq), ts(1, 6, 0));
        assert_eq!(floor_to_freq(ts(1, 6, 0), freq), ts(1, 6, 0));
        assert_eq!(floor_to_freq(ts(1, 0, 0), freq), ts(1, 0, 0));
    }

    #[test]
    fn test_resample_mean_bins_anchored_at_midnight() {
        // Two points in the 06:00 bin, one in the 09:00 bin.
        let s = Series::from_points(vec![
            (ts(1, 6, 0), 1.0),
            (ts(1, 7, 0), 3.0),
            (ts(1, 9, 0), 5.0),
        ]);
        let r = s.resample_mean(Duration::hours(3));
        assert_eq!(r.points(), &[(ts(1, 6, 0), 2.0), (ts(1, 9, 0), 5.0)]);
    }

    #[test]
    fn test_resample_mean_upsampling_introduces_nan_bins() {
        // 3-hourly data onto an hourly grid: the in-between hours exist
        // as rows but hold NaN, exactly like the upstream upsample.
        let s = Series::from_points(vec![(ts(1, 0, 0), 1.0), (ts(1, 3, 0), 4.0)]);
        let r = s.resample_mean(Duration::hours(1));
        assert_eq!(r.len(), 4);
        assert_eq!(r.points()[0], (ts(1, 0, 0), 1.0));
        assert!(r.points()[1].1.is_nan());
        assert!(r.points()[2].1.is_nan());
        assert_eq!(r.points()[3], (ts(1, 3, 0), 4.0));
    }

    #[test]
    fn test_resample_mean_skips_nan_inputs() {
        let s = Series::from_points(vec![
            (ts(1, 0, 0), 2.0),
            (ts(1, 1, 0), f64::NAN),
            (ts(1, 2, 0), 4.0),
        ]);
        let r = s.resample_mean(Duration::hours(3));
        assert_eq!(r.points(), &[(ts(1, 0, 0), 3.0)]);
    }

    #[test]
    fn test_resample_asfreq_takes_exact_matches_only() {
        let s = Series::from_points(vec![
            (ts(1, 0, 0), 1.0),
            (ts(1, 1, 0), 2.0),
            (ts(1, 3, 0), 3.0),
        ]);
        let r = s.resample_asfreq(Duration::hours(3));
        assert_eq!(r.points(), &[(ts(1, 0, 0), 1.0), (ts(1, 3, 0), 3.0)]);
    }

    #[test]
    fn test_interpolate_fills_interior_gap_linearly() {
        let s = Series::from_points(vec![
            (ts(1, 0, 0), 1.0),
            (ts(1, 1, 0), f64::NAN),
            (ts(1, 2, 0), f64::NAN),
            (ts(1, 3, 0), 4.0),
        ]);
        let r = s.interpolate();
        assert_eq!(r.points()[1].1, 2.0);
        assert_eq!(r.points()[2].1, 3.0);
    }

    #[test]
    fn test_interpolate_keeps_leading_gap_and_clamps_trailing() {
        let s = Series::from_points(vec![
            (ts(1, 0, 0), f64::NAN),
            (ts(1, 1, 0), 1.0),
            (ts(1, 2, 0), 3.0),
            (ts(1, 3, 0), f64::NAN),
        ]);
        let r = s.interpolate();
        assert!(
            r.points()[0].1.is_nan(),
            "values before the first observation stay unknown"
        );
        assert_eq!(
            r.points()[3].1,
            3.0,
            "values after the last observation repeat it"
        );
    }

    #[test]
    fn test_resample_interpolate_upsamples_tide_curve() {
        // 3-hourly tide onto an hourly grid with linear fill.
        let s = Series::from_points(vec![(ts(1, 0, 0), 0.0), (ts(1, 3, 0), 3.0)]);
        let r = s.resample_interpolate(Duration::hours(1));
        assert_eq!(
            r.points(),
            &[
                (ts(1, 0, 0), 0.0),
                (ts(1, 1, 0), 1.0),
                (ts(1, 2, 0), 2.0),
                (ts(1, 3, 0), 3.0),
            ]
        );
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let s = Series::from_points(vec![
            (ts(1, 0, 0), 1.0),
            (ts(1, 0, 0), 9.0),
            (ts(1, 1, 0), 2.0),
        ])
        .dedup_keep_first();
        assert_eq!(s.points(), &[(ts(1, 0, 0), 1.0), (ts(1, 1, 0), 2.0)]);
    }

    #[test]
    fn test_empty_series_resamples_to_empty() {
        let s = Series::new();
        assert!(s.resample_mean(Duration::hours(1)).is_empty());
        assert!(s.resample_asfreq(Duration::hours(3)).is_empty());
    }

    #[test]
    fn test_value_at_missing_timestamp_is_nan() {
        let s = Series::from_points(vec![(ts(1, 0, 0), 1.0)]);
        assert!(s.value_at(ts(1, 1, 0)).is_nan());
    }
}
