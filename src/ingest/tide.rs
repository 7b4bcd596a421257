/// Tide-gauge reader: water level (freeboard) from the site's tide table.
///
/// The source is a whitespace-delimited text file with two header lines
/// and three columns: date (`DD/MM/YYYY`, day first), time (`HH:MM`), and
/// water level in metres. The gauge samples denser than the forecast
/// grid, so the reader reindexes onto the requested frequency and fills
/// the gaps linearly.
///
/// Unlike the gridded sources the tide file is not block-dated: an empty
/// or absent water-level table yields an empty series (the merge carries
/// the gap as NaN) rather than tripping the previous-day fallback.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};

use crate::model::{TwinError, TwinResult};
use crate::series::Series;

/// Number of header lines before the data rows.
const HEADER_LINES: usize = 2;

/// Timestamp layout of the date + time columns, day first.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses the raw tide table into a series of gauge observations.
pub fn read_tide_file(path: &Path) -> TwinResult<Series> {
    let text = std::fs::read_to_string(path)?;
    parse_tide_text(&text)
}

/// Parses tide-table text. Split out so tests can exercise the format
/// handling without touching the filesystem.
pub fn parse_tide_text(text: &str) -> TwinResult<Series> {
    let mut series = Series::new();
    for (number, line) in text.lines().enumerate() {
        if number < HEADER_LINES || line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(date), Some(time), Some(level)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(TwinError::Parse(format!(
                "tide line {}: expected date, time, water_level",
                number + 1
            )));
        };

        let timestamp =
            NaiveDateTime::parse_from_str(&format!("{} {}", date, time), TIMESTAMP_FORMAT)
                .map_err(|e| TwinError::Parse(format!("tide line {}: {}", number + 1, e)))?;
        let value: f64 = level
            .parse()
            .map_err(|e| TwinError::Parse(format!("tide line {}: {}", number + 1, e)))?;
        series.push(timestamp, value);
    }
    Ok(series)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Reads the tide table and returns the water-level curve on the given
/// frequency (3-hour for the block merge input, 1-hour elsewhere).
pub fn extract_water_level(path: &Path, freq: Duration) -> TwinResult<Series> {
    Ok(read_tide_file(path)?.resample_interpolate(freq))
}

/// Range-filtered variant: restricts to `[start, end]` (inclusive) before
/// interpolating onto an hourly grid.
pub fn extract_water_level_for_range(
    path: &Path,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> TwinResult<Series> {
    let raw = read_tide_file(path)?;
    let filtered = Series::from_points(
        raw.points()
            .iter()
            .copied()
            .filter(|(t, _)| *t >= start && *t <= end)
            .collect(),
    );
    Ok(filtered.resample_interpolate(Duration::hours(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
Port: Dawlish
Datum: Chart datum, metres
05/11/2024 00:00 2.00
05/11/2024 01:30 2.60
05/11/2024 03:00 3.20
05/11/2024 06:00 4.40
";

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_skips_two_header_lines_and_reads_day_first_dates() {
        let s = parse_tide_text(SAMPLE).unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.points()[0], (ts(0, 0), 2.0));
        assert_eq!(s.points()[1], (ts(1, 30), 2.6));
    }

    #[test]
    fn test_extract_three_hourly_keeps_on_grid_values() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let s = extract_water_level(file.path(), Duration::hours(3)).unwrap();
        assert_eq!(
            s.points(),
            &[(ts(0, 0), 2.0), (ts(3, 0), 3.2), (ts(6, 0), 4.4)]
        );
    }

    #[test]
    fn test_extract_hourly_interpolates_between_observations() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let s = extract_water_level(file.path(), Duration::hours(1)).unwrap();
        // 04:00 and 05:00 lie between the 03:00 and 06:00 observations.
        assert_relative_eq!(s.value_at(ts(4, 0)), 3.6, epsilon = 1e-12);
        assert_relative_eq!(s.value_at(ts(5, 0)), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_range_variant_restricts_before_interpolating() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let s = extract_water_level_for_range(file.path(), ts(3, 0), ts(6, 0)).unwrap();
        assert_eq!(s.first_time(), Some(ts(3, 0)));
        assert_eq!(s.last_time(), Some(ts(6, 0)));
        assert_relative_eq!(s.value_at(ts(5, 0)), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_malformed_line_is_a_parse_error() {
        let text = "h1\nh2\n05/11/2024 00:00\n";
        assert!(matches!(
            parse_tide_text(text).unwrap_err(),
            TwinError::Parse(_)
        ));
    }

    #[test]
    fn test_empty_table_yields_empty_series_not_an_error() {
        let s = parse_tide_text("h1\nh2\n").unwrap();
        assert!(s.is_empty());
    }
}
