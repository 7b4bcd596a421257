/// Wind reader: 10 m wind speed and direction sampled at the site buoy.
///
/// Each block carries two GRIB files, one per quantity, with filename
/// prefixes `agl_wind-speed-<YYYYMMDD>` and `agl_wind-direction-<YYYYMMDD>`.
/// Every message holds one forecast step on a 2-D grid; the record's valid
/// time is the initialization time plus the forecast offset.
///
/// The two sites consume the records differently:
/// - Dawlish keeps every level-10 record and resamples to 3-hour means.
/// - Penzance keeps only records with an offset of at most 54 h or on the
///   3-hour grid, and defers all resampling to the merge.
///
/// GRIB decoding sits behind the `grib` cargo feature (eccodes — the same
/// library the upstream ingest toolchain wraps); record filtering and
/// series construction are pure.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::model::{TwinError, TwinResult};
use crate::series::Series;
use crate::sites::SiteProfile;

/// Filename prefix for the wind-speed GRIB file of a block.
pub const WIND_SPEED_PREFIX: &str = "agl_wind-speed-";
/// Filename prefix for the wind-direction GRIB file of a block.
pub const WIND_DIRECTION_PREFIX: &str = "agl_wind-direction-";

/// Atmospheric level the forecasts are published at (metres AGL).
pub const WIND_LEVEL: i64 = 10;

/// Offset (hours) up to which every record is on the published cadence;
/// past it only 3-hourly records are.
const CADENCE_LIMIT_HOURS: i64 = 54;

// ---------------------------------------------------------------------------
// Block file selection
// ---------------------------------------------------------------------------

/// Finds the block's wind file with the given prefix, if present.
/// A missing file surfaces later as `NoData`, not as an I/O error, so the
/// whole-block fallback can engage.
pub fn wind_file_for_block(
    folder: &Path,
    prefix: &str,
    block_date: NaiveDate,
) -> TwinResult<Option<PathBuf>> {
    let wanted = format!("{}{}", prefix, block_date.format("%Y%m%d"));
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&wanted) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Decoded records → series
// ---------------------------------------------------------------------------

/// One decoded GRIB message: a forecast step's full grid for one quantity.
/// Latitude/longitude/value arrays are flattened cell-parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct WindRecord {
    /// Vertical level of the record (metres AGL).
    pub level: i64,
    /// Model initialization time.
    pub init_time: NaiveDateTime,
    /// Forecast step in whole hours from the initialization time.
    pub forecast_offset_hours: i64,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub values: Vec<f64>,
}

impl WindRecord {
    /// The timestamp this record is valid for.
    pub fn valid_time(&self) -> NaiveDateTime {
        self.init_time + Duration::hours(self.forecast_offset_hours)
    }

    /// Whether the record sits on the published forecast cadence:
    /// hourly up to 54 h, 3-hourly beyond.
    pub fn on_cadence(&self) -> bool {
        self.forecast_offset_hours <= CADENCE_LIMIT_HOURS || self.forecast_offset_hours % 3 == 0
    }
}

/// Builds the buoy-cell wind series from decoded records, applying the
/// site's filtering and resampling rules. Decoder-independent.
///
/// Fails with `NoData` when no level-10 record survives — the signal the
/// block assembler uses to fall back to the previous day.
pub fn wind_series_from_records(
    records: &[WindRecord],
    profile: &SiteProfile,
) -> TwinResult<Series> {
    let mut series = Series::new();
    for record in records {
        if record.level != WIND_LEVEL {
            continue;
        }
        if profile.wind_cadence_filter && !record.on_cadence() {
            continue;
        }
        let Some(cell) = crate::ingest::grid::nearest_cell_index(
            &record.lats,
            &record.lons,
            profile.buoy_latitude,
            profile.buoy_longitude,
        ) else {
            continue;
        };
        let value = record.values.get(cell).copied().unwrap_or(f64::NAN);
        series.push(record.valid_time(), value);
    }

    if series.is_empty() {
        return Err(TwinError::NoData(
            "no level-10 wind records for the requested block".to_string(),
        ));
    }

    let series = series.dedup_keep_first();
    if profile.wind_resample_3h {
        Ok(series.resample_mean(Duration::hours(3)))
    } else {
        Ok(series)
    }
}

/// Reads one wind GRIB file and returns the buoy-cell series.
/// `path` being None means the block has no wind file → `NoData`.
pub fn extract_wind_data(path: Option<&Path>, profile: &SiteProfile) -> TwinResult<Series> {
    let path = path.ok_or_else(|| {
        TwinError::NoData("no wind file for the requested block".to_string())
    })?;
    let records = decode::wind_records(path)?;
    wind_series_from_records(&records, profile)
}

// ---------------------------------------------------------------------------
// GRIB decode
// ---------------------------------------------------------------------------

#[cfg(feature = "grib")]
mod decode {
    use super::*;
    use eccodes::{CodesHandle, FallibleStreamingIterator, KeyType, ProductKind};

    fn int_key(msg: &eccodes::KeyedMessage, name: &str) -> TwinResult<i64> {
        match msg
            .read_key(name)
            .map_err(|e| TwinError::Parse(format!("grib key {}: {}", name, e)))?
            .value
        {
            KeyType::Int(v) => Ok(v),
            other => Err(TwinError::Parse(format!(
                "grib key {} has unexpected type: {:?}",
                name, other
            ))),
        }
    }

    fn float_array_key(msg: &eccodes::KeyedMessage, name: &str) -> TwinResult<Vec<f64>> {
        match msg
            .read_key(name)
            .map_err(|e| TwinError::Parse(format!("grib key {}: {}", name, e)))?
            .value
        {
            KeyType::FloatArray(v) => Ok(v),
            other => Err(TwinError::Parse(format!(
                "grib key {} has unexpected type: {:?}",
                name, other
            ))),
        }
    }

    /// Decodes every message of a wind GRIB file.
    pub fn wind_records(path: &Path) -> TwinResult<Vec<WindRecord>> {
        let mut handle = CodesHandle::new_from_file(path.to_path_buf(), ProductKind::GRIB)
            .map_err(|e| TwinError::Parse(format!("{}: {}", path.display(), e)))?;

        let mut records = Vec::new();
        while let Some(msg) = handle
            .next()
            .map_err(|e| TwinError::Parse(format!("grib iteration: {}", e)))?
        {
            let data_date = int_key(msg, "dataDate")?;
            let data_time = int_key(msg, "dataTime")?;
            let init_time = NaiveDateTime::parse_from_str(
                &format!("{:08}{:04}", data_date, data_time),
                "%Y%m%d%H%M",
            )
            .map_err(|e| TwinError::Parse(format!("grib init time: {}", e)))?;

            records.push(WindRecord {
                level: int_key(msg, "level")?,
                init_time,
                forecast_offset_hours: int_key(msg, "forecastTime")?,
                lats: float_array_key(msg, "latitudes")?,
                lons: float_array_key(msg, "longitudes")?,
                values: float_array_key(msg, "values")?,
            });
        }
        Ok(records)
    }
}

#[cfg(not(feature = "grib"))]
mod decode {
    use super::*;

    /// Placeholder when built without GRIB support.
    pub fn wind_records(_path: &Path) -> TwinResult<Vec<WindRecord>> {
        Err(TwinError::DecodeUnavailable("grib"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::{profile, Site};

    fn init_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Single-cell grid sitting right on the Penzance buoy, so cell
    /// selection is trivial and the tests focus on record handling.
    fn record(level: i64, offset: i64, value: f64) -> WindRecord {
        WindRecord {
            level,
            init_time: init_time(),
            forecast_offset_hours: offset,
            lats: vec![50.1186],
            lons: vec![354.4627], // published as [0, 360); equals -5.5373
            values: vec![value],
        }
    }

    #[test]
    fn test_valid_time_adds_forecast_offset() {
        let r = record(10, 30, 5.0);
        assert_eq!(
            r.valid_time(),
            NaiveDate::from_ymd_opt(2024, 11, 6)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_non_level_10_records_are_ignored() {
        let records = vec![record(2, 0, 1.0), record(10, 0, 5.0)];
        let s = wind_series_from_records(&records, profile(Site::Penzance)).unwrap();
        assert_eq!(s.points(), &[(init_time(), 5.0)]);
    }

    #[test]
    fn test_no_level_10_records_is_no_data() {
        let records = vec![record(2, 0, 1.0)];
        let err = wind_series_from_records(&records, profile(Site::Penzance)).unwrap_err();
        assert!(matches!(err, TwinError::NoData(_)));
    }

    #[test]
    fn test_penzance_drops_offgrid_records_past_54_hours() {
        // 55 h is past the hourly window and off the 3-hour grid; 57 h is
        // on the grid; 54 h itself is still inside the hourly window.
        let records = vec![
            record(10, 54, 1.0),
            record(10, 55, 2.0),
            record(10, 57, 3.0),
        ];
        let s = wind_series_from_records(&records, profile(Site::Penzance)).unwrap();
        let offsets: Vec<NaiveDateTime> = s.points().iter().map(|(t, _)| *t).collect();
        assert_eq!(
            offsets,
            vec![
                init_time() + Duration::hours(54),
                init_time() + Duration::hours(57),
            ]
        );
    }

    #[test]
    fn test_dawlish_keeps_all_records_and_resamples() {
        // Hourly records 0..6 at Dawlish come out as 3-hour means.
        let dawlish = profile(Site::Dawlish);
        let records: Vec<WindRecord> = (0..6)
            .map(|h| WindRecord {
                level: 10,
                init_time: init_time(),
                forecast_offset_hours: h,
                lats: vec![50.56757],
                lons: vec![356.57576], // equals -3.42424
                values: vec![f64::from(h as i32)],
            })
            .collect();
        let s = wind_series_from_records(&records, dawlish).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.points()[0].1, 1.0);
        assert_eq!(s.points()[1].1, 4.0);
    }

    #[test]
    fn test_duplicate_valid_times_keep_first() {
        let records = vec![record(10, 3, 7.0), record(10, 3, 9.0)];
        let s = wind_series_from_records(&records, profile(Site::Penzance)).unwrap();
        assert_eq!(s.points(), &[(init_time() + Duration::hours(3), 7.0)]);
    }

    #[test]
    fn test_missing_wind_file_is_no_data() {
        let err = extract_wind_data(None, profile(Site::Penzance)).unwrap_err();
        assert!(matches!(err, TwinError::NoData(_)));
    }
}
