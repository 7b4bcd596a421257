/// Wave reader: gridded significant wave height, mean period, and mean
/// direction sampled at the site buoy.
///
/// A forecast block's wave data arrives as a set of NetCDF files sharing
/// the block-date prefix. Each file carries the CMEMS-style variables
/// VHM0 / VTM02 / VMDR on a (time, latitude, longitude) grid. The reader
/// selects the cell nearest the buoy from every file, concatenates, and
/// resamples each quantity to 3-hour means.
///
/// NetCDF decoding sits behind the `netcdf` cargo feature; everything
/// from decoded samples onward is pure.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::model::{TwinError, TwinResult};
use crate::series::Series;

/// Filename prefix for a block's wave files; the block date follows as
/// `YYYYMMDD`.
pub const WAVE_FILE_PREFIX: &str = "metoffice_wave_amm15_NWS_WAV_b";

/// Significant wave height variable name in the source files.
pub const VAR_HS: &str = "VHM0";
/// Mean wave period variable name.
pub const VAR_TM: &str = "VTM02";
/// Mean wave direction variable name.
pub const VAR_DIR: &str = "VMDR";

// ---------------------------------------------------------------------------
// Block file selection
// ---------------------------------------------------------------------------

/// Lists the wave files belonging to a block date, sorted by name.
/// An empty result is not an error here — `extract_wave_data` turns it
/// into `NoData` so the whole-block fallback can engage.
pub fn wave_files_for_block(folder: &Path, block_date: NaiveDate) -> TwinResult<Vec<PathBuf>> {
    let prefix = format!("{}{}", WAVE_FILE_PREFIX, block_date.format("%Y%m%d"));
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&prefix) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// Decoded samples → series
// ---------------------------------------------------------------------------

/// One buoy-cell sample from a wave file.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSample {
    pub time: NaiveDateTime,
    pub hs: f64,
    pub tm: f64,
    pub wave_dir: f64,
}

/// The three wave quantities on a shared 3-hour-mean timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveFrame {
    pub hs: Series,
    pub tm: Series,
    pub wave_dir: Series,
}

/// Builds the 3-hour-mean wave frame from concatenated buoy-cell samples.
/// Decoder-independent; both the NetCDF path and the tests go through here.
pub fn wave_frame_from_samples(samples: &[WaveSample]) -> WaveFrame {
    let three_hours = Duration::hours(3);
    let hs = Series::from_points(samples.iter().map(|s| (s.time, s.hs)).collect());
    let tm = Series::from_points(samples.iter().map(|s| (s.time, s.tm)).collect());
    let wave_dir = Series::from_points(samples.iter().map(|s| (s.time, s.wave_dir)).collect());
    WaveFrame {
        hs: hs.resample_mean(three_hours),
        tm: tm.resample_mean(three_hours),
        wave_dir: wave_dir.resample_mean(three_hours),
    }
}

/// Reads a block's wave files and returns the merged 3-hour-mean frame.
///
/// Fails with `NoData` when the file list is empty — the signal the block
/// assembler uses to fall back to the previous day.
pub fn extract_wave_data(files: &[PathBuf], buoy_lat: f64, buoy_lon: f64) -> TwinResult<WaveFrame> {
    if files.is_empty() {
        return Err(TwinError::NoData(
            "no wave files for the requested block".to_string(),
        ));
    }
    let mut samples = Vec::new();
    for path in files {
        samples.extend(decode::wave_samples(path, buoy_lat, buoy_lon)?);
    }
    Ok(wave_frame_from_samples(&samples))
}

// ---------------------------------------------------------------------------
// CF time axis
// ---------------------------------------------------------------------------

/// Parsed CF "units since reference" time axis description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    seconds_per_unit: i64,
    reference: NaiveDateTime,
}

impl CfTimeUnits {
    /// Parses a CF units attribute such as
    /// `"seconds since 1970-01-01 00:00:00"`. The wave files use the
    /// standard calendar, which is all this supports.
    pub fn parse(units: &str) -> TwinResult<Self> {
        let lower = units.trim().to_lowercase();
        let (unit_part, ref_part) = lower
            .split_once(" since ")
            .ok_or_else(|| TwinError::Parse(format!("time units missing 'since': {}", units)))?;

        let seconds_per_unit = match unit_part.trim() {
            "second" | "seconds" | "s" => 1,
            "minute" | "minutes" | "min" => 60,
            "hour" | "hours" | "h" | "hr" => 3600,
            "day" | "days" | "d" => 86400,
            other => {
                return Err(TwinError::Parse(format!("unknown time unit: {}", other)));
            }
        };

        let ref_part = ref_part.trim().trim_end_matches('z').replace('t', " ");
        let ref_part = ref_part.trim();
        let reference = NaiveDateTime::parse_from_str(ref_part, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(ref_part, "%Y-%m-%d %H:%M"))
            .or_else(|_| {
                NaiveDate::parse_from_str(ref_part, "%Y-%m-%d")
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
            })
            .map_err(|_| TwinError::Parse(format!("bad reference time: {}", units)))?;

        Ok(CfTimeUnits {
            seconds_per_unit,
            reference,
        })
    }

    /// Converts an axis value into a timestamp.
    pub fn to_datetime(&self, value: f64) -> NaiveDateTime {
        let seconds = (value * self.seconds_per_unit as f64).round() as i64;
        self.reference + Duration::seconds(seconds)
    }
}

// ---------------------------------------------------------------------------
// NetCDF decode
// ---------------------------------------------------------------------------

#[cfg(feature = "netcdf")]
mod decode {
    use super::*;
    use crate::ingest::grid::{nearest_axis_index, normalize_lon, GridVariable};

    fn read_variable(file: &netcdf::File, name: &str) -> TwinResult<GridVariable> {
        let var = file
            .variable(name)
            .ok_or_else(|| TwinError::Parse(format!("wave file missing variable {}", name)))?;
        let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let data: Vec<f64> = var
            .values::<f64, _>(..)
            .map_err(|e| TwinError::Parse(format!("reading {}: {}", name, e)))?;
        Ok(GridVariable { data, dims })
    }

    fn time_units(file: &netcdf::File) -> TwinResult<CfTimeUnits> {
        let var = file
            .variable("time")
            .ok_or_else(|| TwinError::Parse("wave file missing time axis".to_string()))?;
        let units = var
            .attribute("units")
            .and_then(|a| a.value().ok())
            .and_then(|v| match v {
                netcdf::AttrValue::Str(s) => Some(s),
                _ => None,
            })
            .ok_or_else(|| TwinError::Parse("time axis has no units attribute".to_string()))?;
        CfTimeUnits::parse(&units)
    }

    /// Decodes one wave file into buoy-cell samples.
    pub fn wave_samples(
        path: &Path,
        buoy_lat: f64,
        buoy_lon: f64,
    ) -> TwinResult<Vec<WaveSample>> {
        let file = netcdf::open(path)
            .map_err(|e| TwinError::Parse(format!("{}: {}", path.display(), e)))?;

        let lats = read_variable(&file, "latitude")?;
        let lons = read_variable(&file, "longitude")?;
        let times = read_variable(&file, "time")?;
        let units = time_units(&file)?;

        let lon_axis: Vec<f64> = lons.data.iter().map(|&l| normalize_lon(l)).collect();
        let ilat = nearest_axis_index(&lats.data, buoy_lat)
            .ok_or_else(|| TwinError::Parse("empty latitude axis".to_string()))?;
        let ilon = nearest_axis_index(&lon_axis, buoy_lon)
            .ok_or_else(|| TwinError::Parse("empty longitude axis".to_string()))?;

        let hs = read_variable(&file, VAR_HS)?;
        let tm = read_variable(&file, VAR_TM)?;
        let dir = read_variable(&file, VAR_DIR)?;

        let mut samples = Vec::with_capacity(times.data.len());
        for (it, &tv) in times.data.iter().enumerate() {
            let idx = [it, ilat, ilon];
            samples.push(WaveSample {
                time: units.to_datetime(tv),
                hs: hs.get(&idx).unwrap_or(f64::NAN),
                tm: tm.get(&idx).unwrap_or(f64::NAN),
                wave_dir: dir.get(&idx).unwrap_or(f64::NAN),
            });
        }
        Ok(samples)
    }
}

#[cfg(not(feature = "netcdf"))]
mod decode {
    use super::*;

    /// Placeholder when built without NetCDF support.
    pub fn wave_samples(
        _path: &Path,
        _buoy_lat: f64,
        _buoy_lon: f64,
    ) -> TwinResult<Vec<WaveSample>> {
        Err(TwinError::DecodeUnavailable("netcdf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_wave_files_for_block_matches_prefix_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in [
            "metoffice_wave_amm15_NWS_WAV_b20241105_hi01.nc",
            "metoffice_wave_amm15_NWS_WAV_b20241105_hi00.nc",
            "metoffice_wave_amm15_NWS_WAV_b20241104_hi00.nc",
            "unrelated.nc",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
        let files = wave_files_for_block(dir.path(), date).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "metoffice_wave_amm15_NWS_WAV_b20241105_hi00.nc",
                "metoffice_wave_amm15_NWS_WAV_b20241105_hi01.nc",
            ]
        );
    }

    #[test]
    fn test_extract_with_empty_file_list_is_no_data() {
        let err = extract_wave_data(&[], 50.0, -3.0).unwrap_err();
        assert!(matches!(err, TwinError::NoData(_)));
    }

    #[test]
    fn test_wave_frame_resamples_hourly_samples_to_three_hour_means() {
        let samples: Vec<WaveSample> = (0..6)
            .map(|h| WaveSample {
                time: ts(5, h),
                hs: f64::from(h),
                tm: 6.0,
                wave_dir: 90.0,
            })
            .collect();
        let frame = wave_frame_from_samples(&samples);
        // Hours 0-2 average to 1.0, hours 3-5 to 4.0.
        assert_eq!(frame.hs.points(), &[(ts(5, 0), 1.0), (ts(5, 3), 4.0)]);
        assert_eq!(frame.tm.points()[0].1, 6.0);
        assert_eq!(frame.wave_dir.points()[1].1, 90.0);
    }

    #[test]
    fn test_cf_time_units_seconds_since_epoch() {
        let units = CfTimeUnits::parse("seconds since 1970-01-01 00:00:00").unwrap();
        assert_eq!(
            units.to_datetime(86_400.0),
            NaiveDate::from_ymd_opt(1970, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_cf_time_units_hours_with_date_only_reference() {
        let units = CfTimeUnits::parse("hours since 2024-11-05").unwrap();
        assert_eq!(units.to_datetime(6.0), ts(5, 6));
    }

    #[test]
    fn test_cf_time_units_rejects_missing_since() {
        assert!(CfTimeUnits::parse("hours after 2024-11-05").is_err());
    }
}
