/// Forecast-block assembly: concurrent source reads, the hourly/3-hourly
/// merge, and the previous-day fallback.
///
/// One block is merged as follows: all three sources are brought onto the
/// wave reader's hourly timeline (wave and wind by mean, tide by linear
/// interpolation) and left-joined. The first 54 rows are kept hourly
/// exactly as joined — including the NaN gaps the upsampling introduces
/// between 3-hourly wave points. The remainder is reindexed onto the
/// 3-hour grid and linearly interpolated per column, then appended back
/// behind the hourly head.
///
/// If any source reports `NoData` for the requested date, the whole block
/// is retried for the previous day. The retry is a bounded loop (the
/// configured lookback) rather than open-ended recursion. Every
/// successful assembly records its block date in the state marker.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::ingest::tide::extract_water_level;
use crate::ingest::wave::{extract_wave_data, wave_files_for_block, WaveFrame};
use crate::ingest::wind::{
    extract_wind_data, wind_file_for_block, WIND_DIRECTION_PREFIX, WIND_SPEED_PREFIX,
};
use crate::logging::{self, Source};
use crate::model::{FeatureRow, FeatureTable, TwinError, TwinResult, HOURLY_HEAD_ROWS};
use crate::series::{floor_to_freq, Series};
use crate::sites::SiteProfile;
use crate::state;

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// The four independent reads feeding one block assembly. Injected so the
/// merge and fallback logic can be exercised without gridded test files,
/// in the same spirit as the explicit model-bank value passed into the
/// cascade.
pub trait BlockSources: Sync {
    fn fetch_wave(&self, block_date: NaiveDate) -> TwinResult<WaveFrame>;
    fn fetch_wind_speed(&self, block_date: NaiveDate) -> TwinResult<Series>;
    fn fetch_wind_direction(&self, block_date: NaiveDate) -> TwinResult<Series>;
    /// The tide table is date-independent; it is read once per assembly
    /// at 3-hour resolution.
    fn fetch_tide(&self) -> TwinResult<Series>;
}

/// Production sources: the configured wave/wind folders and tide file.
pub struct FileBlockSources {
    pub profile: &'static SiteProfile,
    pub wave_folder: PathBuf,
    pub wind_folder: PathBuf,
    pub tide_file: PathBuf,
}

impl FileBlockSources {
    /// Logs a failed read with classification before handing it back.
    fn logged<T>(&self, source: Source, operation: &str, result: TwinResult<T>) -> TwinResult<T> {
        if let Err(err) = &result {
            logging::log_source_failure(source, self.profile.name, operation, err);
        }
        result
    }
}

impl BlockSources for FileBlockSources {
    fn fetch_wave(&self, block_date: NaiveDate) -> TwinResult<WaveFrame> {
        let result = wave_files_for_block(&self.wave_folder, block_date).and_then(|files| {
            extract_wave_data(&files, self.profile.buoy_latitude, self.profile.buoy_longitude)
        });
        self.logged(Source::Wave, "wave extraction", result)
    }

    fn fetch_wind_speed(&self, block_date: NaiveDate) -> TwinResult<Series> {
        let result = wind_file_for_block(&self.wind_folder, WIND_SPEED_PREFIX, block_date)
            .and_then(|file| extract_wind_data(file.as_deref(), self.profile));
        self.logged(Source::Wind, "wind speed extraction", result)
    }

    fn fetch_wind_direction(&self, block_date: NaiveDate) -> TwinResult<Series> {
        let result = wind_file_for_block(&self.wind_folder, WIND_DIRECTION_PREFIX, block_date)
            .and_then(|file| extract_wind_data(file.as_deref(), self.profile));
        self.logged(Source::Wind, "wind direction extraction", result)
    }

    fn fetch_tide(&self) -> TwinResult<Series> {
        let result = extract_water_level(&self.tide_file, Duration::hours(3));
        self.logged(Source::Tide, "water level extraction", result)
    }
}

// ---------------------------------------------------------------------------
// Block date selection
// ---------------------------------------------------------------------------

/// Which block a request for `requested` should actually process.
/// Penzance consults the state marker (see `state::resume_block_date`);
/// Dawlish always processes the requested date.
pub fn select_block_date(
    profile: &SiteProfile,
    marker_path: &Path,
    requested: NaiveDate,
) -> TwinResult<NaiveDate> {
    if profile.resume_from_marker {
        state::resume_block_date(marker_path, requested)
    } else {
        Ok(requested)
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merges one block's source series into the combined feature table.
/// Pure: identical inputs always produce an identical table.
pub fn merge_block(
    wave: &WaveFrame,
    wind_speed: &Series,
    wind_direction: &Series,
    tide: &Series,
) -> FeatureTable {
    let hour = Duration::hours(1);
    let hs = wave.hs.resample_mean(hour);
    let tm = wave.tm.resample_mean(hour);
    let wave_dir = wave.wave_dir.resample_mean(hour);
    let ws = wind_speed.resample_mean(hour);
    let wd = wind_direction.resample_mean(hour);
    let fb = tide.resample_interpolate(hour);

    // Left join everything onto the wave hourly timeline.
    let rows: Vec<FeatureRow> = hs
        .points()
        .iter()
        .map(|&(t, hs_value)| FeatureRow {
            time: t,
            hs: hs_value,
            tm: tm.value_at(t),
            shore_wave_dir: wave_dir.value_at(t),
            wind_speed: ws.value_at(t),
            shore_wind_dir: wd.value_at(t),
            freeboard: fb.value_at(t),
        })
        .collect();

    if rows.len() <= HOURLY_HEAD_ROWS {
        return FeatureTable { rows };
    }

    let (head, tail) = rows.split_at(HOURLY_HEAD_ROWS);
    let mut merged = head.to_vec();
    merged.extend(regrid_tail(tail));
    FeatureTable { rows: merged }
}

/// Reindexes the post-54 h rows onto the 3-hour grid (exact-match values
/// only, gap rows NaN) and fills each column linearly.
fn regrid_tail(tail: &[FeatureRow]) -> Vec<FeatureRow> {
    let three_hours = Duration::hours(3);
    let (Some(first), Some(last)) = (tail.first(), tail.last()) else {
        return Vec::new();
    };

    let mut grid: Vec<NaiveDateTime> = Vec::new();
    let mut t = floor_to_freq(first.time, three_hours);
    let end = floor_to_freq(last.time, three_hours);
    while t <= end {
        grid.push(t);
        t += three_hours;
    }

    let mut rows: Vec<FeatureRow> = grid
        .into_iter()
        .map(|time| {
            tail.iter()
                .find(|r| r.time == time)
                .cloned()
                .unwrap_or(FeatureRow {
                    time,
                    hs: f64::NAN,
                    tm: f64::NAN,
                    shore_wave_dir: f64::NAN,
                    wind_speed: f64::NAN,
                    shore_wind_dir: f64::NAN,
                    freeboard: f64::NAN,
                })
        })
        .collect();

    interpolate_column(&mut rows, |r| &mut r.hs);
    interpolate_column(&mut rows, |r| &mut r.tm);
    interpolate_column(&mut rows, |r| &mut r.shore_wave_dir);
    interpolate_column(&mut rows, |r| &mut r.wind_speed);
    interpolate_column(&mut rows, |r| &mut r.shore_wind_dir);
    interpolate_column(&mut rows, |r| &mut r.freeboard);
    rows
}

/// Applies the standard linear gap fill to one column of the regridded
/// tail, via the shared `Series` implementation.
fn interpolate_column(rows: &mut [FeatureRow], column: fn(&mut FeatureRow) -> &mut f64) {
    let series = Series::from_points(
        rows.iter_mut()
            .map(|r| {
                let time = r.time;
                (time, *column(r))
            })
            .collect(),
    )
    .interpolate();
    for (row, &(_, value)) in rows.iter_mut().zip(series.points()) {
        *column(row) = value;
    }
}

// ---------------------------------------------------------------------------
// Assembly with fallback
// ---------------------------------------------------------------------------

/// Assembles the block for `block_date`, falling back day by day when a
/// source has no data, up to `max_lookback` days. Returns the merged
/// table and the block date that actually produced it; that date is also
/// written to the state marker.
pub fn assemble_block(
    sources: &dyn BlockSources,
    block_date: NaiveDate,
    max_lookback: u32,
    marker_path: &Path,
) -> TwinResult<(FeatureTable, NaiveDate)> {
    for lookback in 0..=max_lookback {
        let date = block_date - Duration::days(i64::from(lookback));
        match try_assemble(sources, date) {
            Ok(table) => {
                state::write_marker(marker_path, date)?;
                if let (Some(start), Some(end)) =
                    (table.start_time(), table.rows.last().map(|r| r.time))
                {
                    logging::info(
                        Source::System,
                        None,
                        &format!("processed block {}: {} -> {}", date, start, end),
                    );
                }
                return Ok((table, date));
            }
            Err(TwinError::NoData(why)) => {
                logging::warn(
                    Source::System,
                    None,
                    &format!(
                        "block {}: {}; falling back to the previous day",
                        date, why
                    ),
                );
            }
            Err(other) => return Err(other),
        }
    }
    Err(TwinError::NoData(format!(
        "no usable block within {} days of {}",
        max_lookback, block_date
    )))
}

/// One assembly attempt: the four reads run concurrently and join before
/// the merge — there is no partial-result path and no per-read retry.
fn try_assemble(sources: &dyn BlockSources, date: NaiveDate) -> TwinResult<FeatureTable> {
    let (wave, (wind_speed, (wind_direction, tide))) = rayon::join(
        || sources.fetch_wave(date),
        || {
            rayon::join(
                || sources.fetch_wind_speed(date),
                || rayon::join(|| sources.fetch_wind_direction(date), || sources.fetch_tide()),
            )
        },
    );
    Ok(merge_block(&wave?, &wind_speed?, &wind_direction?, &tide?))
}
