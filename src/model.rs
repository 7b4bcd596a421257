/// Core data types for the SPLASH overtopping forecast service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic, no I/O, and no external dependencies — only types.

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Timeline constants
// ---------------------------------------------------------------------------

/// Number of leading rows of a merged feature table kept at hourly
/// resolution. Everything past this row index lies on a 3-hour grid.
pub const HOURLY_HEAD_ROWS: usize = 54;

/// Same boundary expressed as lead time in hours, used when deciding
/// whether a row sits on the declared forecast cadence.
pub const HOURLY_LEAD_LIMIT: f64 = 54.0;

// ---------------------------------------------------------------------------
// Feature table
// ---------------------------------------------------------------------------

/// One row of the combined feature table: everything the model cascade
/// needs for a single forecast timestamp.
///
/// Timestamps are UTC with the offset dropped, matching the source files.
/// Gaps introduced by upsampling are carried as `f64::NAN`, the same way
/// the merged table carries them before interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub time: NaiveDateTime,
    /// Significant wave height (m).
    pub hs: f64,
    /// Mean wave period (s).
    pub tm: f64,
    /// Wave direction relative to shore (degrees).
    pub shore_wave_dir: f64,
    /// Wind speed (m/s).
    pub wind_speed: f64,
    /// Wind direction relative to shore (degrees).
    pub shore_wind_dir: f64,
    /// Water level relative to the structure crest (m).
    pub freeboard: f64,
}

impl FeatureRow {
    /// Model input vector, in the column order the forests were trained on:
    /// Hs, Tm, shoreWaveDir, Wind(m/s), shoreWindDir, Freeboard.
    pub fn features(&self) -> [f64; 6] {
        [
            self.hs,
            self.tm,
            self.shore_wave_dir,
            self.wind_speed,
            self.shore_wind_dir,
            self.freeboard,
        ]
    }
}

/// The combined feature table for one forecast block: first
/// `HOURLY_HEAD_ROWS` rows hourly, the remainder on a 3-hour grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// Timestamp of the first row — the block start that horizon selection
    /// measures lead time against.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.rows.first().map(|r| r.time)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Model identification
// ---------------------------------------------------------------------------

/// The four cascade stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// Primary-structure occurrence classifier.
    Rf1,
    /// Primary-structure count model.
    Rf2,
    /// Secondary-structure occurrence classifier.
    Rf3,
    /// Secondary-structure count regressor.
    Rf4,
}

impl ModelFamily {
    /// Substring used in model artifact filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            ModelFamily::Rf1 => "RF1",
            ModelFamily::Rf2 => "RF2",
            ModelFamily::Rf3 => "RF3",
            ModelFamily::Rf4 => "RF4",
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Forecast lead-time band; selects which trained variant of a family
/// applies to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    T24,
    T48,
    T72,
}

impl Horizon {
    /// Substring used in model artifact filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            Horizon::T24 => "T24",
            Horizon::T48 => "T48",
            Horizon::T72 => "T72",
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while assembling forecast blocks or running the
/// model cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum TwinError {
    /// No matching files or records for a requested block. Recovered at
    /// whole-block granularity by retrying the previous day.
    NoData(String),
    /// Model bank lookup failed. Fatal — inference cannot proceed.
    MissingModel { family: ModelFamily, horizon: Horizon },
    /// A source file or model artifact could not be parsed.
    Parse(String),
    /// Filesystem failure, carried as text so the error stays comparable.
    Io(String),
    /// A required configuration variable is absent or unusable.
    Config(String),
    /// The crate was built without the decoder feature a reader needs.
    DecodeUnavailable(&'static str),
}

impl std::fmt::Display for TwinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TwinError::NoData(what) => write!(f, "no data available: {}", what),
            TwinError::MissingModel { family, horizon } => {
                write!(f, "model bank has no {} model for horizon {}", family, horizon)
            }
            TwinError::Parse(msg) => write!(f, "parse error: {}", msg),
            TwinError::Io(msg) => write!(f, "io error: {}", msg),
            TwinError::Config(msg) => write!(f, "configuration error: {}", msg),
            TwinError::DecodeUnavailable(feature) => {
                write!(f, "decoder not built in (enable the `{}` feature)", feature)
            }
        }
    }
}

impl std::error::Error for TwinError {}

impl From<std::io::Error> for TwinError {
    fn from(err: std::io::Error) -> Self {
        TwinError::Io(err.to_string())
    }
}

/// Crate-wide result alias.
pub type TwinResult<T> = Result<T, TwinError>;
