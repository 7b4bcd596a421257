/// Source readers for the three forecast inputs.
///
/// Each reader turns one raw source into a `series::Series` (or a set of
/// them) sampled at the site buoy position:
///
/// - `wave` — gridded wave fields (NetCDF set per block)
/// - `wind` — gridded wind speed / direction (one GRIB file each per block)
/// - `tide` — tabular tide-gauge text (one file, date-independent)
///
/// File decoding for the gridded formats needs system libraries and sits
/// behind the `netcdf` and `grib` cargo features; the cell-selection,
/// filtering, and resampling logic is pure and always compiled.

pub mod grid;
pub mod tide;
pub mod wave;
pub mod wind;
