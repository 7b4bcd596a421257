/// Gridded-field helpers shared by the wave and wind readers.
///
/// The forecast grids publish longitudes in [0, 360); buoy coordinates are
/// conventional [-180, 180] west-negative values, so every comparison
/// normalizes grid longitudes first. Cell selection is a plain Euclidean
/// argmin in (lat, lon) space — the grids are fine enough near the coast
/// that great-circle corrections would not change the selected cell.

// ---------------------------------------------------------------------------
// Longitude normalization
// ---------------------------------------------------------------------------

/// Maps a grid longitude into [-180, 180].
pub fn normalize_lon(lon: f64) -> f64 {
    if lon > 180.0 { lon - 360.0 } else { lon }
}

// ---------------------------------------------------------------------------
// Nearest-cell selection
// ---------------------------------------------------------------------------

/// Index of the value in `axis` closest to `target`. Used for separable
/// (1-D latitude / longitude axis) grids. Returns None on an empty axis.
pub fn nearest_axis_index(axis: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in axis.iter().enumerate() {
        let d = (v - target).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the grid point nearest the buoy, for grids published as
/// paired flattened latitude/longitude arrays (one entry per cell).
/// Grid longitudes are normalized before the distance computation.
pub fn nearest_cell_index(lats: &[f64], lons: &[f64], lat0: f64, lon0: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in 0..lats.len().min(lons.len()) {
        let dlat = lats[i] - lat0;
        let dlon = normalize_lon(lons[i]) - lon0;
        let d = (dlat * dlat + dlon * dlon).sqrt();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// N-dimensional variable access
// ---------------------------------------------------------------------------

/// A decoded gridded variable: flat row-major data plus its dimension
/// sizes. Lets the wave reader address `[time, lat, lon]` cells without
/// caring how the decoder laid the buffer out.
#[derive(Debug, Clone)]
pub struct GridVariable {
    pub data: Vec<f64>,
    pub dims: Vec<usize>,
}

impl GridVariable {
    fn linear_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.dims.len() {
            return None;
        }
        let mut idx = 0;
        let mut stride = 1;
        for (i, &dim_size) in self.dims.iter().enumerate().rev() {
            if indices[i] >= dim_size {
                return None;
            }
            idx += indices[i] * stride;
            stride *= dim_size;
        }
        Some(idx)
    }

    /// Value at the given multi-dimensional index, or None out of bounds.
    pub fn get(&self, indices: &[usize]) -> Option<f64> {
        let idx = self.linear_index(indices)?;
        self.data.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lon_wraps_eastern_hemisphere_values() {
        assert_eq!(normalize_lon(356.6), 356.6 - 360.0);
        assert_eq!(normalize_lon(3.4), 3.4);
        assert_eq!(normalize_lon(180.0), 180.0);
    }

    #[test]
    fn test_nearest_axis_index_picks_closest() {
        let axis = [49.0, 50.0, 51.0, 52.0];
        assert_eq!(nearest_axis_index(&axis, 50.4), Some(1));
        assert_eq!(nearest_axis_index(&axis, 50.6), Some(2));
        assert_eq!(nearest_axis_index(&[], 50.0), None);
    }

    #[test]
    fn test_nearest_axis_index_ties_keep_first() {
        let axis = [50.0, 51.0];
        assert_eq!(nearest_axis_index(&axis, 50.5), Some(0));
    }

    #[test]
    fn test_nearest_cell_normalizes_longitudes() {
        // A cell published at lon 356.6 (= -3.4) is closer to the Dawlish
        // buoy (-3.42) than one at an honest -5.5.
        let lats = [50.5, 50.1];
        let lons = [356.6, -5.5];
        assert_eq!(nearest_cell_index(&lats, &lons, 50.56757, -3.42424), Some(0));
    }

    #[test]
    fn test_grid_variable_row_major_addressing() {
        let var = GridVariable {
            data: (0..24).map(f64::from).collect(),
            dims: vec![2, 3, 4],
        };
        assert_eq!(var.get(&[0, 0, 0]), Some(0.0));
        assert_eq!(var.get(&[0, 1, 0]), Some(4.0));
        assert_eq!(var.get(&[1, 0, 0]), Some(12.0));
        assert_eq!(var.get(&[1, 2, 3]), Some(23.0));
        assert_eq!(var.get(&[2, 0, 0]), None);
    }
}
