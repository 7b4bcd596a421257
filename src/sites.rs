/// Site registry for the SPLASH overtopping forecast service.
///
/// Defines the two monitored coastal sites and everything that differs
/// between them: buoy coordinates, structure names, horizon boundaries,
/// wind-ingest rules, and the post-hoc revision scheme applied after the
/// occurrence classifiers. This is the single source of truth for
/// per-site behaviour — the cascade itself is one shared algorithm that
/// consumes a `SiteProfile`.
///
/// The numeric thresholds are calibration constants tuned against each
/// site's validation seasons. They are part of the deployed model
/// behaviour and must not be "corrected" for symmetry.

// ---------------------------------------------------------------------------
// Site identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Dawlish,
    Penzance,
}

impl Site {
    /// Lowercase key used in configuration variables and dataset options.
    pub fn key(&self) -> &'static str {
        match self {
            Site::Dawlish => "dawlish",
            Site::Penzance => "penzance",
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Revision schemes
// ---------------------------------------------------------------------------

/// A "sweet spot" is the driver range within which a positive occurrence
/// verdict is considered physically credible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweetspot {
    /// Significant wave height above which a positive is credible (m).
    pub hs: f64,
    /// Wind speed above which a positive is credible (m/s).
    pub wind: f64,
    /// Inclusive wave-direction band within which a positive is credible.
    pub wave_dir_min: f64,
    pub wave_dir_max: f64,
}

/// How a site revises the raw occurrence verdicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevisionScheme {
    /// One combined OR check per classifier: a positive verdict survives
    /// only if at least one driver sits in its sweet spot. Can only
    /// suppress positives, never recover negatives.
    Sweetspot { rf1: Sweetspot, rf3: Sweetspot },
    /// Five independent overrides applied in sequence (Hs, wind speed,
    /// wind direction, wave direction, freeboard), able both to suppress
    /// false positives and to recover known false-negative bands. Only
    /// the primary classifier is revised. Constants live in
    /// `cascade::revision`.
    Sequential,
}

// ---------------------------------------------------------------------------
// Dawlish sweet-spot calibration
// ---------------------------------------------------------------------------

/// Primary (seawall crest) classifier sweet spots.
pub const DAWLISH_RF1_SWEETSPOT: Sweetspot = Sweetspot {
    hs: 1.39,
    wind: 7.71,
    wave_dir_min: 49.0,
    wave_dir_max: 97.0,
};

/// Secondary (railway line) classifier sweet spots.
pub const DAWLISH_RF3_SWEETSPOT: Sweetspot = Sweetspot {
    hs: 1.65,
    wind: 8.47,
    wave_dir_min: 50.0,
    wave_dir_max: 93.0,
};

// ---------------------------------------------------------------------------
// Site profiles
// ---------------------------------------------------------------------------

/// Everything that varies between the monitored sites.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteProfile {
    pub site: Site,
    /// Display name.
    pub name: &'static str,
    /// Wave buoy position the gridded fields are sampled at (WGS84).
    pub buoy_latitude: f64,
    pub buoy_longitude: f64,
    /// Names of the two assessed structures, primary first.
    pub primary_structure: &'static str,
    pub secondary_structure: &'static str,
    /// Field names the two series carry in the JSON response.
    pub primary_series_key: &'static str,
    pub secondary_series_key: &'static str,
    /// Whether a lead time of exactly 48 h still selects the T48 model.
    /// Dawlish uses an exclusive upper bound, Penzance an inclusive one.
    pub t48_upper_inclusive: bool,
    /// Occurrence-verdict revision scheme.
    pub revision: RevisionScheme,
    /// Wind reader drops records past 54 h that are off the 3-hour grid.
    pub wind_cadence_filter: bool,
    /// Wind reader resamples to 3-hour means before the merge.
    pub wind_resample_3h: bool,
    /// Cascade skips rows past 54 h that are off the 3-hour grid instead
    /// of zero-filling them.
    pub skip_offgrid_rows: bool,
    /// Secondary-structure confidence uses the railway bucket scale.
    pub railway_confidence_scale: bool,
    /// Block selection consults the state marker before assembling.
    pub resume_from_marker: bool,
}

/// The monitored sites. Coordinates are the seawall-adjacent wave buoy
/// positions the gridded forecasts are sampled at.
pub static SITE_REGISTRY: &[SiteProfile] = &[
    SiteProfile {
        site: Site::Dawlish,
        name: "Dawlish",
        buoy_latitude: 50.56757,
        buoy_longitude: -3.42424,
        primary_structure: "Dawlish Seawall Crest",
        secondary_structure: "Dawlish Railway Line",
        primary_series_key: "seawall_crest_overtopping",
        secondary_series_key: "railway_line_overtopping",
        t48_upper_inclusive: false,
        revision: RevisionScheme::Sweetspot {
            rf1: DAWLISH_RF1_SWEETSPOT,
            rf3: DAWLISH_RF3_SWEETSPOT,
        },
        wind_cadence_filter: false,
        wind_resample_3h: true,
        skip_offgrid_rows: false,
        railway_confidence_scale: true,
        resume_from_marker: false,
    },
    SiteProfile {
        site: Site::Penzance,
        name: "Penzance",
        buoy_latitude: 50.1186,
        buoy_longitude: -5.5373,
        primary_structure: "Penzance Seawall Crest",
        secondary_structure: "Penzance Seawall Crest (Sheltered)",
        primary_series_key: "seawall_crest_overtopping",
        secondary_series_key: "seawall_crest_sheltered_overtopping",
        t48_upper_inclusive: true,
        revision: RevisionScheme::Sequential,
        wind_cadence_filter: true,
        wind_resample_3h: false,
        skip_offgrid_rows: true,
        railway_confidence_scale: false,
        resume_from_marker: true,
    },
];

/// Looks up the profile for a site. The registry covers every `Site`
/// variant, so this cannot fail.
pub fn profile(site: Site) -> &'static SiteProfile {
    SITE_REGISTRY
        .iter()
        .find(|p| p.site == site)
        .expect("registry covers every site variant")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_both_sites() {
        assert_eq!(profile(Site::Dawlish).name, "Dawlish");
        assert_eq!(profile(Site::Penzance).name, "Penzance");
    }

    #[test]
    fn test_horizon_boundary_divergence_is_preserved() {
        // The 48 h boundary inequality genuinely differs between the two
        // deployments; this pins it against well-meaning unification.
        assert!(!profile(Site::Dawlish).t48_upper_inclusive);
        assert!(profile(Site::Penzance).t48_upper_inclusive);
    }

    #[test]
    fn test_dawlish_sweetspot_constants() {
        let SiteProfile { revision, .. } = profile(Site::Dawlish);
        match revision {
            RevisionScheme::Sweetspot { rf1, rf3 } => {
                assert_eq!(rf1.hs, 1.39);
                assert_eq!(rf1.wind, 7.71);
                assert_eq!(rf1.wave_dir_min, 49.0);
                assert_eq!(rf1.wave_dir_max, 97.0);
                assert_eq!(rf3.hs, 1.65);
                assert_eq!(rf3.wind, 8.47);
                assert_eq!(rf3.wave_dir_min, 50.0);
                assert_eq!(rf3.wave_dir_max, 93.0);
            }
            RevisionScheme::Sequential => panic!("Dawlish uses the sweet-spot scheme"),
        }
    }
}
