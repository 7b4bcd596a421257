/// Model bank: the twelve pretrained cascade models for one site.
///
/// Artifacts live in a per-site directory and are recognized purely by
/// filename substrings: the family tag (`RF1`..`RF4`) and the horizon tag
/// (`T24`/`T48`/`T72`). Files matching neither are ignored, so release
/// notes and checksums can sit alongside the models.
///
/// The bank is loaded once, validated, and then only read — callers pass
/// it by reference into the cascade instead of consulting any process-wide
/// registry, which keeps the load-then-read ordering explicit.

pub mod forest;

use std::path::Path;

use crate::logging::{self, Source};
use crate::model::{Horizon, ModelFamily, TwinError, TwinResult};
use forest::Forest;

// ---------------------------------------------------------------------------
// Horizon slots
// ---------------------------------------------------------------------------

/// The three horizon variants of one model family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HorizonModels {
    t24: Option<Forest>,
    t48: Option<Forest>,
    t72: Option<Forest>,
}

impl HorizonModels {
    pub fn get(&self, horizon: Horizon) -> Option<&Forest> {
        match horizon {
            Horizon::T24 => self.t24.as_ref(),
            Horizon::T48 => self.t48.as_ref(),
            Horizon::T72 => self.t72.as_ref(),
        }
    }

    fn set(&mut self, horizon: Horizon, forest: Forest) {
        match horizon {
            Horizon::T24 => self.t24 = Some(forest),
            Horizon::T48 => self.t48 = Some(forest),
            Horizon::T72 => self.t72 = Some(forest),
        }
    }
}

// ---------------------------------------------------------------------------
// Bank
// ---------------------------------------------------------------------------

/// Immutable collection of every loaded model, keyed family × horizon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBank {
    rf1: HorizonModels,
    rf2: HorizonModels,
    rf3: HorizonModels,
    rf4: HorizonModels,
}

/// Families and horizons a complete bank must cover.
const ALL_FAMILIES: [ModelFamily; 4] = [
    ModelFamily::Rf1,
    ModelFamily::Rf2,
    ModelFamily::Rf3,
    ModelFamily::Rf4,
];
const ALL_HORIZONS: [Horizon; 3] = [Horizon::T24, Horizon::T48, Horizon::T72];

impl ModelBank {
    /// Loads every recognizable artifact in `folder`. Unrecognized
    /// filenames are skipped; unreadable or structurally invalid
    /// artifacts are errors — a bank that half-loads silently would
    /// surface later as a confusing `MissingModel` mid-cascade.
    pub fn load(folder: &Path) -> TwinResult<ModelBank> {
        let mut bank = ModelBank::default();
        let mut loaded = 0usize;

        for entry in std::fs::read_dir(folder)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();

            let Some(family) = match_family(&name) else {
                continue;
            };
            let Some(horizon) = match_horizon(&name) else {
                continue;
            };

            let file = std::fs::File::open(entry.path())?;
            let forest: Forest = serde_json::from_reader(std::io::BufReader::new(file))
                .map_err(|e| TwinError::Parse(format!("model {}: {}", name, e)))?;
            forest
                .validate()
                .map_err(|e| TwinError::Parse(format!("model {}: {}", name, e)))?;

            bank.family_mut(family).set(horizon, forest);
            loaded += 1;
            logging::debug(
                Source::Models,
                None,
                &format!("loaded {} {} from {}", family, horizon, name),
            );
        }

        logging::info(
            Source::Models,
            None,
            &format!("model bank loaded: {} artifacts from {}", loaded, folder.display()),
        );
        Ok(bank)
    }

    fn family_mut(&mut self, family: ModelFamily) -> &mut HorizonModels {
        match family {
            ModelFamily::Rf1 => &mut self.rf1,
            ModelFamily::Rf2 => &mut self.rf2,
            ModelFamily::Rf3 => &mut self.rf3,
            ModelFamily::Rf4 => &mut self.rf4,
        }
    }

    fn family(&self, family: ModelFamily) -> &HorizonModels {
        match family {
            ModelFamily::Rf1 => &self.rf1,
            ModelFamily::Rf2 => &self.rf2,
            ModelFamily::Rf3 => &self.rf3,
            ModelFamily::Rf4 => &self.rf4,
        }
    }

    /// Looks up the model for a family and horizon. A missing slot is
    /// fatal for inference — surfaced, never defaulted.
    pub fn model(&self, family: ModelFamily, horizon: Horizon) -> TwinResult<&Forest> {
        self.family(family)
            .get(horizon)
            .ok_or(TwinError::MissingModel { family, horizon })
    }

    /// Places a model directly; used by tests and calibration tooling.
    pub fn insert(&mut self, family: ModelFamily, horizon: Horizon, forest: Forest) {
        self.family_mut(family).set(horizon, forest);
    }

    /// Slots with no loaded artifact, in family-major order.
    pub fn missing_slots(&self) -> Vec<(ModelFamily, Horizon)> {
        let mut missing = Vec::new();
        for family in ALL_FAMILIES {
            for horizon in ALL_HORIZONS {
                if self.family(family).get(horizon).is_none() {
                    missing.push((family, horizon));
                }
            }
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_slots().is_empty()
    }
}

/// First family tag found in a filename, checked in cascade order.
fn match_family(name: &str) -> Option<ModelFamily> {
    ALL_FAMILIES.into_iter().find(|f| name.contains(f.tag()))
}

/// First horizon tag found in a filename.
fn match_horizon(name: &str) -> Option<Horizon> {
    ALL_HORIZONS.into_iter().find(|h| name.contains(h.tag()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_model(dir: &Path, name: &str, forest: &Forest) {
        std::fs::write(dir.join(name), serde_json::to_string(forest).unwrap()).unwrap();
    }

    #[test]
    fn test_load_matches_family_and_horizon_substrings() {
        let dir = TempDir::new().unwrap();
        write_model(
            dir.path(),
            "splash_RF1_classifier_T24_v3.json",
            &Forest::constant_classifier(0.9),
        );
        write_model(
            dir.path(),
            "splash_RF4_regressor_T72.json",
            &Forest::constant_regressor(7.0),
        );
        std::fs::write(dir.path().join("README.txt"), "not a model").unwrap();

        let bank = ModelBank::load(dir.path()).unwrap();
        assert!(bank.model(ModelFamily::Rf1, Horizon::T24).is_ok());
        assert!(bank.model(ModelFamily::Rf4, Horizon::T72).is_ok());
        assert_eq!(bank.missing_slots().len(), 10);
    }

    #[test]
    fn test_missing_slot_lookup_is_fatal() {
        let bank = ModelBank::default();
        let err = bank.model(ModelFamily::Rf2, Horizon::T48).unwrap_err();
        assert_eq!(
            err,
            TwinError::MissingModel {
                family: ModelFamily::Rf2,
                horizon: Horizon::T48,
            }
        );
    }

    #[test]
    fn test_corrupt_artifact_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("RF1_T24.json"), "{not json").unwrap();
        assert!(matches!(
            ModelBank::load(dir.path()).unwrap_err(),
            TwinError::Parse(_)
        ));
    }

    #[test]
    fn test_complete_bank_reports_no_missing_slots() {
        let mut bank = ModelBank::default();
        for family in ALL_FAMILIES {
            for horizon in ALL_HORIZONS {
                let forest = match family {
                    ModelFamily::Rf2 | ModelFamily::Rf4 => Forest::constant_regressor(1.0),
                    _ => Forest::constant_classifier(0.7),
                };
                bank.insert(family, horizon, forest);
            }
        }
        assert!(bank.is_complete());
    }
}
