//! SPLASH overtopping forecast service.
//!
//! Ingests marine forecast data (gridded waves and wind, tabular tide
//! levels) for two coastal sites, assembles a unified time-indexed
//! feature table, and runs a four-stage cascade of pretrained models to
//! predict wave-overtopping occurrence and frequency at two structures
//! per site.
//!
//! The typical entry point is [`forecast::run_forecast`]; the modules
//! underneath follow the pipeline order: `ingest` → `assemble` →
//! `adjust` → `models`/`cascade` → `package`.

pub mod adjust;
pub mod assemble;
pub mod cascade;
pub mod config;
pub mod forecast;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod models;
pub mod package;
pub mod series;
pub mod sites;
pub mod state;
pub mod verify;
