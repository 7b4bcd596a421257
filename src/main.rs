//! Command-line entry point: run a site forecast and print the response
//! JSON, or verify a deployment's configured inputs.

use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};

use splash_service::adjust::Adjustments;
use splash_service::config::{Config, DatasetOption};
use splash_service::forecast::run_forecast;
use splash_service::logging::{self, LogLevel};
use splash_service::model::TwinResult;
use splash_service::sites::{self, Site};
use splash_service::verify;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SiteArg {
    Dawlish,
    Penzance,
}

impl From<SiteArg> for Site {
    fn from(arg: SiteArg) -> Site {
        match arg {
            SiteArg::Dawlish => Site::Dawlish,
            SiteArg::Penzance => Site::Penzance,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "splash_service",
    version,
    about = "Wave-overtopping forecast service"
)]
struct Cli {
    /// Site to forecast.
    #[arg(value_enum)]
    site: SiteArg,

    /// Forecast start date, DD-MM-YYYY. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Dataset option: the site name for the live feeds, or
    /// no_overtopping / storm_bert for the archived validation sets.
    #[arg(long)]
    option: Option<String>,

    /// Scenario adjustments. Percentages scale; directions overwrite.
    #[arg(long, default_value_t = 0.0)]
    hs_pct: f64,
    #[arg(long, default_value_t = 0.0)]
    tm_pct: f64,
    #[arg(long, default_value_t = 0.0)]
    wave_dir_deg: f64,
    #[arg(long, default_value_t = 0.0)]
    wind_speed_pct: f64,
    #[arg(long, default_value_t = 0.0)]
    wind_dir_deg: f64,
    #[arg(long, default_value_t = 0.0)]
    freeboard_pct: f64,

    /// Verify the configured folders and model bank instead of running
    /// a forecast.
    #[arg(long)]
    verify: bool,

    /// Append log entries to this file as well as the console.
    #[arg(long)]
    log_file: Option<String>,

    /// Show debug-level log output.
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let min_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    logging::init_logger(min_level, cli.log_file.as_deref(), true);

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> TwinResult<()> {
    let site: Site = cli.site.into();
    let option = match &cli.option {
        Some(raw) => DatasetOption::parse(raw)?,
        None => DatasetOption::Standard,
    };
    let config = Config::from_env(site, option)?;

    if cli.verify {
        let profile = sites::profile(site);
        let report = verify::run_verification(&[(profile, config)])?;
        verify::print_summary(&report);
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
        return Ok(());
    }

    let date = match &cli.date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%d-%m-%Y").map_err(|e| {
            splash_service::model::TwinError::Parse(format!("--date {}: {}", raw, e))
        })?,
        None => Local::now().date_naive(),
    };

    let adjustments = Adjustments {
        hs_pct: cli.hs_pct,
        tm_pct: cli.tm_pct,
        wave_dir_deg: cli.wave_dir_deg,
        wind_speed_pct: cli.wind_speed_pct,
        wind_dir_deg: cli.wind_dir_deg,
        freeboard_pct: cli.freeboard_pct,
    };

    let forecast = run_forecast(site, date, &adjustments, &config)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&forecast.to_json()).unwrap_or_default()
    );
    Ok(())
}
