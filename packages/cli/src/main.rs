#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for crime-rate predictions.
//!
//! Loads the same artifacts as the server and prints results as pretty JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use crime_forecast_prediction::PredictionEngine;
use crime_forecast_prediction::ArtifactError;
use crime_forecast_prediction::artifacts::ArtifactConfig;
use crime_forecast_prediction::series::generate_trailing_series;
use crime_forecast_prediction_models::{CategoryDimension, PredictionRequest};
use crime_forecast_server::AppState;
use crime_forecast_server_models::ApiVocabulary;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "crime_forecast_cli", about = "Crime-rate prediction tool")]
struct Cli {
    /// Artifact directory (overrides `CRIME_FORECAST_MODEL_DIR`)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RequestArgs {
    /// Date as `YYYY-MM-DD`
    #[arg(long)]
    date: String,
    /// Time as `HH:MM`
    #[arg(long)]
    time: String,
    /// Location label from the training data
    #[arg(long)]
    location: String,
    /// Crime type label from the training data
    #[arg(long)]
    crime_type: String,
}

impl From<RequestArgs> for PredictionRequest {
    fn from(args: RequestArgs) -> Self {
        Self::new(args.date, args.time, args.location, args.crime_type)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the crime rate for one date, time, location, and crime type
    Predict {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Predict the daily series for the days before the given date
    Series {
        #[command(flatten)]
        request: RequestArgs,
        /// Number of days in the series (defaults to the manifest's `window_days`)
        #[arg(long)]
        window_days: Option<u32>,
    },
    /// List the known locations and crime types
    Vocabulary,
    /// Start the HTTP API server
    Serve,
}

fn config(model_dir: Option<PathBuf>) -> Result<ArtifactConfig, ArtifactError> {
    match model_dir {
        Some(dir) => ArtifactConfig::from_dir(dir),
        None => ArtifactConfig::from_env(),
    }
}

fn load(
    model_dir: Option<PathBuf>,
) -> Result<(ArtifactConfig, PredictionEngine), Box<dyn std::error::Error>> {
    let config = config(model_dir)?;
    let engine = PredictionEngine::load(&config);
    Ok((config, engine))
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn serve(model_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_config(&config(model_dir)?);
    actix_web::rt::System::new().block_on(crime_forecast_server::serve(state))?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli { model_dir, command } = cli;

    match command {
        Commands::Predict { request } => {
            let (_, engine) = load(model_dir)?;
            let request = PredictionRequest::from(request);
            let result = engine.predict(&request)?;
            print_json(&serde_json::json!({
                "date": request.date,
                "time": request.time,
                "location": request.location,
                "crimeType": request.crime_type,
                "prediction": result.value,
            }))?;
        }
        Commands::Series {
            request,
            window_days,
        } => {
            let (config, engine) = load(model_dir)?;
            let request = PredictionRequest::from(request);
            let window_days = window_days.unwrap_or_else(|| config.window_days());
            log::info!("Predicting {window_days} days before {}", request.date);
            let series = generate_trailing_series(&engine, &request, window_days)?;
            print_json(&series)?;
        }
        Commands::Vocabulary => {
            let (_, engine) = load(model_dir)?;
            let labels = |dimension| {
                engine
                    .vocabulary(dimension)
                    .map(|encoder| encoder.labels().to_vec())
            };
            print_json(&ApiVocabulary {
                locations: labels(CategoryDimension::Location)?,
                crime_types: labels(CategoryDimension::CrimeType)?,
            })?;
        }
        Commands::Serve => serve(model_dir)?,
    }

    Ok(())
}

fn main() -> ExitCode {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
