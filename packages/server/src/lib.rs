#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web JSON API server for crime-rate predictions.
//!
//! Loads the prediction artifacts once at startup into a shared
//! [`PredictionEngine`] and serves single-point predictions together with
//! their trailing daily series. The request body may be JSON or a submitted
//! form; both are normalized to a
//! [`PredictionRequest`](crime_forecast_prediction_models::PredictionRequest)
//! before reaching the engine.

mod handlers;
pub mod request;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, error, middleware, web};
use crime_forecast_prediction::PredictionEngine;
use crime_forecast_prediction::artifacts::ArtifactConfig;
use crime_forecast_prediction_models::DEFAULT_WINDOW_DAYS;
use crime_forecast_server_models::ApiError;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default bound on a single prediction request, in seconds.
pub const DEFAULT_PREDICT_TIMEOUT_SECS: u64 = 30;

/// Shared application state.
pub struct AppState {
    /// Engine loaded at startup; read-only afterwards.
    pub engine: Arc<PredictionEngine>,
    /// Number of days in each trailing series.
    pub window_days: u32,
    /// Upper bound on the time spent answering one prediction request.
    pub predict_timeout: Duration,
}

impl AppState {
    /// Creates state with the default window and timeout.
    #[must_use]
    pub fn new(engine: PredictionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            window_days: DEFAULT_WINDOW_DAYS,
            predict_timeout: Duration::from_secs(DEFAULT_PREDICT_TIMEOUT_SECS),
        }
    }

    /// Builds state from the environment, loading the artifacts.
    ///
    /// An unreadable manifest is logged and leaves the engine unavailable;
    /// the server still starts so that health checks can report it.
    #[must_use]
    pub fn from_env() -> Self {
        match ArtifactConfig::from_env() {
            Ok(config) => Self::from_config(&config),
            Err(e) => {
                log::error!("Failed to read artifact configuration: {e}");
                Self {
                    predict_timeout: predict_timeout_from_env(),
                    ..Self::new(PredictionEngine::unavailable(e.to_string()))
                }
            }
        }
    }

    /// Loads the artifacts described by `config`; the timeout still comes
    /// from `PREDICT_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_config(config: &ArtifactConfig) -> Self {
        log::info!("Loading artifacts from {}", config.model_dir.display());

        Self {
            engine: Arc::new(PredictionEngine::load(config)),
            window_days: config.window_days(),
            predict_timeout: predict_timeout_from_env(),
        }
    }
}

fn predict_timeout_from_env() -> Duration {
    std::env::var("PREDICT_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map_or(
            Duration::from_secs(DEFAULT_PREDICT_TIMEOUT_SECS),
            Duration::from_secs,
        )
}

/// Turns an extractor failure into a 400 with an [`ApiError`] body.
fn body_error(err: impl std::fmt::Debug + std::fmt::Display + 'static) -> actix_web::Error {
    log::debug!("Rejected request body: {err}");
    let response =
        HttpResponse::BadRequest().json(ApiError::new(format!("Invalid request body: {err}")));
    error::InternalError::from_response(err, response).into()
}

/// Registers the `/api` routes and the body extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req: &HttpRequest| body_error(err)),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req: &HttpRequest| body_error(err)),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/vocabulary", web::get().to(handlers::vocabulary))
            .route("/predict", web::post().to(handlers::predict)),
    );
}

/// Starts the crime forecast API server.
///
/// Loads the artifacts named by `CRIME_FORECAST_MODEL_DIR` and binds to
/// `BIND_ADDR`:`PORT`. This is a regular async function; the caller is
/// responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::try_init_custom_env("RUST_LOG").ok();
    serve(AppState::from_env()).await
}

/// Serves `state` on `BIND_ADDR`:`PORT`.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);
    if !state.engine.is_available() {
        log::warn!("Starting without a model; prediction requests will return 503");
    }

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
