//! HTTP handler functions for the crime forecast API.

use actix_web::{Either, HttpResponse, web};
use crime_forecast_prediction::series::generate_trailing_series;
use crime_forecast_prediction::{ErrorKind, PredictionError};
use crime_forecast_prediction_models::CategoryDimension;
use crime_forecast_server_models::{
    ApiError, ApiHealth, ApiPrediction, ApiVocabulary, PredictForm, PredictJsonBody,
};

use crate::{AppState, request};

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        model_loaded: state.engine.is_available(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/vocabulary`
///
/// Lists the locations and crime types the model was trained on.
pub async fn vocabulary(state: web::Data<AppState>) -> HttpResponse {
    let labels = |dimension| {
        state
            .engine
            .vocabulary(dimension)
            .map(|encoder| encoder.labels().to_vec())
    };

    match (
        labels(CategoryDimension::Location),
        labels(CategoryDimension::CrimeType),
    ) {
        (Ok(locations), Ok(crime_types)) => HttpResponse::Ok().json(ApiVocabulary {
            locations,
            crime_types,
        }),
        (Err(e), _) | (_, Err(e)) => prediction_error(&e),
    }
}

/// `POST /api/predict`
///
/// Accepts either a JSON body or form fields, predicts the crime rate for
/// the requested date and time, and attaches the trailing daily series.
///
/// The work runs on the blocking pool. `AppState::predict_timeout` bounds
/// only how long the response waits for it: after a 504 the blocking task
/// still runs to completion and its result is discarded.
pub async fn predict(
    state: web::Data<AppState>,
    body: Either<web::Json<PredictJsonBody>, web::Form<PredictForm>>,
) -> HttpResponse {
    let normalized = match body {
        Either::Left(json) => request::from_json(json.into_inner()),
        Either::Right(form) => request::from_form(form.into_inner()),
    };
    let request = match normalized {
        Ok(request) => request,
        Err(e) => return HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
    };

    let engine = state.engine.clone();
    let window_days = state.window_days;
    let work = web::block(move || -> Result<ApiPrediction, PredictionError> {
        let result = engine.predict(&request)?;
        let series = generate_trailing_series(&engine, &request, window_days)?;

        Ok(ApiPrediction {
            success: true,
            crime: request.crime_type,
            location: request.location,
            date: request.date,
            time: request.time,
            prediction: result.value,
            daily: series.points.into_iter().map(Into::into).collect(),
        })
    });

    match tokio::time::timeout(state.predict_timeout, work).await {
        Ok(Ok(Ok(prediction))) => HttpResponse::Ok().json(prediction),
        Ok(Ok(Err(e))) => prediction_error(&e),
        Ok(Err(e)) => {
            log::error!("Prediction task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Prediction failed."))
        }
        Err(_) => {
            log::error!(
                "Prediction timed out after {:?}",
                state.predict_timeout
            );
            HttpResponse::GatewayTimeout().json(ApiError::new("Prediction timed out."))
        }
    }
}

/// Maps a pipeline error to its HTTP response.
fn prediction_error(e: &PredictionError) -> HttpResponse {
    let body = ApiError::new(e.to_string()).with_kind(e.kind().to_string());

    match e.kind() {
        ErrorKind::InvalidTimestamp | ErrorKind::UnknownCategory | ErrorKind::InvalidWindow => {
            HttpResponse::BadRequest().json(body)
        }
        ErrorKind::ModelUnavailable => {
            log::error!("Prediction requested but model is unavailable: {e:?}");
            HttpResponse::ServiceUnavailable().json(body)
        }
        ErrorKind::ModelInference => {
            log::error!("Model inference failed: {e}");
            HttpResponse::InternalServerError().json(body)
        }
    }
}
