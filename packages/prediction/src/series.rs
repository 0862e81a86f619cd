//! Trailing daily series.
//!
//! Drives the [`PredictionEngine`] once per day over the window that ends
//! the day before the requested date. Time, location, and crime type are
//! held fixed; only the date varies.

use chrono::Days;
use crime_forecast_prediction_models::{
    DailySeries, DailySeriesPoint, MAX_WINDOW_DAYS, PredictionRequest,
};

use crate::PredictionError;
use crate::engine::PredictionEngine;
use crate::features::{self, DATE_FORMAT};

/// Factor applied to model scores for display.
pub const DISPLAY_SCALE: f64 = 100.0;

/// Predicts one point per day for the `window_days` days strictly before
/// `request.date`, oldest first.
///
/// The requested date itself is not part of the series. A failure on any
/// day fails the whole series with that day's error.
///
/// # Errors
///
/// * [`PredictionError::ModelUnavailable`] if artifacts failed to load,
///   checked before anything else
/// * [`PredictionError::InvalidWindow`] if `window_days` exceeds
///   [`MAX_WINDOW_DAYS`] or the window reaches before the earliest
///   representable date
/// * [`PredictionError::InvalidTimestamp`] if the end date or time is
///   malformed
/// * any error [`PredictionEngine::predict`] returns for a day in the window
pub fn generate_trailing_series(
    engine: &PredictionEngine,
    request: &PredictionRequest,
    window_days: u32,
) -> Result<DailySeries, PredictionError> {
    engine.ensure_available()?;
    if window_days > MAX_WINDOW_DAYS {
        return Err(PredictionError::InvalidWindow { window_days });
    }

    let end_date = features::parse_date(&request.date, &request.time)?;

    let mut points = Vec::with_capacity(window_days as usize);
    for offset in (1..=u64::from(window_days)).rev() {
        let date = end_date
            .checked_sub_days(Days::new(offset))
            .ok_or(PredictionError::InvalidWindow { window_days })?;

        let day_request = request.with_date(date.format(DATE_FORMAT).to_string());
        let result = engine.predict(&day_request)?;

        points.push(DailySeriesPoint {
            date,
            crime_rate: result.value * DISPLAY_SCALE,
        });
    }

    log::debug!(
        "Generated {} point series ending before {} for {}/{}",
        points.len(),
        request.date,
        request.location,
        request.crime_type
    );

    Ok(DailySeries { points })
}
