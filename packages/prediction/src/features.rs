//! Temporal feature derivation.
//!
//! Turns a date string, a time string, and the two vocabulary codes into the
//! [`FeatureVector`] the model was trained on.

use chrono::{Datelike as _, NaiveDate, NaiveDateTime, NaiveTime, Timelike as _};
use crime_forecast_prediction_models::FeatureVector;

use crate::PredictionError;

/// Format of request dates (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted time formats, each paired with its exact layout (`9` marks a
/// digit). Seconds are tolerated but ignored by the model.
const TIME_FORMATS: &[(&str, &str)] = &[("%H:%M", "99:99"), ("%H:%M:%S", "99:99:99")];

/// Exact layout of [`DATE_FORMAT`].
const DATE_LAYOUT: &str = "9999-99-99";

/// chrono's numeric specifiers accept unpadded and signed fields, so the
/// layout is checked separately.
fn matches_layout(value: &str, layout: &str) -> bool {
    value.len() == layout.len()
        && value
            .bytes()
            .zip(layout.bytes())
            .all(|(c, l)| if l == b'9' { c.is_ascii_digit() } else { c == l })
}

fn invalid(date: &str, time: &str) -> PredictionError {
    PredictionError::InvalidTimestamp {
        date: date.to_string(),
        time: time.to_string(),
    }
}

/// Parses a request date. `time` is only used to fill in the error.
///
/// # Errors
///
/// Returns [`PredictionError::InvalidTimestamp`] if `date` is not a valid
/// `YYYY-MM-DD` calendar date.
pub fn parse_date(date: &str, time: &str) -> Result<NaiveDate, PredictionError> {
    if !matches_layout(date, DATE_LAYOUT) {
        return Err(invalid(date, time));
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid(date, time))
}

/// Parses a request date and time into a timestamp.
///
/// # Errors
///
/// Returns [`PredictionError::InvalidTimestamp`] if either part is malformed
/// or out of range (e.g. `25:00`).
pub fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime, PredictionError> {
    let day = parse_date(date, time)?;
    let time_of_day = TIME_FORMATS
        .iter()
        .filter(|(_, layout)| matches_layout(time, layout))
        .find_map(|(format, _)| NaiveTime::parse_from_str(time, format).ok())
        // A leap second parses into the extra nanosecond range.
        .filter(|t| t.nanosecond() < 1_000_000_000)
        .ok_or_else(|| invalid(date, time))?;

    Ok(day.and_time(time_of_day))
}

/// Derives the feature vector for an already-parsed timestamp.
#[must_use]
pub fn features_at(
    timestamp: NaiveDateTime,
    location_code: u32,
    crime_type_code: u32,
) -> FeatureVector {
    FeatureVector {
        location_code,
        crime_type_code,
        month: timestamp.month(),
        day: timestamp.day(),
        weekday: timestamp.weekday().num_days_from_monday(),
        hour: timestamp.hour(),
    }
}

/// Builds the feature vector for a request.
///
/// # Errors
///
/// Returns [`PredictionError::InvalidTimestamp`] if the date or time cannot
/// be parsed.
pub fn build_features(
    date: &str,
    time: &str,
    location_code: u32,
    crime_type_code: u32,
) -> Result<FeatureVector, PredictionError> {
    let timestamp = parse_timestamp(date, time)?;
    Ok(features_at(timestamp, location_code, crime_type_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_thursday_afternoon_fields() {
        let features = build_features("2023-06-15", "14:30", 4, 9).unwrap();

        assert_eq!(
            features,
            FeatureVector {
                location_code: 4,
                crime_type_code: 9,
                month: 6,
                day: 15,
                weekday: 3,
                hour: 14,
            }
        );
    }

    #[test]
    fn weekday_counts_from_monday() {
        // 2023-06-12 was a Monday.
        for offset in 0..7u32 {
            let date = format!("2023-06-{:02}", 12 + offset);
            let features = build_features(&date, "00:00", 0, 0).unwrap();
            assert_eq!(features.weekday, offset, "{date}");
        }
    }

    #[test]
    fn accepts_seconds_and_midnight() {
        let features = build_features("2024-02-29", "23:59:59", 0, 0).unwrap();
        assert_eq!((features.month, features.day, features.hour), (2, 29, 23));

        let features = build_features("2024-01-01", "00:00", 0, 0).unwrap();
        assert_eq!(features.hour, 0);
    }

    #[test]
    fn rejects_malformed_timestamps() {
        for (date, time) in [
            ("15-06-2023", "14:30"),
            ("2023-06-15", "25:00"),
            ("2023-02-30", "10:00"),
            ("2023-06-15", "2:30 PM"),
            ("", "14:30"),
            ("2023-06-15", ""),
            ("2023/06/15", "14:30"),
            ("2023-6-5", "14:30"),
            ("+2023-06-15", "14:30"),
            ("12023-06-15", "14:30"),
            ("2023-06-15", "9:5"),
            ("2023-06-15", "9:05"),
            ("2023-06-15", "14:30:60"),
            ("2023-06-15", "14:30:5"),
            ("2023-06-15", " 14:30"),
        ] {
            let err = build_features(date, time, 0, 0).unwrap_err();
            assert_eq!(
                err,
                PredictionError::InvalidTimestamp {
                    date: date.to_string(),
                    time: time.to_string(),
                },
                "{date} {time} should be rejected"
            );
        }
    }
}
