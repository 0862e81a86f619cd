//! Normalization of the two accepted request shapes.
//!
//! JSON clients send `location`, `datetime` (`"YYYY-MM-DD HH:MM"`), and
//! `crime_type`; the browser form posts `area`, `date`, `time`, and `crime`.
//! Both become a [`PredictionRequest`].

use crime_forecast_prediction_models::PredictionRequest;
use crime_forecast_server_models::{PredictForm, PredictJsonBody};
use thiserror::Error;

/// Errors raised before a request reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A required field is absent or empty.
    #[error("Missing input data.")]
    MissingInput,

    /// The combined `datetime` field is not `"<date> <time>"`.
    #[error("Invalid date/time format. Use YYYY-MM-DD and HH:MM.")]
    MalformedDatetime {
        /// The value as supplied.
        datetime: String,
    },
}

fn required(value: Option<String>) -> Result<String, RequestError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(RequestError::MissingInput)
}

/// Normalizes a JSON body.
///
/// # Errors
///
/// Returns [`RequestError::MissingInput`] if a field is absent or empty, or
/// [`RequestError::MalformedDatetime`] if `datetime` does not contain exactly
/// one space separating date and time.
pub fn from_json(body: PredictJsonBody) -> Result<PredictionRequest, RequestError> {
    let location = required(body.location)?;
    let datetime = required(body.datetime)?;
    let crime_type = required(body.crime_type)?;

    let mut parts = datetime.split(' ');
    let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(RequestError::MalformedDatetime {
            datetime: datetime.clone(),
        });
    };

    Ok(PredictionRequest::new(date, time, location, crime_type))
}

/// Normalizes a submitted form.
///
/// # Errors
///
/// Returns [`RequestError::MissingInput`] if a field is absent or empty.
pub fn from_form(form: PredictForm) -> Result<PredictionRequest, RequestError> {
    Ok(PredictionRequest::new(
        required(form.date)?,
        required(form.time)?,
        required(form.area)?,
        required(form.crime)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(location: &str, datetime: &str, crime_type: &str) -> PredictJsonBody {
        PredictJsonBody {
            location: Some(location.to_string()),
            datetime: Some(datetime.to_string()),
            crime_type: Some(crime_type.to_string()),
        }
    }

    #[test]
    fn json_and_form_normalize_to_the_same_request() {
        let from_body = from_json(json("Harbor", "2023-06-15 14:30", "Theft")).unwrap();
        let from_fields = from_form(PredictForm {
            area: Some("Harbor".to_string()),
            date: Some("2023-06-15".to_string()),
            time: Some("14:30".to_string()),
            crime: Some("Theft".to_string()),
        })
        .unwrap();

        assert_eq!(from_body, from_fields);
        assert_eq!(
            from_body,
            PredictionRequest::new("2023-06-15", "14:30", "Harbor", "Theft")
        );
    }

    #[test]
    fn missing_or_empty_fields_are_rejected() {
        let mut body = json("Harbor", "2023-06-15 14:30", "Theft");
        body.crime_type = None;
        assert_eq!(from_json(body), Err(RequestError::MissingInput));

        assert_eq!(
            from_json(json("", "2023-06-15 14:30", "Theft")),
            Err(RequestError::MissingInput)
        );
        assert_eq!(
            from_form(PredictForm::default()),
            Err(RequestError::MissingInput)
        );
    }

    #[test]
    fn datetime_needs_exactly_one_space() {
        for datetime in ["2023-06-15T14:30", "2023-06-15  14:30", "2023-06-15 14:30 PM"] {
            assert_eq!(
                from_json(json("Harbor", datetime, "Theft")),
                Err(RequestError::MalformedDatetime {
                    datetime: datetime.to_string(),
                }),
                "{datetime}"
            );
        }
    }
}
