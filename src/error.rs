//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::inference::InferenceError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Malformed or incomplete request body
    ValidationError(String),

    // Artifacts were never loaded
    ModelUnavailable,

    // Anything else raised while extracting or scoring
    InternalError(String),
}

impl AppError {
    /// Machine-readable code carried in the response body
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::ModelUnavailable => "MODEL_UNAVAILABLE",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error_message = match self {
            AppError::ValidationError(msg) => {
                tracing::debug!("Validation error: {}", msg);
                msg
            }
            AppError::ModelUnavailable => {
                tracing::warn!("Prediction requested while models are unavailable");
                "Models unavailable".to_string()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Prediction error: {}", msg);
                format!("Internal error: {}", msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code
        }));

        (status, body).into_response()
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first offending field in name order so the message is stable
        let mut fields: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("The field '{}' is required", field));
                (field.to_string(), message)
            })
            .collect();
        fields.sort();

        match fields.into_iter().next() {
            Some((_, message)) => AppError::ValidationError(message),
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_pairs() {
        let cases = [
            (AppError::ValidationError("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AppError::ModelUnavailable, StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
            (AppError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_internal_error_embeds_message() {
        let response = AppError::InternalError("row has 3 columns, scaler expects 4".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
