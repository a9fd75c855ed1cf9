use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use onboarding::OnboardingError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Onboarding(#[from] OnboardingError),
    #[error("Invalid customer ID: '{0}'")]
    InvalidCustomerId(String),
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every body carries an `error` category and a `message`. Database and
/// stored-data failures are logged in full and answered with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InvalidCustomerId(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_customer_id", "message": self.to_string() }),
            ),
            AppError::MalformedBody(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "malformed_body", "message": "Request body is not a valid customer payload", "details": [message] }),
            ),
            AppError::Onboarding(err) => onboarding_response(err),
        };

        (status, Json(body)).into_response()
    }
}

fn onboarding_response(err: OnboardingError) -> (StatusCode, serde_json::Value) {
    let category = err.category();
    match &err {
        OnboardingError::ValidationFailed(violations) => {
            let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
            (
                StatusCode::BAD_REQUEST,
                json!({ "error": category, "message": "Customer payload failed validation", "details": details }),
            )
        }
        OnboardingError::DuplicateField(field) => (
            StatusCode::CONFLICT,
            json!({ "error": category, "field": field, "message": err.to_string() }),
        ),
        OnboardingError::UnknownReference { field, .. } => (
            StatusCode::BAD_REQUEST,
            json!({ "error": category, "field": field, "message": err.to_string() }),
        ),
        OnboardingError::CustomerNotFound(_) => (
            StatusCode::NOT_FOUND,
            json!({ "error": category, "message": err.to_string() }),
        ),
        OnboardingError::ConnectionUnavailable(_) | OnboardingError::QueryExecutionError(_) => {
            tracing::error!(error = %err, "Database error.");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": category, "message": "An internal database error occurred" }),
            )
        }
        OnboardingError::MalformedIdentifier { .. }
        | OnboardingError::InvalidKeyFormat { .. }
        | OnboardingError::UnknownAccountType(_)
        | OnboardingError::SequenceOverflow(_) => {
            tracing::error!(error = %err, "Account identifiers could not be generated.");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": category, "message": "Account identifiers could not be generated" }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboarding::UniqueField;

    #[test]
    fn duplicate_fields_are_conflicts_naming_the_field() {
        let (status, body) = onboarding_response(OnboardingError::DuplicateField(UniqueField::Phone));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "duplicate_field");
        assert_eq!(body["field"], "phone");
    }

    #[test]
    fn database_details_are_not_exposed() {
        let err = OnboardingError::QueryExecutionError("relation \"customers\" does not exist".to_string());
        let (status, body) = onboarding_response(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "query_execution_error");
        assert!(!body.to_string().contains("relation"));
    }

    #[test]
    fn identifier_failures_are_server_errors() {
        let (status, body) = onboarding_response(OnboardingError::SequenceOverflow("accounts.account_no".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "sequence_overflow");
        assert!(!body.to_string().contains("accounts.account_no"));
    }
}
