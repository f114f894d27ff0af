use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use otpgate_application::{Outcome, RequestOtpError, VerifyOtpError};

/// Boundary mapping from classified outcomes to HTTP responses.
///
/// Every generic rejection shares one status and body, so the wire never
/// reveals whether an email had an active session. Infrastructure detail is
/// logged here and never serialized.
pub struct ApiError {
    outcome: Outcome,
    detail: String,
}

impl From<RequestOtpError> for ApiError {
    fn from(error: RequestOtpError) -> Self {
        Self {
            outcome: error.outcome(),
            detail: error.to_string(),
        }
    }
}

impl From<VerifyOtpError> for ApiError {
    fn from(error: VerifyOtpError) -> Self {
        Self {
            outcome: error.outcome(),
            detail: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.outcome {
            Outcome::InvalidEmail => (StatusCode::BAD_REQUEST, "invalid email address"),
            Outcome::CodeRejected => (StatusCode::UNAUTHORIZED, "invalid or expired code"),
            Outcome::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate limit exceeded, retry later",
            ),
            Outcome::Infrastructure => {
                tracing::error!(detail = %self.detail, "request failed on infrastructure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
