use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use otpgate_application::VerifyOtpUseCase;
use otpgate_core::SessionStore;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct VerifyOtpBody {
    pub email: String,
    pub code: String,
}

#[tracing::instrument(name = "Verify OTP", skip_all)]
pub async fn verify_otp<S>(
    State(sessions): State<S>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionStore + Clone + 'static,
{
    VerifyOtpUseCase::new(sessions)
        .execute(&body.email, &body.code)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "code verified" })),
    ))
}
