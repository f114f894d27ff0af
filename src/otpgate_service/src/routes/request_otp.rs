use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use otpgate_application::{RequestContext, RequestOtpUseCase};
use otpgate_core::{OtpSender, SessionStore};
use serde::Deserialize;

use crate::{error::ApiError, middleware::ClientAddr};

#[derive(Debug, Deserialize)]
pub struct RequestOtpBody {
    pub email: String,
}

#[tracing::instrument(name = "Request OTP", skip_all)]
pub async fn request_otp<S, M>(
    State((sessions, sender)): State<(S, M)>,
    address: Option<Extension<ClientAddr>>,
    headers: HeaderMap,
    Json(body): Json<RequestOtpBody>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionStore + Clone + 'static,
    M: OtpSender + Clone + 'static,
{
    let context = RequestContext {
        address: address.and_then(|Extension(ClientAddr(addr))| addr),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
    };

    RequestOtpUseCase::new(sessions, sender)
        .execute(&body.email, context)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "verification code sent" })),
    ))
}
