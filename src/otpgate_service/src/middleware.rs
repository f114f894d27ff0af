use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use otpgate_adapters::RateLimiter;

/// Client address resolved for this request, stashed as an extension so the
/// issuance handler can attach it to the session's audit metadata.
#[derive(Debug, Clone)]
pub struct ClientAddr(pub Option<String>);

/// Admission gate ahead of both OTP operations. Rejections get a distinct
/// body so callers know to back off.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    mut request: Request,
    next: Next,
) -> Response {
    let address = client_address(&request);

    // Unattributable traffic shares one bucket rather than bypassing the
    // limiter.
    let key = address.as_deref().unwrap_or("unknown");
    if !limiter.admit(key) {
        tracing::warn!("rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "rate limit exceeded, retry later" })),
        )
            .into_response();
    }

    request.extensions_mut().insert(ClientAddr(address));
    next.run(request).await
}

/// Prefers the first `x-forwarded-for` hop, falling back to the socket
/// address when the service faces clients directly.
fn client_address(request: &Request) -> Option<String> {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}
