use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderValue, Method, header, request},
    middleware::from_fn_with_state,
    routing::post,
};
use otpgate_adapters::{AllowedOrigins, RateLimiter};
use otpgate_core::{OtpSender, SessionStore};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod middleware;
pub mod routes;
pub mod tracing;

use crate::tracing::{make_span_with_request_id, on_request, on_response};

/// The OTP second-factor service: request-a-code and verify-a-code behind a
/// per-address admission gate.
pub struct OtpService {
    router: Router,
}

impl OtpService {
    /// Create a new OtpService with the provided store, sender and limiter
    ///
    /// # Arguments
    /// * `sessions` - Store for OTP sessions (must be Clone)
    /// * `sender` - Delivery transport for issued codes (must be Clone)
    /// * `limiter` - Per-address admission gate applied ahead of both routes
    ///
    /// # Note on Architecture
    /// Stores implement Clone via internal Arc for thread-safe sharing. Each
    /// route is given its specific state requirements, avoiding unnecessary
    /// cloning.
    pub fn new<S, M>(sessions: S, sender: M, limiter: RateLimiter) -> Self
    where
        S: SessionStore + Clone + 'static,
        M: OtpSender + Clone + 'static,
    {
        let router = Router::new()
            // Issuance needs the store and the delivery transport
            .route("/otp/request", post(routes::request_otp::<S, M>))
            .with_state((sessions.clone(), sender))
            // Verification only needs the store
            .route("/otp/verify", post(routes::verify_otp::<S>))
            .with_state(sessions)
            // Admission gate ahead of both operations
            .layer(from_fn_with_state(limiter, middleware::rate_limit));

        Self { router }
    }

    fn with_trace_layer(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span_with_request_id)
                .on_request(on_request)
                .on_response(on_response),
        );
        self
    }

    /// Convert the OtpService into a router that can be mounted on another
    /// application
    pub fn as_router(mut self, allowed_origins: Option<AllowedOrigins>) -> Router {
        if let Some(allowed_origins) = allowed_origins {
            let cors = CorsLayer::new()
                .allow_methods([Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(AllowOrigin::predicate(
                    move |origin: &HeaderValue, _request_parts: &request::Parts| {
                        allowed_origins.contains(origin)
                    },
                ));

            self.router = self.router.layer(cors);
        }
        self.with_trace_layer().router
    }

    /// Run the OTP service as a standalone server
    ///
    /// Serves with connect-info so the rate limiter can fall back to the
    /// socket address when no forwarding header is present.
    pub async fn run(
        self,
        listener: TcpListener,
        allowed_origins: Option<AllowedOrigins>,
    ) -> Result<(), std::io::Error> {
        let router = self.as_router(allowed_origins);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
