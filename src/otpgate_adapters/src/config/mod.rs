use std::time::Duration;

use http::HeaderValue;
use serde::Deserialize;

use crate::rate_limit::RateLimiterConfig;

/// Runtime settings, loaded from the environment (prefix `OTPGATE`, `__` as
/// the section separator, e.g. `OTPGATE__SERVER__PORT=8080`). A `.env` file
/// is honored when present.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub rate_limit: RateLimitSettings,
    pub redis: Option<RedisSettings>,
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    pub requests_per_minute: u32,
    pub burst: u32,
    pub sweep_interval_secs: u64,
    pub idle_after_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("rate_limit.requests_per_minute", 5)?
            .set_default("rate_limit.burst", 5)?
            .set_default("rate_limit.sweep_interval_secs", 180)?
            .set_default("rate_limit.idle_after_secs", 120)?
            .add_source(
                config::Environment::with_prefix("OTPGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl RateLimitSettings {
    pub fn limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            requests_per_minute: self.requests_per_minute,
            burst: self.burst,
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            idle_after: Duration::from_secs(self.idle_after_secs),
        }
    }
}

/// CORS origins the service answers for.
#[derive(Debug, Clone)]
pub struct AllowedOrigins(Vec<HeaderValue>);

impl AllowedOrigins {
    /// Keeps only origins that form valid header values.
    pub fn parse(origins: &[String]) -> Self {
        Self(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect(),
        )
    }

    pub fn contains(&self, origin: &HeaderValue) -> bool {
        self.0.iter().any(|allowed| allowed == origin)
    }
}
