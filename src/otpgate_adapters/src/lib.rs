pub mod config;
pub mod email;
pub mod persistence;
pub mod rate_limit;

pub use config::{AllowedOrigins, Settings};
pub use email::{MockOtpSender, TracingOtpSender};
pub use persistence::{HashMapSessionStore, RedisSessionStore, SessionRecord};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
