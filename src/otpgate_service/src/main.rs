use std::sync::Arc;

use color_eyre::eyre::Result;
use otpgate_adapters::{
    AllowedOrigins, HashMapSessionStore, RateLimiter, RedisSessionStore, Settings,
    TracingOtpSender,
};
use otpgate_service::OtpService;
use redis::Client;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    color_eyre::install().expect("Failed to install color_eyre");
    init_tracing().expect("Failed to initialize tracing");

    // Load configuration
    let settings = Settings::load()?;

    // Admission gate, with its idle-entry sweeper running for the lifetime
    // of the process
    let limiter = RateLimiter::new(settings.rate_limit.limiter_config());
    let _sweeper = limiter.spawn_sweeper();

    let allowed_origins = settings
        .allowed_origins
        .as_deref()
        .map(AllowedOrigins::parse);

    let bind = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("otp service listening on {bind}");

    // Delivery transport: log-only until a real sender is wired up
    let sender = TracingOtpSender::new();

    match &settings.redis {
        Some(redis_settings) => {
            let client = Client::open(redis_settings.url.as_str())?;
            let conn = Arc::new(RwLock::new(client.get_connection()?));
            let sessions = RedisSessionStore::new(conn);

            OtpService::new(sessions, sender, limiter)
                .run(listener, allowed_origins)
                .await?;
        }
        None => {
            tracing::warn!("no redis configured, sessions are in-memory only");
            let sessions = HashMapSessionStore::new();

            OtpService::new(sessions, sender, limiter)
                .run(listener, allowed_origins)
                .await?;
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let fmt_layer = fmt::layer().compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}
