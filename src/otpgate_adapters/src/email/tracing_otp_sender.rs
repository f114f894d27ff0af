use otpgate_core::{Email, OtpCode, OtpSender};

/// Delivery stand-in that logs instead of sending.
///
/// Useful in development before a real transport is wired up. The code value
/// only appears at debug level.
#[derive(Debug, Clone, Default)]
pub struct TracingOtpSender;

impl TracingOtpSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl OtpSender for TracingOtpSender {
    async fn send_code(&self, _recipient: &Email, code: &OtpCode) -> Result<(), String> {
        tracing::info!("otp email dispatched");
        tracing::debug!(code = code.as_str(), "otp code for delivery");
        Ok(())
    }
}
