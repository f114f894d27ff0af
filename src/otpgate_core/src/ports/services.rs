use async_trait::async_trait;

use crate::domain::{email::Email, otp_code::OtpCode};

/// Delivery transport for issued codes. Fire-and-confirm; retry policy, if
/// any, belongs to the caller.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send_code(&self, recipient: &Email, code: &OtpCode) -> Result<(), String>;
}
