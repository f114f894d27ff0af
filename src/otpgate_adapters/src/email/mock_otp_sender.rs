use std::sync::{Arc, Mutex};

use otpgate_core::{Email, OtpCode, OtpSender};
use secrecy::ExposeSecret;

/// Test double that records every delivery.
#[derive(Debug, Clone, Default)]
pub struct MockOtpSender {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockOtpSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// The code most recently handed to delivery, if any.
    pub fn last_code(&self) -> Option<String> {
        self.sent
            .lock()
            .expect("sender mutex poisoned")
            .last()
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sender mutex poisoned").len()
    }
}

#[async_trait::async_trait]
impl OtpSender for MockOtpSender {
    async fn send_code(&self, recipient: &Email, code: &OtpCode) -> Result<(), String> {
        self.sent.lock().expect("sender mutex poisoned").push((
            recipient.as_ref().expose_secret().clone(),
            code.as_str().to_string(),
        ));
        Ok(())
    }
}
