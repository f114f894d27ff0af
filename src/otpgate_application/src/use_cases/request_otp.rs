use otpgate_core::{
    Email, EmailError, OtpCode, OtpCodeError, OtpSender, OtpSession, SessionStore,
    SessionStoreError,
};
use secrecy::Secret;

use crate::outcome::Outcome;

/// Audit metadata travelling with an issuance request. The address, when
/// present, is only ever stored hashed.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub address: Option<String>,
    pub user_agent: Option<String>,
}

/// Error types for the request-OTP use case
#[derive(Debug, thiserror::Error)]
pub enum RequestOtpError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("failed to generate code: {0}")]
    CodeGeneration(#[from] OtpCodeError),
    #[error("session store error: {0}")]
    SessionStore(#[from] SessionStoreError),
    #[error("failed to send code: {0}")]
    Delivery(String),
}

impl RequestOtpError {
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::InvalidEmail(_) => Outcome::InvalidEmail,
            Self::CodeGeneration(_) | Self::SessionStore(_) | Self::Delivery(_) => {
                Outcome::Infrastructure
            }
        }
    }
}

/// Request OTP use case - issues a fresh code and hands it to delivery
pub struct RequestOtpUseCase<S, M>
where
    S: SessionStore,
    M: OtpSender,
{
    sessions: S,
    sender: M,
}

impl<S, M> RequestOtpUseCase<S, M>
where
    S: SessionStore,
    M: OtpSender,
{
    pub fn new(sessions: S, sender: M) -> Self {
        Self { sessions, sender }
    }

    /// Execute the request-OTP use case
    ///
    /// Validates the email, generates a code, persists a fresh session and
    /// only then attempts delivery: a code that was not durably recorded is
    /// never sent. A delivery failure after a successful save is an error,
    /// but the session stays persisted; re-issuance overwrites it.
    #[tracing::instrument(name = "RequestOtpUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        raw_email: &str,
        context: RequestContext,
    ) -> Result<(), RequestOtpError> {
        let email = Email::try_from(Secret::from(raw_email.to_string()))?;
        let code = OtpCode::generate()?;

        let session = match context.address.as_deref() {
            Some(address) => OtpSession::with_audit(
                email.clone(),
                code.clone(),
                address,
                context.user_agent.as_deref().unwrap_or(""),
            ),
            None => OtpSession::new(email.clone(), code.clone()),
        };

        self.sessions.save(&session).await?;

        self.sender
            .send_code(&email, &code)
            .await
            .map_err(RequestOtpError::Delivery)?;

        tracing::info!("otp session issued");
        Ok(())
    }
}
