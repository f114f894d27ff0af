pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    address_hash::AddressHash,
    email::{Email, EmailError},
    otp_code::{OTP_LENGTH, OtpCode, OtpCodeError},
    session::{
        MAX_VERIFICATION_ATTEMPTS, OtpSession, RestoreError, SESSION_LIFETIME_MINUTES,
        SessionError, SessionSnapshot,
    },
};

pub use ports::{
    repositories::{SessionStore, SessionStoreError},
    services::OtpSender,
};
