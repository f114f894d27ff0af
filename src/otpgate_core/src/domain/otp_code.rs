use rand::TryRngCore;
use rand::rngs::OsRng;
use thiserror::Error;

/// Codes are fixed at 6 decimal digits.
pub const OTP_LENGTH: usize = 6;

const CODE_SPACE: u32 = 1_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpCodeError {
    #[error("otp must be exactly 6 digits")]
    InvalidFormat,
    #[error("random source failure: {0}")]
    RandomSource(String),
}

/// A 6-digit one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Draws a fresh code from the OS CSPRNG.
    ///
    /// Rejection sampling over the full `u32` range keeps the result uniform
    /// over `000000..=999999`; an entropy failure surfaces as an error rather
    /// than being retried here.
    pub fn generate() -> Result<Self, OtpCodeError> {
        // Largest multiple of CODE_SPACE representable in u32.
        let bound = u32::MAX - (u32::MAX % CODE_SPACE);
        let value = loop {
            let candidate = OsRng
                .try_next_u32()
                .map_err(|e| OtpCodeError::RandomSource(e.to_string()))?;
            if candidate < bound {
                break candidate % CODE_SPACE;
            }
        };

        Ok(Self(format!("{value:06}")))
    }

    /// Parses an existing code, e.g. when rehydrating from storage.
    pub fn parse(raw: &str) -> Result<Self, OtpCodeError> {
        if raw.len() != OTP_LENGTH || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpCodeError::InvalidFormat);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
