pub mod outcome;
pub mod use_cases;

pub use outcome::Outcome;
pub use use_cases::{
    request_otp::{RequestContext, RequestOtpError, RequestOtpUseCase},
    verify_otp::{VerifyOtpError, VerifyOtpUseCase},
};
