mod request_otp;
mod verify_otp;

pub use request_otp::request_otp;
pub use verify_otp::verify_otp;
