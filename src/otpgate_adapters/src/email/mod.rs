mod mock_otp_sender;
mod tracing_otp_sender;

pub use mock_otp_sender::MockOtpSender;
pub use tracing_otp_sender::TracingOtpSender;
