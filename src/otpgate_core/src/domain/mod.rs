pub mod address_hash;
pub mod email;
pub mod otp_code;
pub mod session;
