//! # Otpgate - Email OTP Second-Factor Library
//!
//! This is a facade crate that re-exports all public APIs from the OTP service components.
//! Use this crate to get access to all OTP functionality in one place.
//!
//! ## Usage
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! otpgate = { path = "../otpgate" }
//! ```
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `OtpCode`, `OtpSession`, etc.
//! - **Repository traits**: `SessionStore`, `OtpSender`
//! - **Use cases**: `RequestOtpUseCase`, `VerifyOtpUseCase`
//! - **Adapters**: `HashMapSessionStore`, `RedisSessionStore`, `RateLimiter`, etc.
//! - **Service**: `OtpService` - The main entry point for the OTP service

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use otpgate_core::*;
}

// Re-export most commonly used core types at the root level
pub use otpgate_core::{
    AddressHash, Email, EmailError, OtpCode, OtpCodeError, OtpSession, SessionError,
    SessionSnapshot,
};

// ============================================================================
// Repository Traits (Ports)
// ============================================================================

/// Repository trait definitions
pub mod repositories {
    pub use otpgate_core::{OtpSender, SessionStore, SessionStoreError};
}

// Re-export repository traits at root level
pub use otpgate_core::{OtpSender, SessionStore, SessionStoreError};

// ============================================================================
// Use Cases (Application Layer)
// ============================================================================

/// Application use cases
pub mod use_cases {
    pub use otpgate_application::*;
}

// Re-export use cases at root level
pub use otpgate_application::{Outcome, RequestOtpUseCase, VerifyOtpUseCase};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Persistence implementations
    pub mod persistence {
        pub use otpgate_adapters::persistence::*;
    }

    /// Delivery transport implementations
    pub mod email {
        pub use otpgate_adapters::email::*;
    }

    /// Per-address admission gate
    pub mod rate_limit {
        pub use otpgate_adapters::rate_limit::*;
    }

    /// Configuration
    pub mod config {
        pub use otpgate_adapters::config::*;
    }
}

// Re-export commonly used adapters at root level
pub use otpgate_adapters::{
    email::{MockOtpSender, TracingOtpSender},
    persistence::{HashMapSessionStore, RedisSessionStore},
    rate_limit::{RateLimiter, RateLimiterConfig},
};

// ============================================================================
// OTP Service (Main Entry Point)
// ============================================================================

/// Main OTP service
pub use otpgate_service::OtpService;

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing repository traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};

pub use http;
