//! Tutor Common - Shared configuration, errors, and logging for the HCM tutor services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types
//! - Logging setup
//! - String helpers for safe logging

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{Config, LlmConfig, NetworkConfig, ObservabilityConfig, RelayConfig, SecretsConfig};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
