//! Error types for the tutor services.

use thiserror::Error;

/// Result type alias using the shared error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unusable configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("GEMINI_API_KEY is not set".into());
        assert_eq!(err.to_string(), "Configuration error: GEMINI_API_KEY is not set");
    }
}
