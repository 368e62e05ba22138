//! Configuration error types

use thiserror::Error;

/// Errors raised while assembling process configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let config_err = Error::Config("timeout_secs must be greater than 0".into());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: timeout_secs must be greater than 0"
        );

        let missing = Error::MissingVar("CLIENT_ID".into());
        assert_eq!(
            missing.to_string(),
            "Missing required environment variable: CLIENT_ID"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: Error =
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found").into();
        assert!(err.to_string().starts_with("I/O error:"), "got: {err}");
    }
}
