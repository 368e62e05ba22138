//! Error types for OAuth operations

/// Errors from the authorization code flow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Timeout or connection failure talking to the identity service.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}

impl Error {
    /// Whether the failure means the identity service could not be reached
    /// at all, as opposed to rejecting the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::Unavailable(e.to_string())
        } else {
            Error::Http(e.to_string())
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
