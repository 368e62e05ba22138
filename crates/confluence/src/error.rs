//! Confluence client errors

use crate::ErrorClassification;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Upstream answered with a non-success status
    #[error("Confluence returned {status}")]
    Status { status: u16 },

    #[error("Confluence unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid Confluence response: {0}")]
    InvalidResponse(String),

    #[error("no space with key {0}")]
    SpaceNotFound(String),

    /// Id that can't be addressed as a single path segment (`.` or `..`)
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    #[error("access token has no accessible Confluence sites")]
    NoAccessibleResources,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Upstream HTTP status, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status } => Some(*status),
            _ => None,
        }
    }

    pub fn classify(&self) -> ErrorClassification {
        match self {
            Error::Status { status: 401 } => ErrorClassification::Unauthorized,
            Error::Status { status: 404 } | Error::SpaceNotFound(_) | Error::InvalidId(_) => {
                ErrorClassification::NotFound
            }
            Error::Status { status: 400 } => ErrorClassification::BadRequest,
            Error::Unavailable(_) => ErrorClassification::Unavailable,
            _ => ErrorClassification::Other,
        }
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

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_classify() {
        assert_eq!(
            Error::Status { status: 401 }.classify(),
            ErrorClassification::Unauthorized
        );
        assert_eq!(
            Error::Status { status: 404 }.classify(),
            ErrorClassification::NotFound
        );
        assert_eq!(
            Error::Status { status: 400 }.classify(),
            ErrorClassification::BadRequest
        );
        assert_eq!(
            Error::Status { status: 403 }.classify(),
            ErrorClassification::Other
        );
        assert_eq!(
            Error::Status { status: 500 }.classify(),
            ErrorClassification::Other
        );
    }

    #[test]
    fn local_failures_classify() {
        assert_eq!(
            Error::SpaceNotFound("NOPE".into()).classify(),
            ErrorClassification::NotFound
        );
        assert_eq!(
            Error::InvalidId("..".into()).classify(),
            ErrorClassification::NotFound
        );
        assert_eq!(
            Error::Unavailable("timed out".into()).classify(),
            ErrorClassification::Unavailable
        );
        assert_eq!(
            Error::InvalidResponse("eof".into()).classify(),
            ErrorClassification::Other
        );
        assert_eq!(
            Error::NoAccessibleResources.classify(),
            ErrorClassification::Other
        );
    }

    #[test]
    fn status_accessor() {
        assert_eq!(Error::Status { status: 502 }.status(), Some(502));
        assert_eq!(Error::Http("reset".into()).status(), None);
    }
}
