//! Confluence Cloud REST client
//!
//! Read-only access to the Confluence v2 API on behalf of a user holding an
//! OAuth access token: resolve the tenant's cloud id, look up a space by key,
//! list its pages, and fetch a single page's rendered body.
//!
//! Failures carry the upstream status so callers can apply their own
//! client-facing policy via `Error::classify`.

pub mod client;
pub mod error;
pub mod types;

pub use client::ConfluenceClient;
pub use error::{Error, Result};
pub use types::{AccessibleResource, Page, PageContent, Space};

/// Coarse classification of an upstream failure.
///
/// Drives the client-facing mapping in the proxy:
/// - Unauthorized invalidates the caller's session
/// - NotFound and BadRequest describe the requested resource
/// - Unavailable means Confluence could not be reached in time
/// - Other covers every remaining failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    /// Upstream returned 401; the access token is invalid or expired
    Unauthorized,
    /// Upstream returned 404, or a lookup produced no match
    NotFound,
    /// Upstream returned 400 (malformed id or key)
    BadRequest,
    /// Timeout or connection failure
    Unavailable,
    /// Any other status, decode failure, or transport error
    Other,
}

impl ErrorClassification {
    /// Metric/log label
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClassification::Unauthorized => "unauthorized",
            ErrorClassification::NotFound => "not_found",
            ErrorClassification::BadRequest => "bad_request",
            ErrorClassification::Unavailable => "unavailable",
            ErrorClassification::Other => "other",
        }
    }
}
