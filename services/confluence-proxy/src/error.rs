//! Service error types
//!
//! Only the authorization callback propagates errors as Rust values; content
//! handlers translate upstream failures into responses directly (see
//! `pages::upstream_error_response`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Failures completing a login after the state check passed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("token exchange failed: {0}")]
    TokenExchange(#[from] atlassian_auth::Error),

    #[error("cloud id resolution failed: {0}")]
    CloudId(#[from] confluence::Error),
}

impl AppError {
    /// Atlassian could not be reached in time, as opposed to rejecting us.
    pub fn is_unavailable(&self) -> bool {
        match self {
            AppError::TokenExchange(e) => e.is_unavailable(),
            AppError::CloudId(e) => e.classify() == confluence::ErrorClassification::Unavailable,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "authorization callback failed");
        if self.is_unavailable() {
            (StatusCode::SERVICE_UNAVAILABLE, "Atlassian is unavailable").into_response()
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error completing authorization",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = AppError::from(atlassian_auth::Error::TokenExchange(
            "token endpoint returned 400".into(),
        ));
        assert!(err.to_string().contains("token endpoint returned 400"));

        let err = AppError::from(confluence::Error::NoAccessibleResources);
        assert!(err.to_string().starts_with("cloud id resolution failed"));
    }

    #[test]
    fn rejected_exchange_is_500() {
        let response = AppError::from(atlassian_auth::Error::TokenExchange("400".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unreachable_identity_service_is_503() {
        let response =
            AppError::from(atlassian_auth::Error::Unavailable("timed out".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response =
            AppError::from(confluence::Error::Unavailable("refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn empty_resource_list_is_500() {
        let response = AppError::from(confluence::Error::NoAccessibleResources).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
