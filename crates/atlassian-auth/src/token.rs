//! Authorization code exchange
//!
//! POSTs an `application/x-www-form-urlencoded` body to the configured token
//! endpoint. Atlassian's 3LO flow authenticates the client with
//! `client_id`/`client_secret` in the body rather than HTTP basic auth.

use std::time::Duration;

use common::Secret;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::oauth::OAuthClientConfig;

/// Response body from the token endpoint. Extra fields (`scope`,
/// `token_type`) are ignored.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
}

/// Access token handed back to the caller. Never stored server-side.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: Secret<String>,
    pub expires_in_secs: u64,
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        Self {
            token: Secret::new(response.access_token),
            expires_in_secs: response.expires_in,
        }
    }
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &OAuthClientConfig,
    code: &str,
    timeout: Duration,
) -> Result<AccessToken> {
    let response = client
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.expose().as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        warn!(%status, "token endpoint rejected authorization code");
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        )));
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))?;

    debug!(expires_in = token.expires_in, "access token obtained");
    Ok(token.into())
}
