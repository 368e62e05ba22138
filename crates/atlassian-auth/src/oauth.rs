//! OAuth client for the Atlassian authorization code flow
//!
//! Owns the immutable client configuration built once at startup. The
//! authorization URL is a pure function of the configuration and the caller's
//! state; the code exchange is the only operation that performs I/O.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::Secret;
use rand::RngExt;
use url::Url;

use crate::constants::{AUDIENCE, SCOPES};
use crate::error::{Error, Result};
use crate::token::{self, AccessToken};

/// Number of random bytes behind each state value (43 base64url chars).
const STATE_BYTES: usize = 32;

/// OAuth client registration and endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Must match the callback URL registered in the Atlassian developer console
    pub redirect_uri: String,
    pub token_url: String,
    pub authorization_endpoint: String,
}

/// Token Exchange Service.
///
/// Holds a shared `reqwest::Client` and a per-request timeout applied to the
/// token endpoint call.
#[derive(Debug)]
pub struct OAuthClient {
    config: OAuthClientConfig,
    authorization_endpoint: Url,
    http: reqwest::Client,
    timeout: Duration,
}

impl OAuthClient {
    /// Build the client, validating the authorization endpoint up front so
    /// that URL construction can't fail per request.
    pub fn new(config: OAuthClientConfig, http: reqwest::Client, timeout: Duration) -> Result<Self> {
        let authorization_endpoint = Url::parse(&config.authorization_endpoint).map_err(|e| {
            Error::InvalidEndpoint(format!("{}: {e}", config.authorization_endpoint))
        })?;

        Ok(Self {
            config,
            authorization_endpoint,
            http,
            timeout,
        })
    }

    pub fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    /// Fresh CSRF state for one authorization attempt.
    pub fn generate_state(&self) -> String {
        generate_state()
    }

    /// Authorization endpoint URL with the fixed parameter set plus `state`.
    pub fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("audience", AUDIENCE)
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", SCOPES)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", state)
            .append_pair("response_type", "code")
            .append_pair("prompt", "consent");
        url.into()
    }

    /// Exchange a single-use authorization code for an access token.
    ///
    /// Never retried: a second attempt with the same code is always rejected.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        token::exchange_code(&self.http, &self.config, code, self.timeout).await
    }
}

/// Generate an unguessable, URL-safe state value.
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
