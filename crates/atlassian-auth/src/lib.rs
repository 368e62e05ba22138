//! Atlassian OAuth 2.0 authorization code flow
//!
//! Provides CSRF state generation, authorization URL construction, the
//! authorization code exchange, and the store correlating issued states
//! with their post-login redirect. The proxy binary wires these behind
//! `/auth/authorize` and `/auth/callback`.
//!
//! Flow:
//! 1. `OAuthClient::generate_state()` issues an unguessable state
//! 2. `PendingAuthorizations::insert()` remembers where to send the user
//! 3. The browser is redirected to `OAuthClient::authorization_url()`
//! 4. On callback, `PendingAuthorizations::take()` consumes the state
//! 5. `OAuthClient::exchange_code()` trades the code for an access token

pub mod constants;
pub mod error;
pub mod oauth;
pub mod pending;
pub mod token;

pub use constants::*;
pub use error::{Error, Result};
pub use oauth::{OAuthClient, OAuthClientConfig, generate_state};
pub use pending::{PendingAuthorization, PendingAuthorizations};
pub use token::{AccessToken, TokenResponse, exchange_code};
