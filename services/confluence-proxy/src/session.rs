//! Cookie-carried session and the extractor guarding `/pages`
//!
//! The server keeps no session record: the access token and cloud id live
//! in two `HttpOnly` cookies. The token is treated as an opaque capability;
//! it is never decoded or verified locally and is only discovered to be
//! invalid when Confluence answers 401.

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use common::Secret;
use tracing::{debug, warn};

use crate::auth::found;

pub const TOKEN_COOKIE: &str = "confluenceToken";
pub const CLOUD_ID_COOKIE: &str = "confluenceCloudId";

/// Attributes shared by every session cookie the proxy writes.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value for a session cookie living `max_age_secs`.
    pub fn session_cookie(&self, name: &str, value: &str, max_age_secs: u64) -> String {
        let mut cookie = format!(
            "{name}={}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Lax",
            urlencoding::encode(value)
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that deletes `name`.
    pub fn cleared_cookie(&self, name: &str) -> String {
        let mut cookie = format!(
            "{name}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/; HttpOnly; SameSite=Lax"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Append both session cookies, expiring with the access token.
    pub fn set_session(&self, headers: &mut HeaderMap, token: &str, cloud_id: &str, max_age_secs: u64) {
        append_cookie(headers, self.session_cookie(CLOUD_ID_COOKIE, cloud_id, max_age_secs));
        append_cookie(headers, self.session_cookie(TOKEN_COOKIE, token, max_age_secs));
    }

    /// Append deletions for both session cookies.
    pub fn clear_session(&self, headers: &mut HeaderMap) {
        append_cookie(headers, self.cleared_cookie(TOKEN_COOKIE));
        append_cookie(headers, self.cleared_cookie(CLOUD_ID_COOKIE));
    }
}

fn append_cookie(headers: &mut HeaderMap, cookie: String) {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "dropping cookie with invalid header value"),
    }
}

/// Read a cookie from every `Cookie` header on the request. Values are
/// percent-decoded; empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            let value = value.trim_matches('"');
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
        .filter(|value| !value.is_empty())
}

/// Location of the authorization entry point that returns to `original`.
pub fn authorize_location(original: &str) -> String {
    format!("/auth/authorize?redirectTo={}", urlencoding::encode(original))
}

/// Session cookies extracted from the request. This extractor is the
/// Session Guard.
///
/// A request without a token cookie is rejected with a redirect to
/// `/auth/authorize`, carrying the original path and query so the user lands
/// back there after login. `cloud_id` is optional so handlers can decide how
/// to treat a session that lost its second cookie.
#[derive(Debug)]
pub struct Session {
    pub token: Secret<String>,
    pub cloud_id: Option<String>,
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = read_cookie(&parts.headers, TOKEN_COOKIE) else {
            let original = parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            debug!(path = original, "no session cookie, redirecting to authorize");
            return Err(found(&authorize_location(original)));
        };

        Ok(Session {
            token: Secret::new(token),
            cloud_id: read_cookie(&parts.headers, CLOUD_ID_COOKIE),
        })
    }
}
