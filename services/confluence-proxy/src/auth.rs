//! Authorization flow controller
//!
//! `GET /auth/authorize` issues a CSRF state, records where the user should
//! return, and redirects to Atlassian. `GET /auth/callback` validates the
//! state, exchanges the code, resolves the cloud id, and sets the session
//! cookies. The controller keeps nothing between requests except the
//! pending-state store.

use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};

use crate::AppState;
use crate::error::AppError;

/// 302 Found. axum's `Redirect` only offers 303/307/308.
pub fn found(location: &str) -> Response {
    let value = HeaderValue::from_str(location).unwrap_or_else(|_| {
        warn!("redirect target is not a valid header value, falling back to /");
        HeaderValue::from_static("/")
    });
    (StatusCode::FOUND, [(LOCATION, value)]).into_response()
}

/// What to do with a caller-supplied `redirectTo`.
#[derive(Debug, Clone, Copy)]
pub struct RedirectPolicy {
    /// Accept only same-origin relative paths
    pub restrict: bool,
}

impl RedirectPolicy {
    /// Post-login target. Absent or empty means `/`.
    pub fn resolve(&self, redirect_to: Option<String>) -> String {
        match redirect_to.filter(|r| !r.is_empty()) {
            None => "/".into(),
            Some(target) if !self.restrict || is_same_origin_path(&target) => target,
            Some(target) => {
                warn!(redirect_to = %target, "rejected off-site redirect target");
                "/".into()
            }
        }
    }
}

fn is_same_origin_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GET /auth/authorize: start a login.
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let oauth_state = state.oauth.generate_state();
    let redirect_to = state.redirects.resolve(params.redirect_to);

    state
        .pending
        .insert(oauth_state.clone(), redirect_to.clone())
        .await;

    info!(redirect_to = %redirect_to, "redirecting to Atlassian authorization endpoint");
    found(&state.oauth.authorization_url(&oauth_state))
}

/// GET /auth/callback: finish a login.
///
/// Guard order: missing parameters, then unknown state. The state is
/// consumed before the code exchange, so it can never be replayed even if
/// the exchange fails. Exchange and cloud id failures go to `AppError` and
/// set no cookies.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    if let Some(error) = params.error.as_deref() {
        warn!(
            error,
            description = params.error_description.as_deref().unwrap_or(""),
            "authorization server returned an error"
        );
    }

    let code = params.code.filter(|c| !c.is_empty());
    let oauth_state = params.state.filter(|s| !s.is_empty());
    let (Some(code), Some(oauth_state)) = (code, oauth_state) else {
        crate::metrics::record_login("missing_code");
        return Ok((StatusCode::BAD_REQUEST, "Missing code").into_response());
    };

    let Some(pending) = state.pending.take(&oauth_state).await else {
        warn!("callback state was never issued, already used, or expired");
        crate::metrics::record_login("invalid_state");
        return Ok((StatusCode::BAD_REQUEST, "Invalid state").into_response());
    };

    let token = state.oauth.exchange_code(&code).await.inspect_err(|_| {
        crate::metrics::record_login("token_exchange_failed");
    })?;
    info!(expires_in = token.expires_in_secs, "access token obtained");

    let cloud_id = state
        .confluence
        .cloud_id(token.token.expose())
        .await
        .inspect_err(|_| crate::metrics::record_login("cloud_id_failed"))?;

    let mut response = found(&pending.redirect_to);
    state.cookies.set_session(
        response.headers_mut(),
        token.token.expose(),
        &cloud_id,
        token.expires_in_secs,
    );

    crate::metrics::record_login("success");
    info!(redirect_to = %pending.redirect_to, "login complete, redirecting back");
    Ok(response)
}
