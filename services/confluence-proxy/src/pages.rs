//! Content request handlers
//!
//! Thin wrappers over `ConfluenceClient` that apply one mapping from
//! upstream failures to client responses:
//!
//! | upstream                      | client | session          |
//! |-------------------------------|--------|------------------|
//! | 401                           | 401    | cookies cleared  |
//! | 404, or 400 on space listing  | 404    | unchanged        |
//! | timeout / connection failure  | 503    | unchanged        |
//! | anything else                 | 500    | unchanged        |
//!
//! Upstream bodies never reach the client.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use confluence::ErrorClassification;
use tracing::{error, warn};

use crate::AppState;
use crate::session::{CookieSettings, Session};

pub const AUTH_ERROR_MESSAGE: &str = "Authentication error. Refresh and re-authenticate";
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching from Confluence";
pub const UNAVAILABLE_MESSAGE: &str = "Confluence is unavailable";

/// Which endpoint failed; selects the not-found wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Space,
    Page,
}

impl Resource {
    fn not_found_message(self) -> &'static str {
        match self {
            Resource::Space => "Requested space doesn't exist",
            Resource::Page => "Requested id doesn't exist",
        }
    }

    /// A 400 on the space lookup means the key is malformed, which the
    /// client sees as a missing space.
    fn bad_request_is_missing(self) -> bool {
        self == Resource::Space
    }
}

/// 401 that drops both session cookies so the next request re-authorizes.
fn reauthenticate(cookies: CookieSettings) -> Response {
    let mut headers = HeaderMap::new();
    cookies.clear_session(&mut headers);
    (StatusCode::UNAUTHORIZED, headers, AUTH_ERROR_MESSAGE).into_response()
}

/// Translate a failed Confluence call into the client response.
pub fn upstream_error_response(
    resource: Resource,
    err: &confluence::Error,
    cookies: CookieSettings,
) -> Response {
    let classification = err.classify();
    crate::metrics::record_upstream_error(classification.as_str());

    match classification {
        ErrorClassification::Unauthorized => {
            warn!(?resource, error = %err, "Confluence rejected access token, clearing session");
            reauthenticate(cookies)
        }
        ErrorClassification::NotFound => {
            warn!(?resource, error = %err, "requested resource not found");
            (StatusCode::NOT_FOUND, resource.not_found_message()).into_response()
        }
        ErrorClassification::BadRequest if resource.bad_request_is_missing() => {
            warn!(?resource, error = %err, "space lookup rejected as malformed");
            (StatusCode::NOT_FOUND, resource.not_found_message()).into_response()
        }
        ErrorClassification::Unavailable => {
            error!(?resource, error = %err, "Confluence unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE).into_response()
        }
        ErrorClassification::BadRequest | ErrorClassification::Other => {
            error!(?resource, error = %err, "error fetching from Confluence");
            (StatusCode::INTERNAL_SERVER_ERROR, FETCH_ERROR_MESSAGE).into_response()
        }
    }
}

/// A token without its cloud id can't address any tenant; treat it like a
/// rejected token.
fn incomplete_session(cookies: CookieSettings) -> Response {
    warn!("session has a token but no cloud id, clearing session");
    reauthenticate(cookies)
}

/// GET /pages/space/{space_key}: raw upstream `results` array.
pub async fn pages_in_space(
    State(state): State<AppState>,
    session: Session,
    Path(space_key): Path<String>,
) -> Response {
    let Some(cloud_id) = session.cloud_id.as_deref() else {
        return incomplete_session(state.cookies);
    };

    match state
        .confluence
        .pages_in_space(&space_key, cloud_id, session.token.expose())
        .await
    {
        Ok(pages) => Json(pages).into_response(),
        Err(e) => upstream_error_response(Resource::Space, &e, state.cookies),
    }
}

/// GET /pages/{page_id}: `{title, body}` with the rendered HTML body.
pub async fn page_by_id(
    State(state): State<AppState>,
    session: Session,
    Path(page_id): Path<String>,
) -> Response {
    let Some(cloud_id) = session.cloud_id.as_deref() else {
        return incomplete_session(state.cookies);
    };

    match state
        .confluence
        .page_by_id(&page_id, cloud_id, session.token.expose())
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => upstream_error_response(Resource::Page, &e, state.cookies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;

    const COOKIES: CookieSettings = CookieSettings { secure: false };

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_clears_cookies_for_both_resources() {
        for resource in [Resource::Space, Resource::Page] {
            let response = upstream_error_response(
                resource,
                &confluence::Error::Status { status: 401 },
                COOKIES,
            );
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let cleared: Vec<_> = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .map(|v| v.to_str().unwrap().to_string())
                .collect();
            assert!(cleared.iter().any(|c| c.starts_with("confluenceToken=;")));
            assert!(cleared.iter().any(|c| c.starts_with("confluenceCloudId=;")));
            assert!(body_text(response).await.contains("Authentication error"));
        }
    }

    #[tokio::test]
    async fn not_found_wording_depends_on_resource() {
        let space = upstream_error_response(
            Resource::Space,
            &confluence::Error::Status { status: 404 },
            COOKIES,
        );
        assert_eq!(space.status(), StatusCode::NOT_FOUND);
        assert!(space.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_text(space).await, "Requested space doesn't exist");

        let page = upstream_error_response(
            Resource::Page,
            &confluence::Error::Status { status: 404 },
            COOKIES,
        );
        assert_eq!(body_text(page).await, "Requested id doesn't exist");
    }

    #[tokio::test]
    async fn bad_request_is_not_found_only_for_spaces() {
        let space = upstream_error_response(
            Resource::Space,
            &confluence::Error::Status { status: 400 },
            COOKIES,
        );
        assert_eq!(space.status(), StatusCode::NOT_FOUND);

        let page = upstream_error_response(
            Resource::Page,
            &confluence::Error::Status { status: 400 },
            COOKIES,
        );
        assert_eq!(page.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_space_key_is_not_found() {
        let response = upstream_error_response(
            Resource::Space,
            &confluence::Error::SpaceNotFound("NOPE".into()),
            COOKIES,
        );
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_failures_are_500_and_unavailable_is_503() {
        let response = upstream_error_response(
            Resource::Page,
            &confluence::Error::Status { status: 500 },
            COOKIES,
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, FETCH_ERROR_MESSAGE);

        let response = upstream_error_response(
            Resource::Page,
            &confluence::Error::Status { status: 403 },
            COOKIES,
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = upstream_error_response(
            Resource::Space,
            &confluence::Error::Unavailable("timed out".into()),
            COOKIES,
        );
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, UNAVAILABLE_MESSAGE);
    }
}
