//! Confluence and accessible-resources calls
//!
//! Every call is a bearer-authenticated GET with a per-request timeout. Any
//! non-2xx response becomes `Error::Status`; the response body is logged at
//! debug level and never returned to callers.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{AccessibleResource, Page, PageContent, Results, Space};

/// Content Service and Cloud Identity Resolver.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    http: reqwest::Client,
    api_url: Url,
    cloud_id_url: Url,
    timeout: Duration,
}

impl ConfluenceClient {
    /// `api_url` is the gateway base (`.../ex/confluence`); the cloud id and
    /// `/wiki/api/v2/...` are appended per call.
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        cloud_id_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let api_url = Url::parse(api_url).map_err(|e| Error::InvalidUrl(format!("{api_url}: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("{api_url} cannot be a base URL")));
        }
        let cloud_id_url =
            Url::parse(cloud_id_url).map_err(|e| Error::InvalidUrl(format!("{cloud_id_url}: {e}")))?;

        Ok(Self {
            http,
            api_url,
            cloud_id_url,
            timeout,
        })
    }

    /// Resolve the cloud id of the first site the token can access.
    #[instrument(skip_all)]
    pub async fn cloud_id(&self, token: &str) -> Result<String> {
        let resources: Vec<AccessibleResource> = self.get(self.cloud_id_url.clone(), token).await?;
        let first = resources.into_iter().next().ok_or_else(|| {
            warn!("access token has no accessible resources");
            Error::NoAccessibleResources
        })?;
        debug!(cloud_id = %first.id, site = first.name.as_deref().unwrap_or(""), "resolved cloud id");
        Ok(first.id)
    }

    /// Look up a space id by key. `Error::SpaceNotFound` when the key
    /// matches nothing.
    #[instrument(skip(self, token))]
    pub async fn space_id_by_key(&self, space_key: &str, cloud_id: &str, token: &str) -> Result<String> {
        let mut url = self.v2_url(cloud_id, &["spaces"]);
        url.query_pairs_mut().append_pair("keys", space_key);

        let spaces: Results<Space> = self.get(url, token).await?;
        spaces
            .results
            .first()
            .and_then(Space::id_segment)
            .ok_or_else(|| Error::SpaceNotFound(space_key.to_string()))
    }

    /// List the pages of a space, returning the upstream `results` array
    /// untouched. The pages call is only made once the space id resolves.
    #[instrument(skip(self, token))]
    pub async fn pages_in_space(
        &self,
        space_key: &str,
        cloud_id: &str,
        token: &str,
    ) -> Result<Vec<serde_json::Value>> {
        let space_id = self.space_id_by_key(space_key, cloud_id, token).await?;
        let url = self.v2_url(cloud_id, &["spaces", path_segment(&space_id)?, "pages"]);
        let pages: Results<serde_json::Value> = self.get(url, token).await?;
        debug!(space_id = %space_id, count = pages.results.len(), "listed pages");
        Ok(pages.results)
    }

    /// Fetch a page and project it to title plus rendered HTML.
    #[instrument(skip(self, token))]
    pub async fn page_by_id(&self, page_id: &str, cloud_id: &str, token: &str) -> Result<PageContent> {
        let page_id = path_segment(page_id)?;
        let mut url = self.v2_url(cloud_id, &["pages", page_id]);
        url.query_pairs_mut().append_pair("body-format", "view");

        let page: Page = self.get(url, token).await?;
        Ok(page.into())
    }

    /// `{api_url}/{cloud_id}/wiki/api/v2/{segments...}` with each segment
    /// percent-encoded. `url` drops `.` and `..` segments, so callers pass
    /// caller-supplied ids through `path_segment` first.
    fn v2_url(&self, cloud_id: &str, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push(cloud_id)
                .extend(["wiki", "api", "v2"])
                .extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, token: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %body, "Confluence error body");
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Reject ids the URL parser would resolve away instead of encoding.
fn path_segment(id: &str) -> Result<&str> {
    match id {
        "" | "." | ".." => Err(Error::InvalidId(id.to_string())),
        _ => Ok(id),
    }
}
