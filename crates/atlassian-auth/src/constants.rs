//! Atlassian OAuth 2.0 (3LO) constants
//!
//! Default endpoints are the public Atlassian cloud ones; every endpoint can
//! be overridden through configuration.

/// Audience required by Atlassian for Confluence/Jira API tokens
pub const AUDIENCE: &str = "api.atlassian.com";

/// Fixed read-only scope set requested on every authorization
pub const SCOPES: &str = "read:page:confluence read:space:confluence";

/// Authorization endpoint the browser is redirected to
pub const AUTHORIZE_ENDPOINT: &str = "https://auth.atlassian.com/authorize";

/// Token endpoint for the authorization code exchange
pub const TOKEN_ENDPOINT: &str = "https://auth.atlassian.com/oauth/token";

/// Lists the sites (cloud ids) an access token can reach
pub const ACCESSIBLE_RESOURCES_URL: &str =
    "https://api.atlassian.com/oauth/token/accessible-resources";

/// Base URL of the Confluence Cloud REST gateway, followed by `/{cloudId}/wiki/...`
pub const CONFLUENCE_API_URL: &str = "https://api.atlassian.com/ex/confluence";
