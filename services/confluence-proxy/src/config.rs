//! Configuration types and loading
//!
//! OAuth credentials and upstream endpoints come from the environment
//! (`CLIENT_ID`, `CLIENT_SECRET`, `REDIRECT_URI`, `TOKEN_URL`,
//! `CONFLUENCE_AUTH_URL`, `CONFLUENCE_API_URL`, `CLOUD_ID_URL`, `PORT`).
//! Server tuning lives in an optional TOML file under `[server]`.
//!
//! The client secret is wrapped in `Secret` and never stored in TOML.

use atlassian_auth::{
    ACCESSIBLE_RESOURCES_URL, AUTHORIZE_ENDPOINT, CONFLUENCE_API_URL, OAuthClientConfig,
    TOKEN_ENDPOINT,
};
use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "confluence-proxy.toml";

/// Root configuration
#[derive(Debug)]
pub struct Config {
    pub oauth: OAuthClientConfig,
    pub confluence: ConfluenceConfig,
    pub server: ServerConfig,
}

/// Upstream Confluence endpoints
#[derive(Debug, Clone)]
pub struct ConfluenceConfig {
    pub api_url: String,
    pub cloud_id_url: String,
}

/// HTTP server and flow tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Per-call timeout for every upstream request
    pub timeout_secs: u64,
    pub max_connections: usize,
    /// How long an issued OAuth state stays valid
    pub state_ttl_secs: u64,
    pub max_pending_states: usize,
    /// Only accept same-origin relative paths as `redirectTo`
    pub restrict_redirects: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            timeout_secs: 30,
            max_connections: 1000,
            state_ttl_secs: 600,
            max_pending_states: 10_000,
            restrict_redirects: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: ServerConfig,
}

impl Config {
    /// Load from the process environment plus an optional TOML file.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        Self::from_sources(path, |key| std::env::var(key).ok())
    }

    /// Build configuration from a TOML file (if any) and an environment
    /// lookup. Empty environment values count as unset.
    pub fn from_sources<F>(path: Option<&Path>, env: F) -> common::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str::<FileConfig>(&contents)?
            }
            None => FileConfig::default(),
        };
        let mut server = file.server;

        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| common::Error::MissingVar(key.into()));

        if let Some(port) = var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| common::Error::Config(format!("PORT must be a port number: {e}")))?;
            server.listen_addr.set_port(port);
        }

        let oauth = OAuthClientConfig {
            client_id: required("CLIENT_ID")?,
            client_secret: Secret::new(required("CLIENT_SECRET")?),
            redirect_uri: required("REDIRECT_URI")?,
            token_url: var("TOKEN_URL").unwrap_or_else(|| TOKEN_ENDPOINT.into()),
            authorization_endpoint: var("CONFLUENCE_AUTH_URL")
                .unwrap_or_else(|| AUTHORIZE_ENDPOINT.into()),
        };
        let confluence = ConfluenceConfig {
            api_url: var("CONFLUENCE_API_URL").unwrap_or_else(|| CONFLUENCE_API_URL.into()),
            cloud_id_url: var("CLOUD_ID_URL").unwrap_or_else(|| ACCESSIBLE_RESOURCES_URL.into()),
        };

        let config = Config {
            oauth,
            confluence,
            server,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        for (name, url) in [
            ("REDIRECT_URI", &self.oauth.redirect_uri),
            ("TOKEN_URL", &self.oauth.token_url),
            ("CONFLUENCE_AUTH_URL", &self.oauth.authorization_endpoint),
            ("CONFLUENCE_API_URL", &self.confluence.api_url),
            ("CLOUD_ID_URL", &self.confluence.cloud_id_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }

        if self.server.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.server.state_ttl_secs == 0 {
            return Err(common::Error::Config(
                "state_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.server.max_pending_states == 0 {
            return Err(common::Error::Config(
                "max_pending_states must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Session cookies get the `Secure` attribute when the callback itself
    /// is served over https.
    pub fn secure_cookies(&self) -> bool {
        self.oauth.redirect_uri.starts_with("https://")
    }

    /// Resolve the TOML file: CLI arg, then CONFIG_PATH, then
    /// `confluence-proxy.toml` if it exists in the working directory.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serializes tests that mutate CONFIG_PATH.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("CLIENT_ID", "client-abc".to_string()),
            ("CLIENT_SECRET", "shh".to_string()),
            ("REDIRECT_URI", "http://localhost:3000/auth/callback".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>, path: Option<&Path>) -> common::Result<Config> {
        Config::from_sources(path, |key| env.get(key).cloned())
    }

    #[test]
    fn minimal_env_uses_atlassian_defaults() {
        let config = load(&base_env(), None).unwrap();

        assert_eq!(config.oauth.client_id, "client-abc");
        assert_eq!(config.oauth.client_secret.expose(), "shh");
        assert_eq!(config.oauth.token_url, TOKEN_ENDPOINT);
        assert_eq!(config.oauth.authorization_endpoint, AUTHORIZE_ENDPOINT);
        assert_eq!(config.confluence.api_url, CONFLUENCE_API_URL);
        assert_eq!(config.confluence.cloud_id_url, ACCESSIBLE_RESOURCES_URL);
        assert_eq!(config.server.listen_addr.port(), 3000);
        assert_eq!(config.server.timeout_secs, 30);
        assert!(!config.server.restrict_redirects);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn endpoint_overrides_and_port() {
        let mut env = base_env();
        env.insert("TOKEN_URL", "https://auth.example.com/token".into());
        env.insert("CONFLUENCE_AUTH_URL", "https://auth.example.com/authorize".into());
        env.insert("CONFLUENCE_API_URL", "https://api.example.com/ex/confluence".into());
        env.insert("CLOUD_ID_URL", "https://api.example.com/resources".into());
        env.insert("REDIRECT_URI", "https://proxy.example.com/auth/callback".into());
        env.insert("PORT", "8080".into());

        let config = load(&env, None).unwrap();
        assert_eq!(config.oauth.token_url, "https://auth.example.com/token");
        assert_eq!(
            config.oauth.authorization_endpoint,
            "https://auth.example.com/authorize"
        );
        assert_eq!(config.confluence.api_url, "https://api.example.com/ex/confluence");
        assert_eq!(config.confluence.cloud_id_url, "https://api.example.com/resources");
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert!(config.secure_cookies());
    }

    #[test]
    fn missing_client_id_names_variable() {
        let mut env = base_env();
        env.remove("CLIENT_ID");
        let err = load(&env, None).unwrap_err();
        assert!(err.to_string().contains("CLIENT_ID"), "got: {err}");
    }

    #[test]
    fn empty_client_secret_is_missing() {
        let mut env = base_env();
        env.insert("CLIENT_SECRET", "   ".into());
        let err = load(&env, None).unwrap_err();
        assert!(matches!(err, common::Error::MissingVar(ref k) if k == "CLIENT_SECRET"));
    }

    #[test]
    fn invalid_port_rejected() {
        let mut env = base_env();
        env.insert("PORT", "http".into());
        assert!(load(&env, None).is_err());
    }

    #[test]
    fn url_without_scheme_rejected() {
        let mut env = base_env();
        env.insert("CONFLUENCE_API_URL", "api.atlassian.com/ex/confluence".into());
        let err = load(&env, None).unwrap_err().to_string();
        assert!(
            err.contains("CONFLUENCE_API_URL must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn toml_server_section_applies_and_port_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confluence-proxy.toml");
        std::fs::write(
            &path,
            r#"
[server]
listen_addr = "127.0.0.1:9000"
timeout_secs = 5
state_ttl_secs = 120
restrict_redirects = true
"#,
        )
        .unwrap();

        let config = load(&base_env(), Some(&path)).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.server.timeout_secs, 5);
        assert_eq!(config.server.state_ttl_secs, 120);
        assert_eq!(config.server.max_connections, 1000);
        assert!(config.server.restrict_redirects);

        let mut env = base_env();
        env.insert("PORT", "4000".into());
        let config = load(&env, Some(&path)).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:4000".parse().unwrap());
    }

    #[test]
    fn zero_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for field in [
            "timeout_secs",
            "max_connections",
            "state_ttl_secs",
            "max_pending_states",
        ] {
            let path = dir.path().join(format!("{field}.toml"));
            std::fs::write(&path, format!("[server]\n{field} = 0\n")).unwrap();
            let err = load(&base_env(), Some(&path)).unwrap_err().to_string();
            assert!(err.contains(field), "{field} = 0 must be rejected, got: {err}");
        }
    }

    #[test]
    fn missing_file_and_invalid_toml_error() {
        assert!(load(&base_env(), Some(Path::new("/nonexistent/config.toml"))).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid {{{{ toml").unwrap();
        assert!(matches!(
            load(&base_env(), Some(&path)),
            Err(common::Error::Toml(_))
        ));
    }

    #[test]
    fn resolve_path_precedence() {
        let _lock = ENV_MUTEX.lock().unwrap();

        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        assert_eq!(
            Config::resolve_path(None),
            Some(PathBuf::from("/env/path.toml"))
        );
        assert_eq!(
            Config::resolve_path(Some("/cli/wins.toml")),
            Some(PathBuf::from("/cli/wins.toml")),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}
