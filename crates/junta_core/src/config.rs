use serde::{Deserialize, Serialize};

/// Basic-auth credentials for an outbound HTTP(S) proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Client configuration for the cooperative's backend API.
///
/// Loaded from `config.toml` in the working directory, then overridden by
/// environment variables. The credential endpoint paths are configuration,
/// not hardcoded strings, so the pipeline can identify them by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the protected API, e.g. `https://api.junta.example/api`.
    pub api_base: String,
    /// Path of the login endpoint, relative to `api_base`.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Path of the token-refresh endpoint, relative to `api_base`.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Per-request timeout in seconds; also bounds the refresh call.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub https_proxy: String,
    #[serde(default)]
    pub http_proxy_auth: Option<ProxyAuth>,
    #[serde(default)]
    pub https_proxy_auth: Option<ProxyAuth>,
}

const CONFIG_FILE_PATH: &str = "config.toml";

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh-token".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn parse_secs_env(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: "http://localhost:8000/api".to_string(),
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            request_timeout_secs: default_timeout_secs(),
            http_proxy: String::new(),
            https_proxy: String::new(),
            http_proxy_auth: None,
            https_proxy_auth: None,
        }
    }
}

impl Config {
    /// Load configuration from `config.toml` (if present) and the environment.
    pub fn load() -> Self {
        let mut config = Config::default();

        //detect the config file exists
        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                match toml::from_str::<Config>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(e) => log::warn!("Ignoring malformed {CONFIG_FILE_PATH}: {e}"),
                }
            }
        }

        // Override with environment variables if they exist
        if let Ok(api_base) = std::env::var("JUNTA_API_BASE") {
            config.api_base = api_base;
        }
        if let Ok(http_proxy) = std::env::var("HTTP_PROXY") {
            config.http_proxy = http_proxy;
        }
        if let Ok(https_proxy) = std::env::var("HTTPS_PROXY") {
            config.https_proxy = https_proxy;
        }
        if let Ok(timeout) = std::env::var("JUNTA_REQUEST_TIMEOUT_SECS") {
            if let Some(secs) = parse_secs_env(&timeout) {
                config.request_timeout_secs = secs;
            }
        }
        config
    }
}
