use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::HeaderMap;
use reqwest::{Client, Proxy, Response, StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use uuid::Uuid;

use junta_core::config::{Config, ProxyAuth};

use crate::api::request::ApiRequest;
use crate::auth::refresh::RefreshCoordinator;
use crate::auth::session::{LoginRequest, Session, TokenPairResponse};
use crate::auth::token_store::TokenStore;
use crate::client_trait::JuntaClientTrait;
use crate::error::ClientError;
use crate::utils::http_utils::execute_request;

fn apply_proxy_auth(proxy: Proxy, auth: Option<&ProxyAuth>) -> Proxy {
    let Some(auth) = auth else {
        return proxy;
    };
    if auth.username.is_empty() {
        return proxy;
    }
    proxy.basic_auth(&auth.username, &auth.password)
}

/// Client for the cooperative's backend API.
///
/// Every protected call goes through [`JuntaClientTrait::send`], which
/// attaches the bearer credential and recovers from credential expiry
/// through the shared refresh protocol. Callers never see the refresh
/// machinery; they see their response, or a typed failure.
#[derive(Debug)]
pub struct JuntaClient {
    http: Arc<ClientWithMiddleware>,
    tokens: TokenStore,
    refresh: Arc<RefreshCoordinator>,
    api_base: Url,
    login_url: Url,
    refresh_url: Url,
}

impl JuntaClient {
    /// Build a client from configuration, resuming any session cached
    /// under `data_dir`.
    pub fn new(config: Config, data_dir: PathBuf) -> Result<Self, ClientError> {
        let api_base = Self::parse_api_base(&config.api_base)?;
        let login_url = Self::join_endpoint(&api_base, &config.login_path)?;
        let refresh_url = Self::join_endpoint(&api_base, &config.refresh_path)?;

        let http_client = Self::build_http_client(&config)?;
        let http = Arc::new(Self::build_retry_client(http_client));

        let tokens = TokenStore::new(data_dir);
        let refresh =
            RefreshCoordinator::new(tokens.clone(), Arc::clone(&http), refresh_url.clone());

        Ok(JuntaClient {
            http,
            tokens,
            refresh,
            api_base,
            login_url,
            refresh_url,
        })
    }

    /// True if a session (possibly expired) is available.
    pub fn has_session(&self) -> bool {
        self.tokens.has_session()
    }

    /// The current session, if any. Route guards use this.
    pub fn session(&self) -> Option<Session> {
        self.tokens.current()
    }

    fn parse_api_base(api_base: &str) -> Result<Url, ClientError> {
        // Normalized to a trailing slash so Url::join keeps the base path.
        let mut base = api_base.trim_end_matches('/').to_string();
        base.push('/');
        Url::parse(&base).map_err(|e| ClientError::Config(format!("invalid api_base: {e}")))
    }

    fn join_endpoint(api_base: &Url, path: &str) -> Result<Url, ClientError> {
        api_base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid endpoint path {path:?}: {e}")))
    }

    fn build_http_client(config: &Config) -> Result<Client, ClientError> {
        let mut builder = Client::builder()
            .default_headers(Self::default_headers())
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if !config.http_proxy.is_empty() {
            let mut proxy = Proxy::http(&config.http_proxy)
                .map_err(|e| ClientError::Config(format!("invalid http_proxy: {e}")))?;
            proxy = apply_proxy_auth(proxy, config.http_proxy_auth.as_ref());
            builder = builder.proxy(proxy);
        }
        if !config.https_proxy.is_empty() {
            let mut proxy = Proxy::https(&config.https_proxy)
                .map_err(|e| ClientError::Config(format!("invalid https_proxy: {e}")))?;
            proxy = apply_proxy_auth(proxy, config.https_proxy_auth.as_ref());
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))
    }

    fn build_retry_client(client: Client) -> ClientWithMiddleware {
        // Transient retries (5xx, timeouts, connection errors) live here;
        // the refresh protocol above only concerns itself with 401.
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("accept", "application/json".parse().expect("header"));
        headers.insert("content-type", "application/json".parse().expect("header"));
        headers.insert("user-agent", "junta-admin/0.2.0".parse().expect("header"));
        headers
    }

    /// Resolve a request target to a URL, deciding whether it belongs to
    /// the protected API (same origin as the configured base).
    fn resolve_target(&self, target: &str) -> Result<(Url, bool), ClientError> {
        let url = if target.starts_with("http://") || target.starts_with("https://") {
            Url::parse(target).map_err(|e| ClientError::InvalidTarget {
                target: target.to_string(),
                reason: e.to_string(),
            })?
        } else {
            self.api_base
                .join(target.trim_start_matches('/'))
                .map_err(|e| ClientError::InvalidTarget {
                    target: target.to_string(),
                    reason: e.to_string(),
                })?
        };
        let protected = url.origin() == self.api_base.origin();
        Ok((url, protected))
    }

    /// Credential endpoints are identified by exact path match against the
    /// configured login/refresh paths, never by substring.
    fn is_credential_endpoint(&self, url: &Url) -> bool {
        url.path() == self.login_url.path() || url.path() == self.refresh_url.path()
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &Url,
        token: Option<&str>,
        request_id: Uuid,
    ) -> Result<Response, ClientError> {
        execute_request(
            &self.http,
            request.method().clone(),
            url.clone(),
            token,
            request.body(),
            request.headers(),
            request_id,
        )
        .await
    }
}

#[async_trait]
impl JuntaClientTrait for JuntaClient {
    async fn send(&self, request: ApiRequest) -> Result<Response, ClientError> {
        let request_id = Uuid::new_v4();
        let (url, protected) = self.resolve_target(request.target())?;

        if !protected {
            debug!("[{request_id}] {url} is outside the API origin, sending without credentials");
            return self.dispatch(&request, &url, None, request_id).await;
        }

        let token = self.tokens.access_token();
        let response = self
            .dispatch(&request, &url, token.as_deref(), request_id)
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if self.is_credential_endpoint(&url) {
            // A rejected login/refresh is terminal, never a refresh trigger.
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("[{request_id}] Credential endpoint rejected the request");
            return Err(ClientError::CredentialRejected { status, body });
        }

        let Some(stale) = token else {
            warn!("[{request_id}] Unauthorized without a session, not attempting refresh");
            return Err(ClientError::NotAuthenticated {
                path: url.path().to_string(),
            });
        };

        info!("[{request_id}] Credential expired, entering shared refresh");
        let fresh = Arc::clone(&self.refresh)
            .recover(&stale)
            .await
            .map_err(ClientError::RefreshFailed)?;

        // Exactly one replay per dispatch; a second 401 is the caller's.
        self.dispatch(&request, &url, Some(&fresh), request_id).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        info!("Logging in {username} at {}", self.login_url);
        let response = self
            .http
            .post(self.login_url.clone())
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Login rejected with status {status}");
            return Err(ClientError::CredentialRejected {
                status: status.as_u16(),
                body,
            });
        }

        let session = response.json::<TokenPairResponse>().await?.into_session();
        self.tokens.store(session.clone());
        info!("Login succeeded, session stored");
        Ok(session)
    }

    async fn logout(&self) {
        self.tokens.clear();
        info!("Logged out, session cleared");
    }
}
