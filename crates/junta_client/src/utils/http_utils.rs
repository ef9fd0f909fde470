use std::sync::Arc;
use std::time::Instant;

use log::{debug, error};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, Url};
use reqwest_middleware::ClientWithMiddleware;
use uuid::Uuid;

use crate::error::ClientError;

/// Executes an HTTP request against a resolved URL.
/// Retry logic for transient failures is handled by the reqwest-retry
/// middleware at the client level.
pub(crate) async fn execute_request(
    client: &Arc<ClientWithMiddleware>,
    method: Method,
    url: Url,
    auth_token: Option<&str>,
    json_body: Option<&serde_json::Value>,
    extra_headers: &reqwest::header::HeaderMap,
    request_id: Uuid,
) -> Result<Response, ClientError> {
    let mut request_builder = client.request(method.clone(), url.clone());

    if let Some(token) = auth_token {
        request_builder = request_builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if !extra_headers.is_empty() {
        request_builder = request_builder.headers(extra_headers.clone());
    }
    if let Some(body) = json_body {
        request_builder = request_builder.json(body);
    }

    debug!("[{request_id}] Sending {method} request to {url}");
    let start_time = Instant::now();

    match request_builder.send().await {
        Ok(resp) => {
            debug!(
                "[{request_id}] Got response from {url} after {:?} with status {}",
                start_time.elapsed(),
                resp.status()
            );
            Ok(resp)
        }
        Err(e) => {
            error!("[{request_id}] Failed HTTP request to {url}: {e}");
            if let reqwest_middleware::Error::Reqwest(inner) = &e {
                if inner.is_timeout() {
                    error!("[{request_id}] Request timed out");
                }
                if inner.is_connect() {
                    error!("[{request_id}] Connection error");
                }
            }
            Err(ClientError::Transport(e))
        }
    }
}
