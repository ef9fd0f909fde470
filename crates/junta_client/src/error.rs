use thiserror::Error;

/// Failures surfaced by the client.
///
/// Callers mostly care about one distinction: `is_logged_out` separates
/// "the session is gone, send the user back to the login screen" from
/// "the backend or the network misbehaved, try again".
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client could not be built from the given configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request target could not be resolved against the API base.
    #[error("invalid request target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Transport-level failure, surfaced after transient retries are exhausted.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// Failure while reading or decoding a response body.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The login or refresh endpoint itself rejected the request.
    /// Never triggers a refresh attempt.
    #[error("credential endpoint rejected the request (status {status})")]
    CredentialRejected { status: u16, body: String },

    /// A protected request was rejected but no session was ever established.
    #[error("unauthorized response for {path} with no session to refresh")]
    NotAuthenticated { path: String },

    /// The shared refresh attempt failed; the session has been cleared.
    #[error("session refresh failed: {0}")]
    RefreshFailed(#[source] RefreshError),
}

impl ClientError {
    /// True when the user must authenticate again before retrying.
    pub fn is_logged_out(&self) -> bool {
        matches!(
            self,
            ClientError::RefreshFailed(_)
                | ClientError::CredentialRejected { .. }
                | ClientError::NotAuthenticated { .. }
        )
    }
}

/// Outcome of a failed refresh episode, broadcast to every queued request.
///
/// Cloneable so one episode's failure can be delivered to all waiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The refresh endpoint answered with a non-success status.
    #[error("refresh endpoint rejected the session (status {status})")]
    Rejected { status: u16, body: String },

    /// The refresh call failed at the transport level (includes timeouts).
    #[error("refresh request failed: {0}")]
    Transport(String),

    /// The store holds no refresh token to present.
    #[error("no refresh token in the session store")]
    MissingRefreshToken,

    /// The refresh task terminated without reporting an outcome.
    #[error("refresh aborted before completion")]
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_out_classification() {
        let refresh = ClientError::RefreshFailed(RefreshError::MissingRefreshToken);
        let rejected = ClientError::CredentialRejected {
            status: 401,
            body: String::new(),
        };
        let no_session = ClientError::NotAuthenticated {
            path: "/api/socios".to_string(),
        };
        assert!(refresh.is_logged_out());
        assert!(rejected.is_logged_out());
        assert!(no_session.is_logged_out());

        let config = ClientError::Config("bad base url".to_string());
        assert!(!config.is_logged_out());
    }

    #[test]
    fn refresh_error_display_carries_status() {
        let err = RefreshError::Rejected {
            status: 401,
            body: "expired".to_string(),
        };
        assert!(err.to_string().contains("401"));
    }
}
