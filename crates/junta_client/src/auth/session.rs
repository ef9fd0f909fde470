use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The bearer credentials for one authenticated session.
///
/// The tokens are opaque to the client; validity is enforced server-side
/// and expiry shows up as a 401 on a protected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// When this pair was obtained (login or refresh).
    pub obtained_at: DateTime<Utc>,
}

impl Session {
    pub fn new(access_token: String, refresh_token: String) -> Self {
        Session {
            access_token,
            refresh_token,
            obtained_at: Utc::now(),
        }
    }
}

// Wire models for the credential endpoints

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Success body of both credential endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPairResponse {
    pub(crate) fn into_session(self) -> Session {
        Session::new(self.access_token, self.refresh_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_becomes_session() {
        let pair: TokenPairResponse = serde_json::from_str(
            r#"{"access_token": "acc-1", "refresh_token": "ref-1"}"#,
        )
        .expect("parse pair");

        let session = pair.into_session();
        assert_eq!(session.access_token, "acc-1");
        assert_eq!(session.refresh_token, "ref-1");
    }

    #[test]
    fn session_serde_round_trip() {
        let session = Session::new("acc-2".to_string(), "ref-2".to_string());
        let json = serde_json::to_string(&session).expect("serialize");
        let loaded: Session = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(loaded, session);
    }
}
