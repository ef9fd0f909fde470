use async_trait::async_trait;
use reqwest::Response;

use crate::api::request::ApiRequest;
use crate::auth::session::Session;
use crate::error::ClientError;

/// Public seam of the client: screens and services depend on this trait so
/// tests can substitute the HTTP layer.
#[async_trait]
pub trait JuntaClientTrait: Send + Sync {
    /// Dispatch a request through the authenticated pipeline.
    async fn send(&self, request: ApiRequest) -> Result<Response, ClientError>;

    /// Establish a session against the login endpoint.
    async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError>;

    /// Tear down the local session.
    async fn logout(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        pub Client {}

        #[async_trait]
        impl JuntaClientTrait for Client {
            async fn send(&self, request: ApiRequest) -> Result<Response, ClientError>;
            async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError>;
            async fn logout(&self);
        }
    }

    #[tokio::test]
    async fn callers_can_program_the_seam() {
        let mut client = MockClient::new();
        client
            .expect_login()
            .withf(|username, password| username == "tesorero" && password == "s3cret")
            .returning(|_, _| Ok(Session::new("acc".to_string(), "ref".to_string())));
        client.expect_logout().times(1).return_const(());

        let session = client.login("tesorero", "s3cret").await.expect("login");
        assert_eq!(session.access_token, "acc");
        client.logout().await;
    }
}
