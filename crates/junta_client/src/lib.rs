//! junta_client - Authenticated HTTP pipeline for the junta de agua backend
//!
//! Every screen of the cooperative's admin application talks to the backend
//! through [`JuntaClient::send`]: the pipeline attaches the bearer
//! credential, and when it expires mid-flight, performs a single shared
//! refresh and replays each affected request exactly once. Callers only see
//! their response or a typed [`ClientError`].

pub mod api;
pub mod auth;
pub mod client_trait;
pub mod error;
mod utils;

pub use api::client::JuntaClient;
pub use api::request::ApiRequest;
pub use auth::session::Session;
pub use auth::token_store::TokenStore;
pub use client_trait::JuntaClientTrait;
pub use error::{ClientError, RefreshError};
pub use junta_core::Config;
