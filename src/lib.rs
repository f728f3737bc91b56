//! OAuth 2.0 / OIDC helpers for TES executors.
//!
//! [`AuthClient`] talks to three identity-provider endpoints derived from a
//! single base URL: token introspection (RFC 7662), token exchange (RFC 8693)
//! and dynamic client registration. Each call is one request with one typed
//! outcome; nothing is cached or retried.

mod client;
mod config;
mod error;
mod grant;
mod types;

pub use client::{AuthClient, Endpoints};
pub use config::{
    AuthClientConfig, DEFAULT_TIMEOUT, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_OIDC_URL,
    ENV_TIMEOUT_SECS,
};
pub use error::AuthError;
pub use grant::{
    GRANT_TYPE_CLIENT_CREDENTIALS, GRANT_TYPE_TOKEN_EXCHANGE, GrantType, TOKEN_TYPE_ACCESS_TOKEN,
};
pub use types::{IntrospectionResponse, RegisteredClient, TokenResponse};
