use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AuthError;

pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Token type used for both the subject and the requested token in exchanges.
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantType {
    #[serde(rename = "urn:ietf:params:oauth:grant-type:token-exchange")]
    TokenExchange,
    #[serde(rename = "client_credentials")]
    ClientCredentials,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenExchange => GRANT_TYPE_TOKEN_EXCHANGE,
            Self::ClientCredentials => GRANT_TYPE_CLIENT_CREDENTIALS,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            GRANT_TYPE_TOKEN_EXCHANGE | "token-exchange" => Ok(Self::TokenExchange),
            GRANT_TYPE_CLIENT_CREDENTIALS | "client-credentials" => Ok(Self::ClientCredentials),
            other => Err(AuthError::InvalidConfig(format!(
                "unsupported grant type: {other}"
            ))),
        }
    }
}
