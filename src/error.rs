use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid header value for {name}")]
    InvalidHeader { name: String },

    #[error("failed to validate the access token (status {status}): {body}")]
    IntrospectionFailed { status: u16, body: String },

    #[error("failed to exchange access token (status {status}): {body}")]
    TokenExchangeFailed { status: u16, body: String },

    #[error("failed to register a new client (status {status}): {body}")]
    ClientRegistrationFailed { status: u16, body: String },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String, body: String },
}

impl AuthError {
    /// Raw response body returned by the identity provider, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::IntrospectionFailed { body, .. }
            | Self::TokenExchangeFailed { body, .. }
            | Self::ClientRegistrationFailed { body, .. }
            | Self::MalformedResponse { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::IntrospectionFailed { status, .. }
            | Self::TokenExchangeFailed { status, .. }
            | Self::ClientRegistrationFailed { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AuthError;

    #[test]
    fn failure_message_carries_response_body() {
        let error = AuthError::IntrospectionFailed {
            status: 401,
            body: "invalid_token".to_string(),
        };
        assert!(error.to_string().contains("invalid_token"));
        assert_eq!(error.response_body(), Some("invalid_token"));
        assert_eq!(error.status(), Some(401));
    }

    #[test]
    fn config_errors_have_no_body() {
        let error = AuthError::InvalidConfig("client_id must not be empty".to_string());
        assert_eq!(error.response_body(), None);
        assert_eq!(error.status(), None);
    }
}
