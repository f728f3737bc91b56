use std::fmt;
use std::time::Duration;

use url::Url;

use crate::AuthError;

pub const ENV_CLIENT_ID: &str = "TES_OIDC_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "TES_OIDC_CLIENT_SECRET";
pub const ENV_OIDC_URL: &str = "TES_OIDC_URL";
pub const ENV_TIMEOUT_SECS: &str = "TES_OIDC_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Identity-provider base URL. Endpoint suffixes are appended verbatim.
    pub oidc_url: String,
    pub timeout: Option<Duration>,
}

impl AuthClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        oidc_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            oidc_url: oidc_url.into(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Reads `TES_OIDC_CLIENT_ID`, `TES_OIDC_CLIENT_SECRET`, `TES_OIDC_URL`
    /// and the optional `TES_OIDC_TIMEOUT_SECS` (`0` disables the timeout).
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AuthError::InvalidConfig(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required(ENV_CLIENT_ID)?,
            required(ENV_CLIENT_SECRET)?,
            required(ENV_OIDC_URL)?,
        );

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AuthError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} must be an integer, got {raw:?}"))
            })?;
            config = if secs == 0 {
                config.without_timeout()
            } else {
                config.with_timeout(Duration::from_secs(secs))
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("oidc_url", &self.oidc_url),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::InvalidConfig(format!("{name} must not be empty")));
            }
        }

        let url = Url::parse(&self.oidc_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AuthError::InvalidConfig(format!(
                "oidc_url must use http or https, got {}",
                url.scheme()
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for AuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("oidc_url", &self.oidc_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
