use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderValue},
};
use serde::de::DeserializeOwned;

use crate::types::{ActiveFlag, IssuedAccessToken, RegistrationRequest, RegistrationResponse};
use crate::{
    AuthClientConfig, AuthError, GrantType, IntrospectionResponse, RegisteredClient,
    TOKEN_TYPE_ACCESS_TOKEN, TokenResponse,
};

const INTROSPECT_SUFFIX: &str = "/introspect";
const TOKEN_SUFFIX: &str = "/token";
const REGISTER_SUFFIX: &str = "/register";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub introspect: String,
    pub token: String,
    pub register: String,
}

impl Endpoints {
    fn from_base(base: &str) -> Self {
        Self {
            introspect: format!("{base}{INTROSPECT_SUFFIX}"),
            token: format!("{base}{TOKEN_SUFFIX}"),
            register: format!("{base}{REGISTER_SUFFIX}"),
        }
    }
}

/// Client for the introspection, token and registration endpoints of an
/// OIDC provider. Immutable once built; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: AuthClientConfig,
    endpoints: Endpoints,
    basic_auth: HeaderValue,
    http: Client,
}

impl AuthClient {
    pub fn new(config: AuthClientConfig) -> Result<Self, AuthError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Self::with_http_client(config, http)
    }

    /// Uses a caller-supplied HTTP client. The configured timeout is ignored.
    pub fn with_http_client(config: AuthClientConfig, http: Client) -> Result<Self, AuthError> {
        config.validate()?;
        let endpoints = Endpoints::from_base(&config.oidc_url);
        let basic_auth = basic_auth_header(&config.client_id, &config.client_secret)?;
        Ok(Self {
            config,
            endpoints,
            basic_auth,
            http,
        })
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(AuthClientConfig::from_env()?)
    }

    pub fn config(&self) -> &AuthClientConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn is_token_valid(&self, token: &str) -> Result<bool, AuthError> {
        let body = self.send_introspection(token).await?;
        let flag: ActiveFlag = decode(body)?;
        Ok(flag.active)
    }

    pub async fn introspect(&self, token: &str) -> Result<IntrospectionResponse, AuthError> {
        decode(self.send_introspection(token).await?)
    }

    async fn send_introspection(&self, token: &str) -> Result<String, AuthError> {
        tracing::debug!(endpoint = %self.endpoints.introspect, "introspecting token");
        let response = self
            .http
            .post(&self.endpoints.introspect)
            .header(AUTHORIZATION, self.basic_auth.clone())
            .form(&[("token", token)])
            .send()
            .await?;

        let (status, body) = read_response(response).await?;
        if status != StatusCode::OK {
            return Err(AuthError::IntrospectionFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    pub async fn exchange_access_token<S>(
        &self,
        token: &str,
        grant_type: GrantType,
        scopes: &[S],
        audience: Option<&str>,
    ) -> Result<String, AuthError>
    where
        S: AsRef<str>,
    {
        let body = self.send_exchange(token, grant_type, scopes, audience).await?;
        let issued: IssuedAccessToken = decode(body)?;
        Ok(issued.access_token)
    }

    pub async fn exchange_token<S>(
        &self,
        token: &str,
        grant_type: GrantType,
        scopes: &[S],
        audience: Option<&str>,
    ) -> Result<TokenResponse, AuthError>
    where
        S: AsRef<str>,
    {
        let body = self.send_exchange(token, grant_type, scopes, audience).await?;
        decode(body)
    }

    async fn send_exchange<S>(
        &self,
        token: &str,
        grant_type: GrantType,
        scopes: &[S],
        audience: Option<&str>,
    ) -> Result<String, AuthError>
    where
        S: AsRef<str>,
    {
        let scope = join_scopes(scopes);
        let mut form = vec![
            ("subject_token", token),
            ("subject_token_type", TOKEN_TYPE_ACCESS_TOKEN),
            ("requested_token_type", TOKEN_TYPE_ACCESS_TOKEN),
            ("scope", scope.as_str()),
            ("grant_type", grant_type.as_str()),
        ];
        if let Some(audience) = audience.filter(|audience| !audience.is_empty()) {
            form.push(("audience", audience));
        }

        tracing::debug!(
            endpoint = %self.endpoints.token,
            %grant_type,
            %scope,
            audience,
            "exchanging access token"
        );
        let response = self
            .http
            .post(&self.endpoints.token)
            .header(AUTHORIZATION, self.basic_auth.clone())
            .form(&form)
            .send()
            .await?;

        let (status, body) = read_response(response).await?;
        if status != StatusCode::OK {
            return Err(AuthError::TokenExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    pub async fn register_client<R, S>(
        &self,
        access_token: &str,
        client_name: &str,
        resource_ids: &[R],
        scopes: &[S],
    ) -> Result<RegisteredClient, AuthError>
    where
        R: AsRef<str>,
        S: AsRef<str>,
    {
        let bearer = bearer_header(access_token)?;
        let payload = RegistrationRequest::new(client_name, resource_ids, scopes);

        tracing::debug!(endpoint = %self.endpoints.register, client_name, "registering client");
        let response = self
            .http
            .post(&self.endpoints.register)
            .header(AUTHORIZATION, bearer)
            .json(&payload)
            .send()
            .await?;

        let (status, body) = read_response(response).await?;
        if status != StatusCode::CREATED {
            return Err(AuthError::ClientRegistrationFailed {
                status: status.as_u16(),
                body,
            });
        }

        let registered: RegistrationResponse = decode(body)?;
        Ok(registered.into())
    }
}

async fn read_response(response: Response) -> Result<(StatusCode, String), AuthError> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await?;
    tracing::debug!(%url, status = status.as_u16(), "identity provider responded");
    Ok((status, body))
}

fn decode<T: DeserializeOwned>(body: String) -> Result<T, AuthError> {
    serde_json::from_str(&body).map_err(|err| AuthError::MalformedResponse {
        message: err.to_string(),
        body,
    })
}

fn join_scopes<S: AsRef<str>>(scopes: &[S]) -> String {
    scopes
        .iter()
        .map(|scope| scope.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

fn basic_auth_header(client_id: &str, client_secret: &str) -> Result<HeaderValue, AuthError> {
    let encoded = STANDARD.encode(format!("{client_id}:{client_secret}"));
    let mut value =
        HeaderValue::from_str(&format!("Basic {encoded}")).map_err(|_| AuthError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

fn bearer_header(access_token: &str) -> Result<HeaderValue, AuthError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|_| {
        AuthError::InvalidHeader {
            name: AUTHORIZATION.to_string(),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> AuthClient {
        AuthClient::new(AuthClientConfig::new("client-id", "client-secret", base)).unwrap()
    }

    #[test]
    fn endpoints_are_base_plus_suffix() {
        let client = client("https://idp.example.com/oidc");
        assert_eq!(
            client.endpoints(),
            &Endpoints {
                introspect: "https://idp.example.com/oidc/introspect".to_string(),
                token: "https://idp.example.com/oidc/token".to_string(),
                register: "https://idp.example.com/oidc/register".to_string(),
            }
        );
    }

    #[test]
    fn basic_credential_encodes_id_and_secret() {
        let client = client("https://idp.example.com");
        assert_eq!(
            client.basic_auth.to_str().unwrap(),
            "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ="
        );
        assert!(client.basic_auth.is_sensitive());
    }

    #[test]
    fn rejects_empty_configuration() {
        let result = AuthClient::new(AuthClientConfig::new("client-id", "", "https://idp"));
        assert!(matches!(result, Err(AuthError::InvalidConfig(_))));
    }

    #[test]
    fn scopes_join_with_single_space_in_order() {
        assert_eq!(join_scopes(&["write", "read"]), "write read");
        assert_eq!(join_scopes::<&str>(&[]), "");
    }

    #[test]
    fn bearer_header_rejects_control_characters() {
        assert!(bearer_header("abc").is_ok());
        assert!(matches!(
            bearer_header("abc\ndef"),
            Err(AuthError::InvalidHeader { .. })
        ));
    }
}
