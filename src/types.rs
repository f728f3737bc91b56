use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::GRANT_TYPE_TOKEN_EXCHANGE;

const TOKEN_ENDPOINT_AUTH_METHOD: &str = "client_secret_basic";

/// RFC 7662 introspection response. Only `active` is required; optional
/// members with an unexpected type decode as `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub exp: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub iat: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub sub: Option<String>,
    pub aud: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub iss: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, deserialize_with = "lenient")]
    pub issued_token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The only member `is_token_valid` reads from an introspection body.
#[derive(Debug, Deserialize)]
pub(crate) struct ActiveFlag {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssuedAccessToken {
    pub access_token: String,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Credentials of a freshly registered client. The caller owns persisting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegistrationRequest<'a> {
    pub client_name: &'a str,
    pub grant_types: [&'static str; 1],
    pub token_endpoint_auth_method: &'static str,
    pub scope: Vec<&'a str>,
    #[serde(rename = "resourceIds")]
    pub resource_ids: Vec<&'a str>,
}

impl<'a> RegistrationRequest<'a> {
    pub(crate) fn new<R, S>(client_name: &'a str, resource_ids: &'a [R], scope: &'a [S]) -> Self
    where
        R: AsRef<str>,
        S: AsRef<str>,
    {
        Self {
            client_name,
            grant_types: [GRANT_TYPE_TOKEN_EXCHANGE],
            token_endpoint_auth_method: TOKEN_ENDPOINT_AUTH_METHOD,
            scope: scope.iter().map(|value| value.as_ref()).collect(),
            resource_ids: resource_ids.iter().map(|value| value.as_ref()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistrationResponse {
    pub client_id: String,
    pub client_secret: String,
}

impl From<RegistrationResponse> for RegisteredClient {
    fn from(response: RegistrationResponse) -> Self {
        Self {
            client_id: response.client_id,
            client_secret: response.client_secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn registration_request_uses_provider_field_names() {
        let resources = ["res-1"];
        let scopes = vec!["openid".to_string(), "tes".to_string()];
        let body = serde_json::to_value(RegistrationRequest::new("executor", &resources, &scopes))
            .unwrap();

        assert_eq!(
            body,
            json!({
                "client_name": "executor",
                "grant_types": [GRANT_TYPE_TOKEN_EXCHANGE],
                "token_endpoint_auth_method": "client_secret_basic",
                "scope": ["openid", "tes"],
                "resourceIds": ["res-1"],
            })
        );
    }

    #[test]
    fn registration_response_maps_camel_case() {
        let response: RegistrationResponse =
            serde_json::from_str(r#"{"clientId":"cid1","clientSecret":"secret1","extra":1}"#)
                .unwrap();
        let client = RegisteredClient::from(response);
        assert_eq!(client.client_id, "cid1");
        assert_eq!(client.client_secret, "secret1");

        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(value, json!({"client_id": "cid1", "client_secret": "secret1"}));
    }

    #[test]
    fn introspection_requires_active() {
        assert!(serde_json::from_str::<IntrospectionResponse>(r#"{"scope":"openid"}"#).is_err());
        assert!(serde_json::from_str::<IntrospectionResponse>(r#"{"active":"yes"}"#).is_err());

        let response: IntrospectionResponse =
            serde_json::from_str(r#"{"active":true,"sub":"alice","custom":"x"}"#).unwrap();
        assert!(response.active);
        assert_eq!(response.sub.as_deref(), Some("alice"));
        assert_eq!(response.extra.get("custom"), Some(&json!("x")));
    }

    #[test]
    fn token_response_requires_access_token() {
        assert!(serde_json::from_str::<TokenResponse>(r#"{"token_type":"Bearer"}"#).is_err());
        assert!(serde_json::from_str::<IssuedAccessToken>(r#"{"token_type":"Bearer"}"#).is_err());
    }

    #[test]
    fn mistyped_optional_members_decode_as_none() {
        let response: IntrospectionResponse = serde_json::from_str(
            r#"{"active":true,"exp":1700000000.5,"scope":["openid","tes"],"sub":null,"iat":1}"#,
        )
        .unwrap();
        assert!(response.active);
        assert_eq!(response.exp, None);
        assert_eq!(response.scope, None);
        assert_eq!(response.sub, None);
        assert_eq!(response.iat, Some(1));

        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"xyz","expires_in":"3600","scope":"tes"}"#)
                .unwrap();
        assert_eq!(token.access_token, "xyz");
        assert_eq!(token.expires_in, None);
        assert_eq!(token.scope.as_deref(), Some("tes"));
    }
}
