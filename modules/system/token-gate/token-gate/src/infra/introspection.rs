//! Introspection ("tokeninfo") client.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use time::OffsetDateTime;
use token_gate_sdk::{Credential, IdentityError, IdentityRecord, IdentityResolverClient};
use url::Url;

use super::http::HttpTransport;
use crate::config::{ConfigError, IntrospectionConfig, parse_url};
use crate::domain::introspection::parse_identity;
use crate::domain::masking::Masker;

const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Resolves credentials against a remote introspection endpoint.
///
/// The credential is sent either as `Authorization: Bearer <token>` or as
/// the `access_token` query parameter, depending on configuration.
#[derive(Clone)]
pub struct HttpIdentityResolver {
    transport: HttpTransport,
    token_url: Url,
    token_in_header: bool,
}

impl HttpIdentityResolver {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `token_url` does not parse.
    pub fn new(
        transport: HttpTransport,
        config: &IntrospectionConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            token_url: parse_url("introspection.token_url", &config.token_url)?,
            token_in_header: config.token_in_header,
        })
    }

    fn request_url(&self, credential: &Credential) -> Url {
        let mut url = self.token_url.clone();
        if !self.token_in_header {
            url.query_pairs_mut()
                .append_pair(ACCESS_TOKEN_PARAM, credential.access_token().expose_secret());
        }
        url
    }
}

#[async_trait]
impl IdentityResolverClient for HttpIdentityResolver {
    async fn resolve(&self, credential: &Credential) -> Result<IdentityRecord, IdentityError> {
        let masker = Masker::new().with_secret(credential.access_token().expose_secret());
        let url = self.request_url(credential);
        let bearer = self.token_in_header.then(|| credential.access_token());

        tracing::debug!(url = %masker.mask(url.as_str()), "resolving credential");
        let response = self.transport.get(&url, bearer).await.map_err(|e| {
            let reason = masker.mask(&e.to_string());
            tracing::warn!(
                url = %masker.mask(url.as_str()),
                error = %reason,
                "introspection request failed"
            );
            IdentityError::ResolutionUnavailable(reason)
        })?;

        let status = response.status;
        let data = match serde_json::from_slice::<Value>(&response.body) {
            Ok(Value::Object(data)) => data,
            Ok(_) | Err(_) if status.is_server_error() => {
                return Err(IdentityError::ResolutionUnavailable(format!(
                    "introspection endpoint returned {status}"
                )));
            }
            Ok(other) => {
                return Err(IdentityError::MalformedIntrospectionResponse(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )));
            }
            Err(e) => {
                return Err(IdentityError::MalformedIntrospectionResponse(
                    masker.mask(&e.to_string()),
                ));
            }
        };

        if status.is_server_error() && !data.contains_key("error_description") {
            return Err(IdentityError::ResolutionUnavailable(format!(
                "introspection endpoint returned {status}"
            )));
        }

        parse_identity(credential, &data, OffsetDateTime::now_utc())
            .map_err(|e| mask_error(&masker, e))
    }
}

fn mask_error(masker: &Masker, e: IdentityError) -> IdentityError {
    match e {
        IdentityError::IntrospectionRejected(m) => {
            IdentityError::IntrospectionRejected(masker.mask(&m))
        }
        IdentityError::MalformedIntrospectionResponse(m) => {
            IdentityError::MalformedIntrospectionResponse(masker.mask(&m))
        }
        IdentityError::TokenMismatch(m) => IdentityError::TokenMismatch(masker.mask(&m)),
        IdentityError::ResolutionUnavailable(m) => {
            IdentityError::ResolutionUnavailable(masker.mask(&m))
        }
        IdentityError::Expired => IdentityError::Expired,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
