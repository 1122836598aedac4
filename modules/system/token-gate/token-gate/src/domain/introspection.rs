//! Turning an introspection response into an [`IdentityRecord`].

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use token_gate_sdk::{Credential, IdentityError, IdentityRecord};

const TOKEN_TYPE: &str = "token_type";
const GRANT_TYPE: &str = "grant_type";
const REALM: &str = "realm";
const EXPIRES_IN: &str = "expires_in";
const ACCESS_TOKEN: &str = "access_token";
const SCOPE: &str = "scope";
const ERROR_DESCRIPTION: &str = "error_description";

/// Build an [`IdentityRecord`] from a decoded introspection body.
///
/// `now` is the resolution time; the record expires `expires_in` seconds
/// (truncated) after it. Every name listed in `scope` that is also a
/// top-level key of the body is copied into the record's scopes.
///
/// # Errors
///
/// - `IntrospectionRejected` if the body carries an `error_description`
/// - `MalformedIntrospectionResponse` if a required key is missing or mistyped
/// - `TokenMismatch` if the body describes a different token or token type
pub fn parse_identity(
    credential: &Credential,
    data: &Map<String, Value>,
    now: OffsetDateTime,
) -> Result<IdentityRecord, IdentityError> {
    if let Some(description) = data.get(ERROR_DESCRIPTION) {
        let message = description
            .as_str()
            .map_or_else(|| description.to_string(), str::to_owned);
        return Err(IdentityError::IntrospectionRejected(message));
    }

    let token_type = required_str(data, TOKEN_TYPE)?;
    let grant_type = required_str(data, GRANT_TYPE)?;
    let realm = required_str(data, REALM)?;
    let access_token = required_str(data, ACCESS_TOKEN)?;
    let expires_in = data
        .get(EXPIRES_IN)
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(EXPIRES_IN, "number"))?;
    let scope_names = data
        .get(SCOPE)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(SCOPE, "array"))?;

    if token_type != credential.token_type() {
        return Err(IdentityError::TokenMismatch(format!(
            "token_type '{token_type}' does not match presented type '{}'",
            credential.token_type()
        )));
    }
    if access_token != credential.access_token().expose_secret() {
        return Err(IdentityError::TokenMismatch(
            "access_token does not match the presented credential".to_owned(),
        ));
    }

    let mut scopes = HashMap::with_capacity(scope_names.len());
    for name in scope_names {
        let name = name.as_str().ok_or_else(|| malformed(SCOPE, "array of strings"))?;
        if let Some(value) = data.get(name) {
            scopes.insert(name.to_owned(), value.clone());
        }
    }

    let lifetime = time::Duration::checked_seconds_f64(expires_in.trunc()).ok_or_else(|| {
        IdentityError::MalformedIntrospectionResponse(format!(
            "'{EXPIRES_IN}' is out of range: {expires_in}"
        ))
    })?;
    let expiry = now.checked_add(lifetime).ok_or_else(|| {
        IdentityError::MalformedIntrospectionResponse(format!(
            "'{EXPIRES_IN}' overflows the clock: {expires_in}"
        ))
    })?;

    Ok(IdentityRecord::builder()
        .token_type(token_type)
        .access_token(SecretString::from(access_token.to_owned()))
        .expiry(expiry)
        .scopes(scopes)
        .grant_type(grant_type)
        .realm(realm)
        .build())
}

fn required_str<'a>(data: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, IdentityError> {
    data.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(key, "string"))
}

fn malformed(key: &str, expected: &str) -> IdentityError {
    IdentityError::MalformedIntrospectionResponse(format!(
        "required key '{key}' is missing or not a {expected}"
    ))
}
