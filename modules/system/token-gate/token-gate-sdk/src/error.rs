//! Error types for the token gate module.

use thiserror::Error;

/// Errors produced while extracting a credential from the inbound
/// `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The header is absent or empty.
    #[error("no authorization header")]
    Missing,

    /// The header is not exactly a `<type> <value>` pair.
    #[error("incomplete authorization header")]
    Malformed,
}

/// Errors produced while resolving a credential into an [`IdentityRecord`].
///
/// Messages carried by these variants have already been passed through the
/// masking step and never contain the raw credential.
///
/// [`IdentityRecord`]: crate::models::IdentityRecord
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Transport or network failure talking to the introspection endpoint.
    #[error("introspection endpoint unavailable: {0}")]
    ResolutionUnavailable(String),

    /// Body is not JSON, or a required key is missing or has the wrong type.
    #[error("malformed introspection response: {0}")]
    MalformedIntrospectionResponse(String),

    /// The endpoint answered for a different token or token type.
    #[error("token mismatch: {0}")]
    TokenMismatch(String),

    /// The endpoint answered with an `error_description`.
    #[error("introspection rejected the token: {0}")]
    IntrospectionRejected(String),

    /// The resolved token is empty or already expired.
    #[error("token is empty or expired")]
    Expired,
}

/// Errors produced by the team directory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamDirectoryError {
    /// The identity carries no string `uid` claim to look up.
    #[error("identity has no uid claim")]
    MissingUid,

    /// Transport or network failure talking to the team directory.
    #[error("team directory unavailable: {0}")]
    Unavailable(String),

    /// The directory answered with something other than a JSON array of teams.
    #[error("malformed team directory response: {0}")]
    MalformedResponse(String),
}
