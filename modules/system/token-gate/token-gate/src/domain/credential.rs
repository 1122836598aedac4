//! Credential extraction from the inbound `Authorization` header.

use token_gate_sdk::{Credential, CredentialError};

/// Parse a raw `Authorization` header value into a [`Credential`].
///
/// The value must be exactly `<type> <token>` separated by a single space.
///
/// # Errors
///
/// - `Missing` if the header is absent or empty
/// - `Malformed` for anything other than two space-separated, non-empty fields
pub fn extract_credential(header: Option<&str>) -> Result<Credential, CredentialError> {
    let raw = match header {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(CredentialError::Missing),
    };

    let mut fields = raw.split(' ');
    let (Some(token_type), Some(token), None) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(CredentialError::Malformed);
    };

    if token_type.is_empty() || token.is_empty() {
        return Err(CredentialError::Malformed);
    }

    Ok(Credential::new(token_type, token.to_owned()))
}
