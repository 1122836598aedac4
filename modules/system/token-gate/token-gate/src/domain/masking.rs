//! Credential masking for everything that ends up in logs.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

/// Placeholder written in place of a credential.
pub const MASK: &str = "<MASK>";

#[allow(clippy::expect_used)]
static ACCESS_TOKEN_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]access_token=[^&]+").expect("valid access_token pattern"));

/// Replace every `?access_token=...` / `&access_token=...` query parameter
/// with [`MASK`].
#[must_use]
pub fn mask_access_token(input: &str) -> Cow<'_, str> {
    ACCESS_TOKEN_PARAM.replace_all(input, MASK)
}

/// Masks the query parameter form and any literal occurrence of known
/// credential values.
#[derive(Clone, Default)]
pub struct Masker {
    secrets: Vec<SecretString>,
}

impl Masker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also redact literal occurrences of `secret`. Empty values are ignored.
    #[must_use]
    pub fn with_secret(mut self, secret: &str) -> Self {
        if !secret.is_empty() {
            self.secrets.push(SecretString::from(secret.to_owned()));
        }
        self
    }

    /// Masker for whatever the client sent in its `Authorization` header.
    ///
    /// Every field after the type label is treated as secret; a single-field
    /// header is treated as a bare token.
    #[must_use]
    pub fn for_authorization(header: Option<&str>) -> Self {
        let Some(raw) = header else {
            return Self::new();
        };
        let fields: Vec<&str> = raw.split(' ').collect();
        let candidates = if fields.len() == 1 {
            &fields[..]
        } else {
            &fields[1..]
        };
        candidates
            .iter()
            .fold(Self::new(), |masker, field| masker.with_secret(field))
    }

    #[must_use]
    pub fn mask(&self, input: &str) -> String {
        let mut out = mask_access_token(input).into_owned();
        for secret in &self.secrets {
            let secret = secret.expose_secret();
            if out.contains(secret) {
                out = out.replace(secret, MASK);
            }
        }
        out
    }
}

impl fmt::Debug for Masker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Masker")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}
