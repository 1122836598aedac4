//! Domain models for the token gate module.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::context::keys;

/// Bearer credential extracted from an inbound `Authorization` header.
///
/// The token value is wrapped in [`SecretString`] so `Debug` output never
/// contains it.
#[derive(Debug, Clone)]
pub struct Credential {
    token_type: String,
    access_token: SecretString,
}

impl Credential {
    #[must_use]
    pub fn new(token_type: impl Into<String>, access_token: impl Into<SecretString>) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: access_token.into(),
        }
    }

    /// Token type label as presented by the client (e.g. `Bearer`).
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    #[must_use]
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }
}

/// The credential as confirmed by the introspection endpoint, with the
/// expiry computed at resolution time.
#[derive(Debug, Clone)]
pub struct ResolvedToken {
    token_type: String,
    access_token: SecretString,
    expiry: OffsetDateTime,
}

impl ResolvedToken {
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    #[must_use]
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub fn expiry(&self) -> OffsetDateTime {
        self.expiry
    }
}

/// Resolved identity of a credential: the token, its claims and the realm
/// it was issued in.
///
/// Built per request by the identity resolver and discarded when the request
/// ends. Predicates read it but never mutate it.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    token: ResolvedToken,
    scopes: HashMap<String, Value>,
    grant_type: String,
    realm: String,
}

impl IdentityRecord {
    /// Create a new `IdentityRecord` builder
    #[must_use]
    pub fn builder() -> IdentityRecordBuilder {
        IdentityRecordBuilder::default()
    }

    #[must_use]
    pub fn token(&self) -> &ResolvedToken {
        &self.token
    }

    /// Claims carried by the token, keyed by scope name.
    #[must_use]
    pub fn scopes(&self) -> &HashMap<String, Value> {
        &self.scopes
    }

    #[must_use]
    pub fn scope(&self, name: &str) -> Option<&Value> {
        self.scopes.get(name)
    }

    #[must_use]
    pub fn has_scope(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    /// The `uid` claim, if present and a string.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.scopes.get(keys::UID).and_then(Value::as_str)
    }

    #[must_use]
    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }

    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// A record is valid while its token is non-empty and its expiry lies
    /// strictly after `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        use secrecy::ExposeSecret;

        !self.token.access_token.expose_secret().is_empty() && self.token.expiry > now
    }

    /// Validity against the current wall clock.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc())
    }
}

pub struct IdentityRecordBuilder {
    token_type: String,
    access_token: SecretString,
    expiry: OffsetDateTime,
    scopes: HashMap<String, Value>,
    grant_type: String,
    realm: String,
}

impl Default for IdentityRecordBuilder {
    fn default() -> Self {
        Self {
            token_type: "Bearer".to_owned(),
            access_token: SecretString::from(String::new()),
            expiry: OffsetDateTime::UNIX_EPOCH,
            scopes: HashMap::new(),
            grant_type: String::new(),
            realm: String::new(),
        }
    }
}

impl IdentityRecordBuilder {
    #[must_use]
    pub fn token_type(mut self, token_type: &str) -> Self {
        token_type.clone_into(&mut self.token_type);
        self
    }

    #[must_use]
    pub fn access_token(mut self, token: impl Into<SecretString>) -> Self {
        self.access_token = token.into();
        self
    }

    #[must_use]
    pub fn expiry(mut self, expiry: OffsetDateTime) -> Self {
        self.expiry = expiry;
        self
    }

    /// Set the expiry relative to the current wall clock.
    #[must_use]
    pub fn expires_in(mut self, lifetime: Duration) -> Self {
        self.expiry = OffsetDateTime::now_utc() + lifetime;
        self
    }

    #[must_use]
    pub fn scope(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.scopes.insert(name.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn scopes(mut self, scopes: HashMap<String, Value>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn grant_type(mut self, grant_type: &str) -> Self {
        grant_type.clone_into(&mut self.grant_type);
        self
    }

    #[must_use]
    pub fn realm(mut self, realm: &str) -> Self {
        realm.clone_into(&mut self.realm);
        self
    }

    #[must_use]
    pub fn build(self) -> IdentityRecord {
        IdentityRecord {
            token: ResolvedToken {
                token_type: self.token_type,
                access_token: self.access_token,
                expiry: self.expiry,
            },
            scopes: self.scopes,
            grant_type: self.grant_type,
            realm: self.realm,
        }
    }
}

/// Static allow-list entry used by the membership predicates.
///
/// Supplied by the operator at configuration time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessTuple {
    /// Identity namespace, e.g. `employees` or `services`.
    #[serde(default)]
    pub realm: String,
    /// User name, service name or team id.
    pub uid: String,
    /// Human readable name.
    #[serde(default)]
    pub cn: String,
}

impl AccessTuple {
    #[must_use]
    pub fn new(realm: &str, uid: &str, cn: &str) -> Self {
        Self {
            realm: realm.to_owned(),
            uid: uid.to_owned(),
            cn: cn.to_owned(),
        }
    }
}

/// One team membership entry returned by the team directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRecord {
    pub id: String,
    #[serde(rename = "id_name", alias = "idName")]
    pub id_name: String,
    #[serde(rename = "team_id", alias = "teamId")]
    pub team_id: String,
    #[serde(rename = "type")]
    pub team_type: String,
    pub name: String,
    #[serde(rename = "mail")]
    pub mailing_lists: Vec<String>,
}

impl TeamRecord {
    /// Marker value of `type` for the member's canonical team.
    pub const OFFICIAL: &'static str = "official";

    #[must_use]
    pub fn is_official(&self) -> bool {
        self.team_type == Self::OFFICIAL
    }
}
