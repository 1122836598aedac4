//! Configuration for the token gate.
//!
//! Loaded once at startup and never mutated afterwards, so concurrent
//! evaluations read it without synchronization.

use std::time::Duration;

use serde::Deserialize;
use token_gate_sdk::AccessTuple;
use url::Url;

fn default_deadline() -> Duration {
    Duration::from_secs(30)
}

/// Token gate configuration.
///
/// ```yaml
/// deadline: 30s
/// introspection:
///   token_url: "https://auth.example.com/oauth2/tokeninfo"
///   auth_url: "https://auth.example.com/oauth2/token"
///   token_in_header: false
/// team_api:
///   url: "https://teams.example.com/api/teams"
/// transport:
///   request_timeout: 10s
///   verify_tls: true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenGateConfig {
    /// Budget for one whole chain evaluation, introspection and team lookups included.
    #[serde(with = "humantime_str")]
    pub deadline: Duration,

    pub introspection: IntrospectionConfig,

    pub team_api: TeamApiConfig,

    pub transport: TransportConfig,
}

impl Default for TokenGateConfig {
    fn default() -> Self {
        Self {
            deadline: default_deadline(),
            introspection: IntrospectionConfig::default(),
            team_api: TeamApiConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl TokenGateConfig {
    /// Check the configuration before any client is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the deadline is zero or a URL does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline.is_zero() {
            return Err(ConfigError::ZeroDeadline);
        }
        parse_url("introspection.token_url", &self.introspection.token_url)?;
        if let Some(auth_url) = &self.introspection.auth_url {
            parse_url("introspection.auth_url", auth_url)?;
        }
        if let Some(team_url) = &self.team_api.url {
            parse_url("team_api.url", team_url)?;
        }
        if self.transport.request_timeout.is_zero() {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        Ok(())
    }
}

/// Introspection ("tokeninfo") endpoint settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntrospectionConfig {
    /// URL the credential is resolved against.
    pub token_url: String,

    /// Where clients obtain a new token. Sent as `Location` on 401 responses.
    pub auth_url: Option<String>,

    /// Deliver the credential in the `Authorization` header instead of the
    /// `access_token` query parameter.
    pub token_in_header: bool,
}

/// Team directory settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TeamApiConfig {
    /// Required only when a group predicate is configured.
    pub url: Option<String>,
}

/// Outbound transport settings shared by the introspection and team clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Per-request timeout. The chain deadline still applies on top of it.
    #[serde(with = "humantime_str")]
    pub request_timeout: Duration,

    /// How long idle pooled connections are kept.
    #[serde(with = "humantime_str")]
    pub pool_idle_timeout: Duration,

    pub pool_max_idle_per_host: usize,

    /// Verify server certificates against the native root store.
    pub verify_tls: bool,

    /// Upper bound for response bodies.
    pub max_body_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            verify_tls: true,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// One entry of a declaratively configured predicate chain.
///
/// ```yaml
/// - kind: uid_check
///   realm_sensitive: true
///   allow:
///     - { realm: "/employees", uid: "alice", cn: "Alice A" }
/// - kind: group_check
///   allow:
///     - { realm: "teams", uid: "teapot", cn: "Platform / Cloud API" }
/// - kind: scope_all
///   name: "uidcheck"
///   scopes: ["uid", "bar"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum PredicateConfig {
    UidCheck {
        #[serde(default)]
        realm_sensitive: bool,
        allow: Vec<AccessTuple>,
    },
    GroupCheck {
        allow: Vec<AccessTuple>,
    },
    ScopeAny {
        name: String,
        scopes: Vec<String>,
    },
    ScopeAll {
        name: String,
        scopes: Vec<String>,
    },
    NoAuthorization,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("deadline must be greater than zero")]
    ZeroDeadline,

    #[error("transport.request_timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("invalid URL in '{field}': {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("predicate chain must not be empty")]
    EmptyChain,

    #[error("predicate '{kind}' requires team_api.url")]
    MissingTeamApi { kind: &'static str },
}

pub(crate) fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })
}

/// Durations written the humantime way (`300ms`, `30s`, `1m 30s`).
mod humantime_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = TokenGateConfig::default();

        assert_eq!(cfg.deadline, Duration::from_secs(30));
        assert!(!cfg.introspection.token_in_header);
        assert!(cfg.transport.verify_tls);
        assert_eq!(cfg.transport.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn deserializes_humantime_durations() {
        let cfg: TokenGateConfig = serde_json::from_value(json!({
            "deadline": "300ms",
            "introspection": {
                "token_url": "https://auth.example.com/oauth2/tokeninfo",
                "token_in_header": true
            },
            "transport": { "request_timeout": "2s" }
        }))
        .unwrap();

        assert_eq!(cfg.deadline, Duration::from_millis(300));
        assert_eq!(cfg.transport.request_timeout, Duration::from_secs(2));
        assert_eq!(cfg.transport.pool_max_idle_per_host, 32);
        assert!(cfg.introspection.token_in_header);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<TokenGateConfig, _> =
            serde_json::from_value(json!({ "deadlines": "1s" }));

        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_missing_token_url() {
        let err = TokenGateConfig::default().validate().unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidUrl {
                field: "introspection.token_url",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_zero_deadline() {
        let cfg = TokenGateConfig {
            deadline: Duration::ZERO,
            ..TokenGateConfig::default()
        };

        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroDeadline)));
    }

    #[test]
    fn predicate_chain_deserializes_tagged_entries() {
        let chain: Vec<PredicateConfig> = serde_json::from_value(json!([
            {
                "kind": "uid_check",
                "realm_sensitive": true,
                "allow": [{ "realm": "/employees", "uid": "alice", "cn": "Alice A" }]
            },
            { "kind": "group_check", "allow": [{ "realm": "teams", "uid": "teapot" }] },
            { "kind": "scope_all", "name": "uidcheck", "scopes": ["uid", "bar"] },
            { "kind": "no_authorization" }
        ]))
        .unwrap();

        assert_eq!(chain.len(), 4);
        assert_eq!(
            chain[0],
            PredicateConfig::UidCheck {
                realm_sensitive: true,
                allow: vec![AccessTuple::new("/employees", "alice", "Alice A")],
            }
        );
        assert_eq!(chain[3], PredicateConfig::NoAuthorization);
    }
}
