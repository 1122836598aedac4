use std::path::Path;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use token_gate::{PredicateConfig, TokenGateConfig};

fn default_bind() -> String {
    "127.0.0.1:8080".to_owned()
}

fn default_log_keys() -> Vec<String> {
    vec!["uid".to_owned(), "team".to_owned()]
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub gate: TokenGateConfig,

    pub routes: RouteChains,

    /// Context keys reported by the request logger.
    #[serde(default = "default_log_keys")]
    pub log_keys: Vec<String>,
}

/// Predicate chain per protected route.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteChains {
    pub private: Vec<PredicateConfig>,
    pub private_group: Vec<PredicateConfig>,
    pub private_user: Vec<PredicateConfig>,
    pub private_service: Vec<PredicateConfig>,
}

impl DemoConfig {
    /// Load `path` and overlay `TOKEN_GATE__*` environment variables
    /// (`TOKEN_GATE__GATE__DEADLINE=5s`).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Self::from_figment(Figment::new().merge(Yaml::file(path)))
            .with_context(|| format!("failed to load configuration from {}", path.display()))
    }

    fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: Self = figment
            .merge(Env::prefixed("TOKEN_GATE__").split("__"))
            .extract()?;
        config.gate.validate()?;
        Ok(config)
    }
}
