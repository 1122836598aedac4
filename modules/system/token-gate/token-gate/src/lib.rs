//! Token Gate Module
//!
//! Authorizes inbound requests carrying an OAuth2 bearer token. The token is
//! resolved through a remote introspection endpoint and the resulting
//! identity is run through an ordered chain of access predicates, all within
//! a single deadline.
//!
//! The [`token_gate_sdk`] traits are implemented here by
//! [`HttpIdentityResolver`] and [`HttpTeamDirectory`]; the predicate library
//! lives in [`domain::predicates`] and the axum integration in [`api`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;

pub use api::{GateContext, RequestLogKeys, TokenGateState, request_logger, token_gate_middleware};
pub use config::{ConfigError, PredicateConfig, TokenGateConfig};
pub use domain::predicates::{
    GroupMembershipCheck, IdentityMembershipCheck, NoAuthorization, ScopeAndCheck, ScopeOrCheck,
    build_chain,
};
pub use domain::{ChainEvaluator, Decision, Masker};
pub use infra::{HttpIdentityResolver, HttpTeamDirectory, HttpTransport, TransportError};
