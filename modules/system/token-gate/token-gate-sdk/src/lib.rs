#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Token Gate SDK
//!
//! This crate provides the public API for the `token_gate` module:
//!
//! - [`IdentityResolverClient`] - Resolves a bearer credential via introspection
//! - [`TeamDirectoryClient`] - Second-hop team membership lookup
//! - [`AccessPredicate`] - A single access-control decision
//! - [`IdentityRecord`], [`Credential`], [`AccessTuple`], [`TeamRecord`] - Data model
//! - [`RequestContext`] - Per-request annotations written by predicates
//! - [`AccessOutcome`] - Terminal outcome of a chain evaluation
//!
//! ## Usage
//!
//! ```ignore
//! use token_gate_sdk::{AccessPredicate, IdentityRecord, RequestContext};
//!
//! let mut ctx = RequestContext::new();
//! if predicate.evaluate(&identity, &mut ctx).await {
//!     println!("granted for {:?}", ctx.get_str("uid"));
//! }
//! ```

pub mod api;
pub mod context;
pub mod error;
pub mod models;
pub mod outcome;

// Re-export main types at crate root
pub use api::{AccessPredicate, IdentityResolverClient, TeamDirectoryClient};
pub use context::{RequestContext, keys};
pub use error::{CredentialError, IdentityError, TeamDirectoryError};
pub use models::{AccessTuple, Credential, IdentityRecord, IdentityRecordBuilder, ResolvedToken, TeamRecord};
pub use outcome::AccessOutcome;
