//! Domain layer for the token gate.

pub mod audit;
pub mod chain;
pub mod credential;
pub mod error;
pub mod introspection;
pub mod masking;
pub mod predicates;

pub use chain::{ChainEvaluator, Decision};
pub use credential::extract_credential;
pub use error::DomainError;
pub use introspection::parse_identity;
pub use masking::{MASK, Masker, mask_access_token};
