//! Terminal outcomes of a bounded chain evaluation.

use crate::error::{CredentialError, IdentityError};

/// Exactly one of these is produced per chain evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// A predicate granted access.
    Allowed,
    /// The request carried no usable credential.
    NoCredential(CredentialError),
    /// The credential could not be resolved into a valid identity.
    InvalidCredential(IdentityError),
    /// The identity is valid but no predicate granted access.
    Forbidden,
    /// The deadline fired before a decision was reached.
    Overtime,
}

impl AccessOutcome {
    /// Stable, low-cardinality label for logs and metrics.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::NoCredential(_) => "no_credential",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::Forbidden => "forbidden",
            Self::Overtime => "overtime",
        }
    }
}
