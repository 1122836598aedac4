//! Domain errors for the token gate.

use token_gate_sdk::{AccessOutcome, CredentialError, IdentityError};

/// Internal domain errors raised while deciding a single request.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::sync::oneshot::error::RecvError> for DomainError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::Internal("evaluation task ended without a decision".to_owned())
    }
}

impl From<DomainError> for AccessOutcome {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Credential(e) => Self::NoCredential(e),
            DomainError::Identity(e) => Self::InvalidCredential(e),
            DomainError::Internal(reason) => {
                tracing::error!(reason = %reason, "token gate failed to decide, denying");
                Self::Forbidden
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_outcomes() {
        assert_eq!(
            AccessOutcome::from(DomainError::from(CredentialError::Missing)),
            AccessOutcome::NoCredential(CredentialError::Missing)
        );
        assert_eq!(
            AccessOutcome::from(DomainError::from(IdentityError::Expired)),
            AccessOutcome::InvalidCredential(IdentityError::Expired)
        );
        assert_eq!(
            AccessOutcome::from(DomainError::Internal("boom".to_owned())),
            AccessOutcome::Forbidden
        );
    }
}
