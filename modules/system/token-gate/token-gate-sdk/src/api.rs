//! Public API traits for the token gate.
//!
//! The gate talks to two remote collaborators (the introspection endpoint and
//! the team directory) and evaluates a chain of access predicates. Each of
//! these sits behind a trait so implementations can be swapped for tests or
//! for other identity providers.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::context::RequestContext;
use crate::error::{IdentityError, TeamDirectoryError};
use crate::models::{Credential, IdentityRecord, TeamRecord};

/// Resolves a bearer credential into an [`IdentityRecord`].
///
/// ```ignore
/// let identity = resolver.resolve(&credential).await?;
/// assert!(identity.is_valid());
/// ```
#[async_trait]
pub trait IdentityResolverClient: Send + Sync {
    /// Exchange the credential for an identity record.
    ///
    /// Implementations do not retry; a failed call is a failed resolution.
    ///
    /// # Errors
    ///
    /// - `ResolutionUnavailable` on transport failures
    /// - `MalformedIntrospectionResponse` if the body cannot be parsed
    /// - `TokenMismatch` if the endpoint answered for another token
    /// - `IntrospectionRejected` if the endpoint returned an error description
    async fn resolve(&self, credential: &Credential) -> Result<IdentityRecord, IdentityError>;
}

/// Looks up the teams a member belongs to.
#[async_trait]
pub trait TeamDirectoryClient: Send + Sync {
    /// List the teams of `member`, authenticating with `bearer_token`.
    ///
    /// # Errors
    ///
    /// - `Unavailable` on transport failures
    /// - `MalformedResponse` if the body is not a JSON array of teams
    async fn teams_of(
        &self,
        member: &str,
        bearer_token: &SecretString,
    ) -> Result<Vec<TeamRecord>, TeamDirectoryError>;
}

/// A single access-control decision function.
///
/// Predicates may annotate `ctx` (for example with the authorized `uid`) but
/// never mutate the identity. A predicate that cannot decide (missing claim,
/// failed lookup) answers `false`.
#[async_trait]
pub trait AccessPredicate: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Decide whether `identity` is granted access.
    async fn evaluate(&self, identity: &IdentityRecord, ctx: &mut RequestContext) -> bool;
}
