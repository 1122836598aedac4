//! Access predicate library.

mod group;
mod identity;
mod scope;

use std::sync::Arc;

pub use group::{GroupMembershipCheck, NoAuthorization};
pub use identity::IdentityMembershipCheck;
pub use scope::{ScopeAndCheck, ScopeOrCheck};
use token_gate_sdk::{AccessPredicate, TeamDirectoryClient};

use crate::config::{ConfigError, PredicateConfig};

/// Turn a declarative chain into predicate objects, preserving order.
///
/// # Errors
///
/// - `EmptyChain` if `entries` is empty
/// - `MissingTeamApi` if a group check is configured without a directory
pub fn build_chain(
    entries: &[PredicateConfig],
    directory: Option<&Arc<dyn TeamDirectoryClient>>,
) -> Result<Vec<Arc<dyn AccessPredicate>>, ConfigError> {
    if entries.is_empty() {
        return Err(ConfigError::EmptyChain);
    }

    entries
        .iter()
        .map(|entry| -> Result<Arc<dyn AccessPredicate>, ConfigError> {
            Ok(match entry {
                PredicateConfig::UidCheck {
                    realm_sensitive: true,
                    allow,
                } => Arc::new(IdentityMembershipCheck::realm_sensitive(allow.clone())),
                PredicateConfig::UidCheck { allow, .. } => {
                    Arc::new(IdentityMembershipCheck::new(allow.clone()))
                }
                PredicateConfig::GroupCheck { allow } => {
                    let directory = directory
                        .cloned()
                        .ok_or(ConfigError::MissingTeamApi { kind: "group_check" })?;
                    Arc::new(GroupMembershipCheck::new(allow.clone(), directory))
                }
                PredicateConfig::ScopeAny { name, scopes } => {
                    Arc::new(ScopeOrCheck::new(name.clone(), scopes.iter().cloned()))
                }
                PredicateConfig::ScopeAll { name, scopes } => {
                    Arc::new(ScopeAndCheck::new(name.clone(), scopes.iter().cloned()))
                }
                PredicateConfig::NoAuthorization => {
                    Arc::new(NoAuthorization::new(directory.cloned()))
                }
            })
        })
        .collect()
}
