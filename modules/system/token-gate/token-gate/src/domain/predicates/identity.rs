//! Allow-list check on the token's `uid` claim.

use async_trait::async_trait;
use token_gate_sdk::{AccessPredicate, AccessTuple, IdentityRecord, RequestContext, keys};

/// Grants when the identity's `uid` claim is on the allow-list.
///
/// The realm-sensitive variant additionally requires the tuple's realm to
/// equal the identity's realm and records the tuple's `cn` on grant.
#[derive(Debug, Clone)]
pub struct IdentityMembershipCheck {
    allow: Vec<AccessTuple>,
    realm_sensitive: bool,
}

impl IdentityMembershipCheck {
    /// Match on `uid` only.
    #[must_use]
    pub fn new(allow: Vec<AccessTuple>) -> Self {
        Self {
            allow,
            realm_sensitive: false,
        }
    }

    /// Match on realm and `uid`.
    #[must_use]
    pub fn realm_sensitive(allow: Vec<AccessTuple>) -> Self {
        Self {
            allow,
            realm_sensitive: true,
        }
    }

    fn find(&self, identity: &IdentityRecord, uid: &str) -> Option<&AccessTuple> {
        self.allow.iter().find(|tuple| {
            tuple.uid == uid && (!self.realm_sensitive || tuple.realm == identity.realm())
        })
    }
}

#[async_trait]
impl AccessPredicate for IdentityMembershipCheck {
    fn name(&self) -> &str {
        if self.realm_sensitive {
            "uid_check_realm"
        } else {
            "uid_check"
        }
    }

    async fn evaluate(&self, identity: &IdentityRecord, ctx: &mut RequestContext) -> bool {
        let Some(uid) = identity.uid() else {
            tracing::debug!(predicate = self.name(), "identity has no string uid claim");
            return false;
        };

        let Some(tuple) = self.find(identity, uid) else {
            return false;
        };

        ctx.set(keys::UID, uid);
        if self.realm_sensitive {
            ctx.set(keys::CN, tuple.cn.as_str());
        }
        tracing::info!(uid, realm = identity.realm(), "grant access to user");
        true
    }
}
