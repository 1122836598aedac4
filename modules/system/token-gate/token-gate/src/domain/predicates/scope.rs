//! Scope-presence checks.

use async_trait::async_trait;
use token_gate_sdk::{AccessPredicate, IdentityRecord, RequestContext, keys};

fn forward_uid(identity: &IdentityRecord, ctx: &mut RequestContext) {
    if let Some(uid) = identity.scope(keys::UID) {
        ctx.set(keys::UID, uid.clone());
    }
}

/// Grants when at least one of the listed scopes is present on the token.
///
/// Every present scope is copied into the context. `uid` is forwarded
/// whenever the token carries one, even when the check denies.
#[derive(Debug, Clone)]
pub struct ScopeOrCheck {
    name: String,
    scopes: Vec<String>,
}

impl ScopeOrCheck {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl AccessPredicate for ScopeOrCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, identity: &IdentityRecord, ctx: &mut RequestContext) -> bool {
        let mut granted = false;
        for scope in &self.scopes {
            if let Some(value) = identity.scope(scope) {
                ctx.set(scope, value.clone());
                granted = true;
            }
        }

        forward_uid(identity, ctx);
        if granted {
            tracing::info!(predicate = %self.name, "grant access by scope");
        }
        granted
    }
}

/// Grants only when every listed scope is present on the token.
///
/// On failure nothing is written to the context.
#[derive(Debug, Clone)]
pub struct ScopeAndCheck {
    name: String,
    scopes: Vec<String>,
}

impl ScopeAndCheck {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl AccessPredicate for ScopeAndCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, identity: &IdentityRecord, ctx: &mut RequestContext) -> bool {
        let mut present = Vec::with_capacity(self.scopes.len());
        for scope in &self.scopes {
            let Some(value) = identity.scope(scope) else {
                tracing::debug!(predicate = %self.name, scope = %scope, "required scope missing");
                return false;
            };
            present.push((scope, value));
        }

        for (scope, value) in present {
            ctx.set(scope, value.clone());
        }
        forward_uid(identity, ctx);
        tracing::info!(predicate = %self.name, "grant access by scopes");
        true
    }
}
