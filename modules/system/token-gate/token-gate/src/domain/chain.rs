//! Bounded chain evaluation.
//!
//! Resolution and predicate evaluation run as one spawned task that owns its
//! own [`RequestContext`]. The caller waits on a one-shot channel for at most
//! the configured deadline. When the deadline fires first the receiver is
//! dropped, so the task's eventual result has nowhere to go and is discarded.

use std::sync::Arc;
use std::time::Duration;

use token_gate_sdk::{
    AccessOutcome, AccessPredicate, IdentityError, IdentityRecord, IdentityResolverClient,
    RequestContext,
};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::Instrument;

use super::audit::record_decision;
use super::credential::extract_credential;
use super::error::DomainError;
use super::masking::Masker;
use crate::config::ConfigError;

/// Result of one evaluation.
#[derive(Debug)]
pub struct Decision {
    pub outcome: AccessOutcome,
    /// Annotations written by the chain. Only present for `Allowed`.
    pub context: Option<RequestContext>,
    pub elapsed: Duration,
}

/// Resolves the credential and runs an ordered predicate chain under a deadline.
///
/// Cheap to clone; clones share the resolver and the predicates.
#[derive(Clone)]
pub struct ChainEvaluator {
    resolver: Arc<dyn IdentityResolverClient>,
    predicates: Arc<[Arc<dyn AccessPredicate>]>,
    deadline: Duration,
}

impl ChainEvaluator {
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chain is empty or the deadline is zero.
    pub fn new(
        resolver: Arc<dyn IdentityResolverClient>,
        predicates: Vec<Arc<dyn AccessPredicate>>,
        deadline: Duration,
    ) -> Result<Self, ConfigError> {
        if predicates.is_empty() {
            return Err(ConfigError::EmptyChain);
        }
        if deadline.is_zero() {
            return Err(ConfigError::ZeroDeadline);
        }
        Ok(Self {
            resolver,
            predicates: predicates.into(),
            deadline,
        })
    }

    /// Chain consisting of a single predicate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDeadline`] if the deadline is zero.
    pub fn single(
        resolver: Arc<dyn IdentityResolverClient>,
        predicate: Arc<dyn AccessPredicate>,
        deadline: Duration,
    ) -> Result<Self, ConfigError> {
        Self::new(resolver, vec![predicate], deadline)
    }

    /// Decide one request.
    ///
    /// Produces exactly one outcome and writes exactly one audit line.
    pub async fn evaluate(&self, authorization: Option<&str>, path: &str) -> Decision {
        let started = Instant::now();
        let masker = Masker::for_authorization(authorization);

        let (tx, rx) = oneshot::channel();
        let resolver = Arc::clone(&self.resolver);
        let predicates = Arc::clone(&self.predicates);
        let header = authorization.map(str::to_owned);
        let task = async move {
            let mut ctx = RequestContext::new();
            let result = decide(resolver.as_ref(), &predicates, header.as_deref(), &mut ctx).await;
            if tx.send((result, ctx)).is_err() {
                tracing::debug!("chain finished after the deadline, result discarded");
            }
        };
        tokio::spawn(task.instrument(tracing::Span::current()));

        let (outcome, context) = match tokio::time::timeout(self.deadline, rx).await {
            Err(_elapsed) => (AccessOutcome::Overtime, None),
            Ok(Err(closed)) => (DomainError::from(closed).into(), None),
            Ok(Ok((Ok(true), ctx))) => (AccessOutcome::Allowed, Some(ctx)),
            Ok(Ok((Ok(false), _))) => (AccessOutcome::Forbidden, None),
            Ok(Ok((Err(e), _))) => (e.into(), None),
        };

        let elapsed = started.elapsed();
        record_decision(&masker, path, &outcome, elapsed);
        Decision {
            outcome,
            context,
            elapsed,
        }
    }
}

async fn decide(
    resolver: &dyn IdentityResolverClient,
    predicates: &[Arc<dyn AccessPredicate>],
    authorization: Option<&str>,
    ctx: &mut RequestContext,
) -> Result<bool, DomainError> {
    let credential = extract_credential(authorization)?;
    let identity = resolver.resolve(&credential).await?;
    ensure_valid(&identity)?;

    for predicate in predicates {
        ensure_valid(&identity)?;
        if predicate.evaluate(&identity, ctx).await {
            tracing::debug!(predicate = predicate.name(), "predicate granted access");
            return Ok(true);
        }
    }
    Ok(false)
}

fn ensure_valid(identity: &IdentityRecord) -> Result<(), IdentityError> {
    if identity.is_valid() {
        Ok(())
    } else {
        Err(IdentityError::Expired)
    }
}
