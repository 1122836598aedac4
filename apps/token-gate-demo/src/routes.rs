use std::sync::Arc;

use anyhow::Context;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use token_gate::{
    ChainEvaluator, GateContext, PredicateConfig, RequestLogKeys, TokenGateState, build_chain,
    request_logger, token_gate_middleware,
};
use token_gate_sdk::{IdentityResolverClient, TeamDirectoryClient, keys};

use crate::config::DemoConfig;

async fn public() -> Json<Value> {
    Json(json!({ "message": "Hello to public world" }))
}

async fn private(GateContext(ctx): GateContext) -> Json<Value> {
    Json(json!({
        "message": "Hello from private",
        "uid": ctx.get(keys::UID),
        "team": ctx.get(keys::TEAM),
        "cn": ctx.get(keys::CN),
    }))
}

/// Everything the router needs from the outside world.
pub struct Collaborators {
    pub resolver: Arc<dyn IdentityResolverClient>,
    pub directory: Option<Arc<dyn TeamDirectoryClient>>,
}

fn gated(
    path: &str,
    chain: &[PredicateConfig],
    config: &DemoConfig,
    collaborators: &Collaborators,
) -> anyhow::Result<Router> {
    let predicates = build_chain(chain, collaborators.directory.as_ref())
        .with_context(|| format!("invalid predicate chain for {path}"))?;
    let evaluator = ChainEvaluator::new(
        Arc::clone(&collaborators.resolver),
        predicates,
        config.gate.deadline,
    )?;
    let state = TokenGateState::new(evaluator, config.gate.introspection.auth_url.as_deref())?;

    Ok(Router::new()
        .route(path, get(private).post(private))
        .layer(from_fn_with_state(state, token_gate_middleware)))
}

/// Build the demo router: four gated routes and one public route, all
/// behind the request logger.
pub fn router(config: &DemoConfig, collaborators: &Collaborators) -> anyhow::Result<Router> {
    let routes = &config.routes;
    let app = Router::new()
        .merge(gated("/api/private", &routes.private, config, collaborators)?)
        .merge(gated("/api/private-group", &routes.private_group, config, collaborators)?)
        .merge(gated("/api/private-user", &routes.private_user, config, collaborators)?)
        .merge(gated(
            "/api/private-service",
            &routes.private_service,
            config,
            collaborators,
        )?)
        .route("/api/public", get(public))
        .layer(from_fn_with_state(
            RequestLogKeys::new(config.log_keys.iter().cloned()),
            request_logger,
        ));
    Ok(app)
}
