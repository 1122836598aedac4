//! Axum boundary: gate middleware, context extractor and request logger.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{AUTHORIZATION, LOCATION};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use token_gate_sdk::{AccessOutcome, RequestContext};

use crate::config::{ConfigError, parse_url};
use crate::domain::chain::ChainEvaluator;
use crate::domain::masking::mask_access_token;

/// State for [`token_gate_middleware`].
#[derive(Clone)]
pub struct TokenGateState {
    evaluator: ChainEvaluator,
    auth_url: Option<HeaderValue>,
}

impl TokenGateState {
    /// `auth_url` is sent as `Location` on 401 responses.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `auth_url` is not a valid URL.
    pub fn new(evaluator: ChainEvaluator, auth_url: Option<&str>) -> Result<Self, ConfigError> {
        let auth_url = auth_url
            .map(|raw| {
                let url = parse_url("introspection.auth_url", raw)?;
                HeaderValue::from_str(url.as_str()).map_err(|e| ConfigError::InvalidUrl {
                    field: "introspection.auth_url",
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self {
            evaluator,
            auth_url,
        })
    }
}

/// Gate middleware.
///
/// On `Allowed` the request continues with the [`RequestContext`] in its
/// extensions; the context is also attached to the response so outer layers
/// can read it. Every other outcome ends the request with an empty body:
/// 401 (plus `Location` when configured), 403 or 504.
pub async fn token_gate_middleware(
    State(state): State<TokenGateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let decision = state
        .evaluator
        .evaluate(authorization.as_deref(), req.uri().path())
        .await;

    match decision.outcome {
        AccessOutcome::Allowed => {
            let ctx = decision.context.unwrap_or_default();
            req.extensions_mut().insert(ctx.clone());
            let mut response = next.run(req).await;
            response.extensions_mut().insert(ctx);
            response
        }
        AccessOutcome::NoCredential(_) | AccessOutcome::InvalidCredential(_) => {
            let mut response = StatusCode::UNAUTHORIZED.into_response();
            if let Some(location) = &state.auth_url {
                response.headers_mut().insert(LOCATION, location.clone());
            }
            response
        }
        AccessOutcome::Forbidden => StatusCode::FORBIDDEN.into_response(),
        AccessOutcome::Overtime => StatusCode::GATEWAY_TIMEOUT.into_response(),
    }
}

/// Extractor for the [`RequestContext`] of an allowed request.
///
/// Fails with 500 if the gate middleware is not installed on the route.
#[derive(Debug, Clone)]
pub struct GateContext(pub RequestContext);

impl<S> FromRequestParts<S> for GateContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(GateContext)
            .ok_or_else(|| {
                tracing::error!("RequestContext not found - token gate middleware not configured");
                StatusCode::INTERNAL_SERVER_ERROR
            })
    }
}

/// Context keys whose values the request logger reports.
#[derive(Debug, Clone)]
pub struct RequestLogKeys(Arc<[String]>);

impl RequestLogKeys {
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }
}

/// Logs successful non-GET requests together with the identity that made
/// them, e.g. `POST /api/private for alice-teapot`.
///
/// Must be layered outside the gate middleware.
pub async fn request_logger(
    State(keys): State<RequestLogKeys>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = mask_access_token(req.uri().path()).into_owned();

    let response = next.run(req).await;

    if method != Method::GET && response.status().is_success() {
        let who = response
            .extensions()
            .get::<RequestContext>()
            .map_or_else(String::new, |ctx| {
                keys.0
                    .iter()
                    .filter_map(|key| ctx.get_str(key))
                    .collect::<Vec<_>>()
                    .join("-")
            });
        tracing::info!(method = %method, path = %path, who = %who, "request");
    }
    response
}
