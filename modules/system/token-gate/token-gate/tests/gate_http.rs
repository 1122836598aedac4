#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Gate middleware driven through an axum router, with the introspection
//! endpoint and team directory served by `httpmock`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use httpmock::prelude::*;
use serde_json::json;
use token_gate::config::{IntrospectionConfig, TransportConfig};
use token_gate::{
    ChainEvaluator, GateContext, HttpIdentityResolver, HttpTeamDirectory, HttpTransport,
    PredicateConfig, RequestLogKeys, TokenGateState, build_chain, request_logger,
    token_gate_middleware,
};
use token_gate_sdk::{AccessTuple, TeamDirectoryClient};
use tower::ServiceExt;

const AUTH_URL: &str = "https://auth.example.com/oauth2/token";

fn tokeninfo(token: &str, uid: &str, realm: &str) -> serde_json::Value {
    json!({
        "token_type": "Bearer",
        "grant_type": "password",
        "realm": realm,
        "expires_in": 3600,
        "access_token": token,
        "scope": ["uid"],
        "uid": uid
    })
}

async fn whoami(GateContext(ctx): GateContext) -> String {
    format!(
        "{}/{}",
        ctx.get_str("uid").unwrap_or("-"),
        ctx.get_str("team").unwrap_or("-")
    )
}

fn router(server: &MockServer, chain: &[PredicateConfig], deadline: Duration) -> Router {
    let transport = HttpTransport::new(&TransportConfig::default()).unwrap();
    let resolver = HttpIdentityResolver::new(
        transport.clone(),
        &IntrospectionConfig {
            token_url: server.url("/oauth2/tokeninfo"),
            auth_url: Some(AUTH_URL.to_owned()),
            token_in_header: false,
        },
    )
    .unwrap();
    let directory: Arc<dyn TeamDirectoryClient> =
        Arc::new(HttpTeamDirectory::new(transport, &server.url("/api/teams")).unwrap());

    let predicates = build_chain(chain, Some(&directory)).unwrap();
    let evaluator = ChainEvaluator::new(Arc::new(resolver), predicates, deadline).unwrap();
    let state = TokenGateState::new(evaluator, Some(AUTH_URL)).unwrap();

    Router::new()
        .route("/api/private", get(whoami).post(whoami))
        .route("/api/submit", post(|| async { StatusCode::CREATED }))
        .layer(from_fn_with_state(state, token_gate_middleware))
        .layer(from_fn_with_state(RequestLogKeys::new(["uid", "team"]), request_logger))
}

fn request(method: &str, path: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn uid_chain() -> Vec<PredicateConfig> {
    vec![PredicateConfig::UidCheck {
        realm_sensitive: true,
        allow: vec![AccessTuple::new("/employees", "alice", "Alice A")],
    }]
}

#[tokio::test]
async fn allowed_request_reaches_handler_with_context() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/oauth2/tokeninfo")
                .query_param("access_token", "tok-alice");
            then.status(200)
                .json_body(tokeninfo("tok-alice", "alice", "/employees"));
        })
        .await;

    let response = router(&server, &uid_chain(), Duration::from_secs(5))
        .oneshot(request("GET", "/api/private", Some("Bearer tok-alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "alice/-");
}

#[tokio::test]
async fn missing_header_is_unauthorized_with_location() {
    let server = MockServer::start_async().await;
    let introspection = server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/tokeninfo");
            then.status(200);
        })
        .await;

    let response = router(&server, &uid_chain(), Duration::from_secs(5))
        .oneshot(request("GET", "/api/private", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::LOCATION], AUTH_URL);
    assert!(body_text(response).await.is_empty());
    introspection.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/tokeninfo");
            then.status(401).json_body(json!({
                "error": "invalid_token",
                "error_description": "Access Token not valid"
            }));
        })
        .await;

    let response = router(&server, &uid_chain(), Duration::from_secs(5))
        .oneshot(request("GET", "/api/private", Some("Bearer tok-bad")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::LOCATION], AUTH_URL);
}

#[tokio::test]
async fn unlisted_identity_is_forbidden() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/tokeninfo");
            then.status(200)
                .json_body(tokeninfo("tok-bob", "bob", "/employees"));
        })
        .await;

    let response = router(&server, &uid_chain(), Duration::from_secs(5))
        .oneshot(request("GET", "/api/private", Some("Bearer tok-bob")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::LOCATION).is_none());
}

#[tokio::test]
async fn slow_introspection_is_gateway_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/tokeninfo");
            then.status(200)
                .delay(Duration::from_millis(800))
                .json_body(tokeninfo("tok-alice", "alice", "/employees"));
        })
        .await;

    let response = router(&server, &uid_chain(), Duration::from_millis(100))
        .oneshot(request("GET", "/api/private", Some("Bearer tok-alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn group_check_grants_team_member_and_records_official_team() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/tokeninfo");
            then.status(200)
                .json_body(tokeninfo("tok-carol", "carol", "/employees"));
        })
        .await;
    let teams = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/teams")
                .query_param("member", "carol")
                .header("authorization", "Bearer tok-carol");
            then.status(200).json_body(json!([
                { "id": "teapot", "type": "official", "name": "Platform / Cloud API" },
                { "id": "guild", "type": "virtual" }
            ]));
        })
        .await;

    let chain = vec![
        PredicateConfig::UidCheck {
            realm_sensitive: false,
            allow: vec![AccessTuple::new("/employees", "alice", "Alice A")],
        },
        PredicateConfig::GroupCheck {
            allow: vec![AccessTuple::new("teams", "guild", "Guild")],
        },
    ];
    let response = router(&server, &chain, Duration::from_secs(5))
        .oneshot(request("GET", "/api/private", Some("Bearer tok-carol")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "carol/teapot");
    teams.assert_async().await;
}

#[tokio::test]
async fn submit_route_passes_through_both_layers() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/tokeninfo");
            then.status(200)
                .json_body(tokeninfo("tok-alice", "alice", "/employees"));
        })
        .await;

    let response = router(&server, &uid_chain(), Duration::from_secs(5))
        .oneshot(request("POST", "/api/submit", Some("Bearer tok-alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn first_granting_predicate_skips_group_lookup() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/oauth2/tokeninfo");
            then.status(200)
                .json_body(tokeninfo("tok-alice", "alice", "/employees"));
        })
        .await;
    let teams = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/teams");
            then.status(200).json_body(json!([]));
        })
        .await;

    let chain = vec![
        PredicateConfig::UidCheck {
            realm_sensitive: false,
            allow: vec![AccessTuple::new("", "alice", "")],
        },
        PredicateConfig::GroupCheck {
            allow: vec![AccessTuple::new("teams", "guild", "Guild")],
        },
    ];
    let response = router(&server, &chain, Duration::from_secs(5))
        .oneshot(request("GET", "/api/private", Some("Bearer tok-alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    teams.assert_calls_async(0).await;
}
