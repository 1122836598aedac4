//! HTTP boundary for axum services.

pub mod middleware;

pub use middleware::{
    GateContext, RequestLogKeys, TokenGateState, request_logger, token_gate_middleware,
};
