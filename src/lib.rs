use std::sync::Arc;

use axum::{middleware, Router};

pub mod auth;
pub mod codec;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod rpc;
pub mod server;
pub mod tls;

pub use codec::{Decoder, Encoder, Fault, IncomingCall, JsonCodec};
pub use config::ServerConfig;
pub use rpc::{
    events::{CallEvent, CallEventKind, Observer},
    gateway::{Disposition, Gateway},
    registry::{Completion, Handler, HandlerRegistry},
};
pub use server::RpcServer;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>, max_body_bytes: usize) -> Self {
        Self {
            gateway,
            max_body_bytes,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .fallback(http::handlers::rpc_endpoint)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
