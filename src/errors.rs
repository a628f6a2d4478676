use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::logging::FailureCause;

/// Failures scoped to one request. Each still resolves into exactly one response.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("undecodable call: {0}")]
    Decode(#[source] CodecError),
    #[error("response encoding failed: {0}")]
    Encode(#[source] CodecError),
}

/// The request logger reports the failure; the response only carries its cause.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut response = status.into_response();
        response
            .extensions_mut()
            .insert(FailureCause(self.to_string()));
        response
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("method `{0}` is already registered")]
    DuplicateMethod(String),
}

/// Failures of the listener lifecycle, surfaced to whoever called start or stop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to load TLS material: {0}")]
    Tls(String),
    #[error("server is already running")]
    AlreadyRunning,
    #[error("server is not running")]
    NotRunning,
    #[error("server is still draining a previous stop")]
    Stopping,
    #[error("server task ended abnormally: {0}")]
    Serve(String),
}
