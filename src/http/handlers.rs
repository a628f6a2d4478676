//! Axum handler feeding inbound requests to the gateway

use axum::{
    body::to_bytes,
    extract::{Request, State},
    response::Response,
};

use crate::codec::CodecError;
use crate::errors::GatewayError;
use crate::AppState;

pub async fn rpc_endpoint(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|err| GatewayError::Decode(CodecError::Body(err.to_string())))?;

    state.gateway.handle(&parts.headers, &body).await
}
