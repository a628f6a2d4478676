//! The dispatch gateway
//!
//! Drives one request from decoded call to HTTP response: authenticate, look the method up,
//! run the handler, encode the outcome. Authentication always runs before the lookup, so an
//! unauthenticated caller cannot learn which methods exist.

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::info;

use crate::auth::{authenticate, extract_credentials, Credentials};
use crate::codec::{CodecError, Decoder, Encoder, Fault, IncomingCall, JsonCodec};
use crate::errors::GatewayError;
use crate::rpc::events::{CallEventKind, Observer, Observers};
use crate::rpc::registry::{Handler, HandlerRegistry};

/// Terminal outcome of one call. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Forbidden,
    NotFound,
    Fulfilled(Value),
    Faulted(Fault),
}

impl Disposition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Fulfilled(_) => "fulfilled",
            Self::Faulted(_) => "faulted",
        }
    }
}

pub struct Gateway {
    credentials: Credentials,
    registry: HandlerRegistry,
    decoder: Arc<dyn Decoder>,
    encoder: Arc<dyn Encoder>,
    observers: Observers,
}

impl Gateway {
    /// A gateway speaking [`JsonCodec`] until [`Gateway::with_codec`] says otherwise.
    pub fn new(credentials: Credentials, registry: HandlerRegistry) -> Self {
        let codec = Arc::new(JsonCodec::new());
        Self {
            credentials,
            registry,
            decoder: codec.clone(),
            encoder: codec,
            observers: Observers::default(),
        }
    }

    pub fn with_codec<C>(mut self, codec: C) -> Self
    where
        C: Decoder + Encoder,
    {
        let codec = Arc::new(codec);
        self.decoder = codec.clone();
        self.encoder = codec;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Result<Response, GatewayError> {
        let call = self.decoder.decode_call(body).map_err(GatewayError::Decode)?;
        let supplied = extract_credentials(headers);
        let disposition = self.resolve(&supplied, call).await;
        self.respond(disposition)
    }

    pub async fn resolve(&self, supplied: &Credentials, call: IncomingCall) -> Disposition {
        let IncomingCall {
            method_name,
            params,
        } = call;
        let audit_params = masked_params(&params);

        let disposition = if !authenticate(&self.credentials, supplied) {
            self.observers
                .notify(CallEventKind::Forbidden, &method_name, &params);
            Disposition::Forbidden
        } else if let Some(handler) = self.registry.lookup(&method_name) {
            self.observers
                .notify(CallEventKind::Dispatched, &method_name, &params);
            match handler.call(&method_name, params).await {
                Ok(value) => Disposition::Fulfilled(value),
                Err(fault) => Disposition::Faulted(fault),
            }
        } else {
            self.observers
                .notify(CallEventKind::NotFound, &method_name, &params);
            Disposition::NotFound
        };

        info!(
            method = %method_name,
            params = %audit_params,
            disposition = disposition.label(),
            "rpc call audited"
        );

        disposition
    }

    pub fn respond(&self, disposition: Disposition) -> Result<Response, GatewayError> {
        match disposition {
            Disposition::Forbidden => Ok(StatusCode::FORBIDDEN.into_response()),
            Disposition::NotFound => Ok(StatusCode::NOT_FOUND.into_response()),
            Disposition::Fulfilled(value) => self.encoded(self.encoder.encode_response(&value)),
            Disposition::Faulted(fault) => self.encoded(self.encoder.encode_fault(&fault)),
        }
    }

    fn encoded(&self, body: Result<Vec<u8>, CodecError>) -> Result<Response, GatewayError> {
        let body = body.map_err(GatewayError::Encode)?;
        Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, self.encoder.content_type())],
            body,
        )
            .into_response())
    }
}

/// Placeholder written over secret-looking values in the audit line.
pub const MASK: &str = "***";

/// Lowercase key fragments whose values never reach the audit line.
const SENSITIVE_FRAGMENTS: &[&str] = &[
    "auth",
    "pass",
    "secret",
    "token",
    "credential",
    "apikey",
    "api_key",
    "private_key",
];

fn masked_params(params: &[Value]) -> Value {
    let mut audited = Value::Array(params.to_vec());
    mask_secrets(&mut audited);
    audited
}

/// Overwrites, in place and at any depth, every object value whose key names a secret.
pub fn mask_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if names_secret(key) {
                    *item = Value::String(MASK.to_string());
                } else {
                    mask_secrets(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_secrets),
        _ => {}
    }
}

fn names_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS
        .iter()
        .any(|fragment| key.contains(fragment))
}
