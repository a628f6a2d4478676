//! Boundary between HTTP bodies and method calls
//!
//! The gateway never looks inside a payload. A [`Decoder`] turns a request body into an
//! [`IncomingCall`], and an [`Encoder`] turns a handler outcome into response bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod json;

pub use json::JsonCodec;

/// Content type used by encoders that do not declare their own.
pub const DEFAULT_CONTENT_TYPE: &str = "text/xml";

/// Fault code reported when a handler goes away without completing.
pub const INTERNAL_FAULT_CODE: i32 = -32603;

/// A decoded method call, alive for one request only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingCall {
    #[serde(rename = "methodName")]
    pub method_name: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl IncomingCall {
    pub fn new(method_name: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method_name: method_name.into(),
            params,
        }
    }
}

/// Error value returned by a handler. Travels in the response body, never in the status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("fault {code}: {message}")]
pub struct Fault {
    #[serde(rename = "faultCode")]
    pub code: i32,
    #[serde(rename = "faultString")]
    pub message: String,
}

impl Fault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_FAULT_CODE, message)
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("payload serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait Decoder: Send + Sync + 'static {
    fn decode_call(&self, body: &[u8]) -> Result<IncomingCall, CodecError>;
}

pub trait Encoder: Send + Sync + 'static {
    fn encode_response(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    fn encode_fault(&self, fault: &Fault) -> Result<Vec<u8>, CodecError>;

    fn content_type(&self) -> &'static str {
        DEFAULT_CONTENT_TYPE
    }
}
