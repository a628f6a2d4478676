//! JSON rendition of the call/response payloads
//!
//! ```text
//! call:     {"methodName": "add", "params": [2, 3]}
//! success:  {"result": 5}
//! fault:    {"fault": {"faultCode": 4, "faultString": "Too many parameters."}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CodecError, Decoder, Encoder, Fault, IncomingCall};

/// Response body; the single top-level key is the success/fault discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply {
    Result(Value),
    Fault(Fault),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }

    /// Client side of [`Decoder::decode_call`].
    pub fn encode_call(&self, call: &IncomingCall) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(call)?)
    }

    /// Client side of the two encoder paths.
    pub fn decode_reply(&self, body: &[u8]) -> Result<Reply, CodecError> {
        Ok(serde_json::from_slice(body)?)
    }
}

impl Decoder for JsonCodec {
    fn decode_call(&self, body: &[u8]) -> Result<IncomingCall, CodecError> {
        let call: IncomingCall = serde_json::from_slice(body)
            .map_err(|err| CodecError::Malformed(err.to_string()))?;

        if call.method_name.trim().is_empty() {
            return Err(CodecError::Malformed("methodName must not be empty".to_string()));
        }

        Ok(call)
    }
}

impl Encoder for JsonCodec {
    fn encode_response(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&Reply::Result(value.clone()))?)
    }

    fn encode_fault(&self, fault: &Fault) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&Reply::Fault(fault.clone()))?)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
