use serde::{Deserialize, Serialize};

use super::{MessageCodec, MethodCallData, MethodCallResult, MethodCodec, Value};
use crate::error::{MessageError, MethodCallError};

/// UTF-8 encoded JSON, as used by most of the framework's system channels.
///
/// Method calls are `{"method": .., "args": ..}`; success envelopes are
/// `[result]` and error envelopes `[code, message, details]`.
pub struct JsonCodec;

pub const JSON_CODEC: JsonCodec = JsonCodec;

#[derive(Serialize)]
struct JsonMethodCallRef<'a> {
    method: &'a str,
    args: &'a Value,
}

#[derive(Deserialize)]
struct JsonMethodCall {
    method: String,
    #[serde(default)]
    args: Value,
}

impl MessageCodec for JsonCodec {
    fn encode_message(&self, message: &Value) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(message)?)
    }

    fn decode_message(&self, buf: &[u8]) -> Result<Value, MessageError> {
        if buf.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(buf)?)
    }
}

impl MethodCodec for JsonCodec {
    fn encode_method_call(&self, call: &MethodCallData) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(&JsonMethodCallRef {
            method: &call.method,
            args: &call.args,
        })?)
    }

    fn decode_method_call(&self, buf: &[u8]) -> Result<MethodCallData, MessageError> {
        let call: JsonMethodCall = serde_json::from_slice(buf)
            .map_err(|err| MessageError::InvalidMethodCall(err.to_string()))?;
        Ok(MethodCallData {
            method: call.method,
            args: call.args,
        })
    }

    fn encode_success_envelope(&self, result: &Value) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(&[result])?)
    }

    fn encode_error_envelope(
        &self,
        code: &str,
        message: Option<&str>,
        details: &Value,
    ) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(&(code, message, details))?)
    }

    fn decode_envelope(&self, buf: &[u8]) -> Result<MethodCallResult, MessageError> {
        let Value::List(mut items) = self.decode_message(buf)? else {
            return Err(MessageError::InvalidEnvelope);
        };
        match items.len() {
            1 => Ok(Ok(items.remove(0))),
            3 => {
                let details = items.remove(2);
                let message = match items.remove(1) {
                    Value::String(message) => Some(message),
                    Value::Null => None,
                    _ => return Err(MessageError::InvalidEnvelope),
                };
                let Value::String(code) = items.remove(0) else {
                    return Err(MessageError::InvalidEnvelope);
                };
                Ok(Err(MethodCallError {
                    code,
                    message,
                    details,
                }))
            }
            _ => Err(MessageError::InvalidEnvelope),
        }
    }
}
