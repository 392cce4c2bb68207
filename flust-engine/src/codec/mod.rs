//! Codecs translating between [`Value`]s and the byte payloads carried by
//! platform messages.

pub mod basic_codec;
pub mod json_codec;
pub mod standard_codec;
pub mod value;

pub use self::basic_codec::{BinaryCodec, StringCodec, BINARY_CODEC, STRING_CODEC};
pub use self::json_codec::{JsonCodec, JSON_CODEC};
pub use self::standard_codec::{StandardCodec, STANDARD_CODEC};
pub use self::value::Value;

use crate::error::{MessageError, MethodCallError};

/// Method name and arguments of a call, independent of the channel it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallData {
    pub method: String,
    pub args: Value,
}

impl MethodCallData {
    pub fn new(method: impl Into<String>, args: Value) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// Decoded reply envelope.
pub type MethodCallResult = Result<Value, MethodCallError>;

pub trait MethodCodec: Send + Sync {
    fn encode_method_call(&self, call: &MethodCallData) -> Result<Vec<u8>, MessageError>;

    fn decode_method_call(&self, buf: &[u8]) -> Result<MethodCallData, MessageError>;

    fn encode_success_envelope(&self, result: &Value) -> Result<Vec<u8>, MessageError>;

    fn encode_error_envelope(
        &self,
        code: &str,
        message: Option<&str>,
        details: &Value,
    ) -> Result<Vec<u8>, MessageError>;

    fn decode_envelope(&self, buf: &[u8]) -> Result<MethodCallResult, MessageError>;
}

pub trait MessageCodec: Send + Sync {
    fn encode_message(&self, message: &Value) -> Result<Vec<u8>, MessageError>;

    fn decode_message(&self, buf: &[u8]) -> Result<Value, MessageError>;
}
