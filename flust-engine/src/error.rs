use thiserror::Error;

use crate::codec::{value::ValueError, Value};

/// Failure reported by the wrapped engine library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlutterEngineError {
    #[error("Invalid library version")]
    InvalidLibraryVersion,

    #[error("Invalid arguments")]
    InvalidArguments,

    #[error("Internal inconsistency")]
    InternalInconsistency,
}

/// Failure to encode or decode a channel payload.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("unknown value type {0}")]
    UnknownType(u8),

    #[error("unexpected end of message")]
    UnexpectedEof,

    #[error("message contains {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("invalid utf-8 string: {0}")]
    InvalidString(#[from] std::str::Utf8Error),

    #[error("size {0} does not fit into a message")]
    SizeOverflow(usize),

    #[error("invalid method call: {0}")]
    InvalidMethodCall(String),

    #[error("invalid envelope")]
    InvalidEnvelope,

    #[error("values nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Application level error produced by a method call handler and carried back
/// to the caller inside an error envelope.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {}", .message.as_deref().unwrap_or_default())]
pub struct MethodCallError {
    pub code: String,
    pub message: Option<String>,
    pub details: Value,
}

impl MethodCallError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, details: Value) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
            details,
        }
    }
}

/// Failure of a host to engine invocation, as seen by the caller.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The engine answered with an empty payload: nobody listens on `channel`.
    #[error("no handler registered for channel {0}")]
    NoHandler(String),

    #[error("failed to send message: {0}")]
    Transport(#[from] FlutterEngineError),

    #[error("failed to encode message: {0}")]
    Encode(MessageError),

    #[error("failed to decode reply: {0}")]
    Decode(#[from] MessageError),

    #[error(transparent)]
    Method(#[from] MethodCallError),

    #[error("blocking invocation is not allowed on the platform thread")]
    PlatformThread,

    #[error("engine is gone")]
    Disconnected,
}
