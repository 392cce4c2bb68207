use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, trace};

use crate::channel::platform_message::PlatformMessageResponseHandle;
use crate::codec::value::{from_value_ref, to_value, ValueError};
use crate::codec::{MethodCallData, MethodCodec, Value};
use crate::error::MessageError;

/// An incoming method call waiting for its reply.
///
/// Replying consumes the call. A call dropped without a reply is answered
/// with an empty message, which the framework treats as "not implemented".
pub struct MethodCall {
    channel: String,
    method: String,
    args: Value,
    codec: &'static dyn MethodCodec,
    response_handle: Option<PlatformMessageResponseHandle>,
}

impl MethodCall {
    pub(crate) fn new(
        channel: String,
        call: MethodCallData,
        codec: &'static dyn MethodCodec,
        response_handle: Option<PlatformMessageResponseHandle>,
    ) -> Self {
        Self {
            channel,
            method: call.method,
            args: call.args,
            codec,
            response_handle,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn method(&self) -> &String {
        &self.method
    }

    pub fn raw_args(&self) -> &Value {
        &self.args
    }

    /// Deserializes the arguments into `T`.
    pub fn args<T: DeserializeOwned>(&self) -> Result<T, ValueError> {
        from_value_ref(&self.args)
    }

    pub fn success<T: Serialize>(self, result: T) {
        match to_value(result) {
            Ok(result) => {
                let buf = self.codec.encode_success_envelope(&result);
                self.respond_with(buf);
            }
            Err(err) => {
                error!("Failed to convert result of {}: {}", self.method, err);
                self.error("encode-error", err.to_string(), Value::Null);
            }
        }
    }

    pub fn success_empty(self) {
        self.success(Value::Null)
    }

    pub fn error<C, M, D>(self, code: C, message: M, details: D)
    where
        C: AsRef<str>,
        M: AsRef<str>,
        D: Serialize,
    {
        let details = to_value(details).unwrap_or_else(|err| {
            error!("Failed to convert error details of {}: {}", self.method, err);
            Value::Null
        });
        let buf = self
            .codec
            .encode_error_envelope(code.as_ref(), Some(message.as_ref()), &details);
        self.respond_with(buf);
    }

    pub fn not_implemented(self) {
        trace!("method {} not implemented on {}", self.method, self.channel);
        self.respond(Vec::new());
    }

    fn respond_with(self, buf: Result<Vec<u8>, MessageError>) {
        match buf {
            Ok(buf) => self.respond(buf),
            Err(err) => {
                error!("Failed to encode reply to {}: {}", self.method, err);
                self.respond(Vec::new());
            }
        }
    }

    fn respond(mut self, buf: Vec<u8>) {
        if let Some(handle) = self.response_handle.take() {
            handle.send_response(buf);
        }
    }
}
