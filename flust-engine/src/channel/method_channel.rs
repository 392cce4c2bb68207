use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::bounded;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::platform_message::PlatformMessage;
use super::{Channel, MethodCall};
use crate::codec::value::to_value;
use crate::codec::{MethodCallData, MethodCodec, Value};
use crate::error::{InvokeError, MessageError};
use crate::{FlutterEngine, FlutterEngineWeakRef};

pub trait MethodCallHandler {
    fn on_method_call(&mut self, call: MethodCall);
}

/// Thread a [`MethodChannel`]'s handler runs on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HandlerMode {
    /// Inline on the platform thread.
    #[default]
    Sync,
    /// On the engine's tasker thread. Replies are sent back through the
    /// platform thread.
    Worker,
}

pub struct MethodChannel {
    name: String,
    engine: RwLock<FlutterEngineWeakRef>,
    handler: Arc<Mutex<dyn MethodCallHandler + Send>>,
    codec: &'static dyn MethodCodec,
    mode: HandlerMode,
}

impl MethodChannel {
    pub fn new<N, H>(name: N, handler: H, codec: &'static dyn MethodCodec) -> Self
    where
        N: Into<String>,
        H: MethodCallHandler + Send + 'static,
    {
        Self {
            name: name.into(),
            engine: Default::default(),
            handler: Arc::new(Mutex::new(handler)),
            codec,
            mode: HandlerMode::Sync,
        }
    }

    pub fn with_mode(mut self, mode: HandlerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> HandlerMode {
        self.mode
    }

    pub fn codec(&self) -> &'static dyn MethodCodec {
        self.codec
    }

    /// Calls `method` on the framework side without waiting for the result.
    pub fn invoke_method<T: Serialize>(&self, method: &str, args: T) {
        let buf = match self.encode_method_call(method, args) {
            Ok(buf) => buf,
            Err(err) => {
                error!("Failed to encode call {} on {}: {}", method, self.name, err);
                return;
            }
        };
        self.send_buffer(buf);
    }

    /// Calls `method` on the framework side; `callback` receives the decoded
    /// reply. The callback runs on the platform thread unless the call failed
    /// before reaching the engine.
    pub fn invoke_method_with_reply<T, F>(&self, method: &str, args: T, callback: F)
    where
        T: Serialize,
        F: FnOnce(Result<Value, InvokeError>) + Send + 'static,
    {
        let buf = match self.encode_method_call(method, args) {
            Ok(buf) => buf,
            Err(err) => return callback(Err(InvokeError::Encode(err))),
        };
        let Some(engine) = self.engine() else {
            return callback(Err(InvokeError::Disconnected));
        };

        let name = self.name.clone();
        let codec = self.codec;
        engine.send_message(
            self.name.clone(),
            buf,
            Some(Box::new(move |reply| {
                callback(decode_reply(&name, codec, reply))
            })),
        );
    }

    /// Calls `method` and blocks until the framework answers.
    ///
    /// Must not be called on the platform thread, which is the thread that
    /// delivers the answer.
    pub fn invoke_method_blocking<T: Serialize>(
        &self,
        method: &str,
        args: T,
    ) -> Result<Value, InvokeError> {
        let engine = self.engine().ok_or(InvokeError::Disconnected)?;
        if engine.is_platform_thread() {
            return Err(InvokeError::PlatformThread);
        }
        drop(engine);

        let (tx, rx) = bounded(1);
        self.invoke_method_with_reply(method, args, move |reply| {
            tx.send(reply).ok();
        });
        rx.recv().map_err(|_| InvokeError::Disconnected)?
    }

    fn encode_method_call<T: Serialize>(
        &self,
        method: &str,
        args: T,
    ) -> Result<Vec<u8>, MessageError> {
        let args = to_value(args)?;
        self.codec
            .encode_method_call(&MethodCallData::new(method, args))
    }

    fn dispatch(&self, call: MethodCall) {
        let handler = self.handler.clone();
        match (self.mode, self.engine()) {
            (HandlerMode::Worker, Some(engine)) => {
                engine.run_on_tasker(move || dispatch_method_call(&handler, call));
            }
            _ => dispatch_method_call(&handler, call),
        }
    }
}

impl Channel for MethodChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn engine(&self) -> Option<FlutterEngine> {
        self.engine.read().upgrade()
    }

    fn init(&self, engine: FlutterEngineWeakRef) {
        *self.engine.write() = engine;
    }

    fn handle_platform_message(&self, mut msg: PlatformMessage) {
        let call = match self.codec.decode_method_call(&msg.message) {
            Ok(call) => call,
            Err(err) => {
                error!("Failed to decode method call on {}: {}", self.name, err);
                msg.respond(Vec::new());
                return;
            }
        };
        debug!("method call {} on {}", call.method, self.name);
        let call = MethodCall::new(
            self.name.clone(),
            call,
            self.codec,
            msg.response_handle.take(),
        );
        self.dispatch(call);
    }
}

/// Runs the handler, turning a panic into a logged error. The unanswered call
/// is dropped during unwinding, which sends an empty reply.
fn dispatch_method_call(handler: &Arc<Mutex<dyn MethodCallHandler + Send>>, call: MethodCall) {
    let channel = call.channel().to_owned();
    let method = call.method().clone();
    let result = catch_unwind(AssertUnwindSafe(|| handler.lock().on_method_call(call)));
    if result.is_err() {
        error!("Handler for {} on {} panicked", method, channel);
    }
}

pub(crate) fn decode_reply(
    channel: &str,
    codec: &dyn MethodCodec,
    reply: Result<Vec<u8>, InvokeError>,
) -> Result<Value, InvokeError> {
    let buf = reply?;
    if buf.is_empty() {
        warn!("No handler for method call on {}", channel);
        return Err(InvokeError::NoHandler(channel.to_owned()));
    }
    Ok(codec.decode_envelope(&buf)??)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JSON_CODEC, STANDARD_CODEC};
    use crate::error::{FlutterEngineError, MethodCallError};

    #[test]
    fn empty_reply_means_no_handler() {
        let reply = decode_reply("flutter/test", &STANDARD_CODEC, Ok(Vec::new()));
        assert!(matches!(reply, Err(InvokeError::NoHandler(channel)) if channel == "flutter/test"));
    }

    #[test]
    fn success_and_error_envelopes() {
        let buf = JSON_CODEC.encode_success_envelope(&Value::I32(3)).unwrap();
        assert_eq!(
            decode_reply("flutter/test", &JSON_CODEC, Ok(buf)).unwrap(),
            Value::I32(3)
        );

        let buf = STANDARD_CODEC
            .encode_error_envelope("bad", Some("went wrong"), &Value::Null)
            .unwrap();
        match decode_reply("flutter/test", &STANDARD_CODEC, Ok(buf)) {
            Err(InvokeError::Method(err)) => {
                assert_eq!(err, MethodCallError::new("bad", "went wrong", Value::Null))
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn transport_failure_passes_through() {
        let reply = decode_reply(
            "flutter/test",
            &STANDARD_CODEC,
            Err(InvokeError::Transport(FlutterEngineError::InvalidArguments)),
        );
        assert!(matches!(reply, Err(InvokeError::Transport(_))));
    }

    #[test]
    fn garbage_reply_is_a_decode_error() {
        let reply = decode_reply("flutter/test", &STANDARD_CODEC, Ok(vec![7]));
        assert!(matches!(reply, Err(InvokeError::Decode(_))));
    }
}
