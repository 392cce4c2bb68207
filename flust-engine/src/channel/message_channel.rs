use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{error, trace};

use super::platform_message::{PlatformMessage, PlatformMessageResponseHandle};
use super::Channel;
use crate::codec::value::to_value;
use crate::codec::{MessageCodec, Value};
use crate::error::{InvokeError, MessageError};
use crate::{FlutterEngine, FlutterEngineWeakRef};

pub trait MessageHandler {
    fn on_message(&mut self, msg: Message);
}

/// A decoded message from the framework, answerable once.
pub struct Message {
    channel: String,
    value: Value,
    codec: &'static dyn MessageCodec,
    response_handle: Option<PlatformMessageResponseHandle>,
}

impl Message {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn respond<T: Serialize>(mut self, value: T) {
        let Some(handle) = self.response_handle.take() else {
            return;
        };
        let buf = to_value(value)
            .map_err(MessageError::from)
            .and_then(|value| self.codec.encode_message(&value));
        match buf {
            Ok(buf) => handle.send_response(buf),
            Err(err) => {
                error!("Failed to encode reply on {}: {}", self.channel, err);
                handle.send_response(Vec::new());
            }
        }
    }
}

/// Channel exchanging plain messages, without method call semantics.
pub struct MessageChannel {
    name: String,
    engine: RwLock<FlutterEngineWeakRef>,
    handler: Arc<Mutex<dyn MessageHandler + Send>>,
    codec: &'static dyn MessageCodec,
}

impl MessageChannel {
    pub fn new<N, H>(name: N, handler: H, codec: &'static dyn MessageCodec) -> Self
    where
        N: Into<String>,
        H: MessageHandler + Send + 'static,
    {
        Self {
            name: name.into(),
            engine: Default::default(),
            handler: Arc::new(Mutex::new(handler)),
            codec,
        }
    }

    pub fn send<T: Serialize>(&self, message: T) {
        match self.encode(message) {
            Ok(buf) => self.send_buffer(buf),
            Err(err) => error!("Failed to encode message on {}: {}", self.name, err),
        }
    }

    /// Sends `message`; `callback` receives the decoded answer.
    pub fn send_with_reply<T, F>(&self, message: T, callback: F)
    where
        T: Serialize,
        F: FnOnce(Result<Value, InvokeError>) + Send + 'static,
    {
        let buf = match self.encode(message) {
            Ok(buf) => buf,
            Err(err) => return callback(Err(InvokeError::Encode(err))),
        };
        let Some(engine) = self.engine() else {
            return callback(Err(InvokeError::Disconnected));
        };

        let codec = self.codec;
        engine.send_message(
            self.name.clone(),
            buf,
            Some(Box::new(move |reply| {
                callback(reply.and_then(|buf| Ok(codec.decode_message(&buf)?)))
            })),
        );
    }

    fn encode<T: Serialize>(&self, message: T) -> Result<Vec<u8>, MessageError> {
        let value = to_value(message)?;
        self.codec.encode_message(&value)
    }
}

impl Channel for MessageChannel {
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
        let value = match self.codec.decode_message(&msg.message) {
            Ok(value) => value,
            Err(err) => {
                error!("Failed to decode message on {}: {}", self.name, err);
                msg.respond(Vec::new());
                return;
            }
        };
        trace!("message on {}: {:?}", self.name, value);
        let message = Message {
            channel: self.name.clone(),
            value,
            codec: self.codec,
            response_handle: msg.response_handle.take(),
        };
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.handler.lock().on_message(message)
        }));
        if result.is_err() {
            error!("Message handler on {} panicked", self.name);
        }
    }
}
