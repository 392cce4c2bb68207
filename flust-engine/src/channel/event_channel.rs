use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, trace};

use super::platform_message::PlatformMessage;
use super::{Channel, MethodCall};
use crate::codec::value::to_value;
use crate::codec::{MethodCodec, Value};
use crate::error::MethodCallError;
use crate::{FlutterEngine, FlutterEngineWeakRef};

pub trait EventHandler {
    /// The framework subscribed to the stream. Events go through `sink`,
    /// which may be moved to any thread.
    fn on_listen(&mut self, args: Value, sink: EventSink) -> Result<(), MethodCallError>;

    fn on_cancel(&mut self, args: Value) -> Result<(), MethodCallError>;
}

struct SinkState {
    ended: AtomicBool,
}

type ActiveSink = Arc<Mutex<Option<Arc<SinkState>>>>;

/// Stream of events from the framework's point of view, driven by `listen`
/// and `cancel` method calls.
pub struct EventChannel {
    name: String,
    engine: RwLock<FlutterEngineWeakRef>,
    handler: Arc<Mutex<dyn EventHandler + Send>>,
    codec: &'static dyn MethodCodec,
    active: ActiveSink,
}

impl EventChannel {
    pub fn new<N, H>(name: N, handler: H, codec: &'static dyn MethodCodec) -> Self
    where
        N: Into<String>,
        H: EventHandler + Send + 'static,
    {
        Self {
            name: name.into(),
            engine: Default::default(),
            handler: Arc::new(Mutex::new(handler)),
            codec,
            active: Default::default(),
        }
    }

    pub fn has_listener(&self) -> bool {
        self.active.lock().is_some()
    }

    fn listen(&self, call: MethodCall) {
        let state = Arc::new(SinkState {
            ended: AtomicBool::new(false),
        });
        let previous = self.active.lock().replace(state.clone());
        let sink = EventSink {
            channel: self.name.clone(),
            engine: self.engine.read().clone(),
            codec: self.codec,
            active: self.active.clone(),
            state,
        };

        let args = call.raw_args().clone();
        let name = self.name.clone();
        self.run_handler(move |handler| {
            if previous.is_some() {
                if let Err(err) = handler.on_cancel(Value::Null) {
                    error!("Failed to cancel previous stream on {}: {}", name, err);
                }
            }
            if let Err(err) = handler.on_listen(args, sink) {
                error!("Failed to listen on {}: {}", name, err);
            }
        });
        call.success_empty();
    }

    fn cancel(&self, call: MethodCall) {
        if self.active.lock().take().is_none() {
            return call.error("error", "No active stream to cancel", Value::Null);
        }

        let args = call.raw_args().clone();
        let name = self.name.clone();
        self.run_handler(move |handler| {
            if let Err(err) = handler.on_cancel(args) {
                error!("Failed to cancel stream on {}: {}", name, err);
            }
        });
        call.success_empty();
    }

    fn run_handler<F>(&self, f: F)
    where
        F: FnOnce(&mut (dyn EventHandler + Send)) + Send + 'static,
    {
        let handler = self.handler.clone();
        let job = move || f(&mut *handler.lock());
        match self.engine() {
            Some(engine) => engine.run_on_tasker(job),
            None => job(),
        }
    }
}

impl Channel for EventChannel {
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
        debug!("event channel call {} on {}", call.method, self.name);
        let call = MethodCall::new(
            self.name.clone(),
            call,
            self.codec,
            msg.response_handle.take(),
        );
        match call.method().as_str() {
            "listen" => self.listen(call),
            "cancel" => self.cancel(call),
            _ => call.not_implemented(),
        }
    }
}

/// Sending side of an event stream.
///
/// A sink stops delivering once it ended its stream or once another `listen`
/// replaced it; further calls are silently ignored.
#[derive(Clone)]
pub struct EventSink {
    channel: String,
    engine: FlutterEngineWeakRef,
    codec: &'static dyn MethodCodec,
    active: ActiveSink,
    state: Arc<SinkState>,
}

impl EventSink {
    pub fn is_active(&self) -> bool {
        if self.state.ended.load(Ordering::SeqCst) {
            return false;
        }
        match &*self.active.lock() {
            Some(active) => Arc::ptr_eq(active, &self.state),
            None => false,
        }
    }

    pub fn success<T: Serialize>(&self, event: T) {
        if !self.is_active() {
            trace!("dropping event on inactive sink of {}", self.channel);
            return;
        }
        let buf = to_value(event)
            .map_err(Into::into)
            .and_then(|event| self.codec.encode_success_envelope(&event));
        match buf {
            Ok(buf) => self.send(buf),
            Err(err) => error!("Failed to encode event on {}: {}", self.channel, err),
        }
    }

    pub fn error<D: Serialize>(&self, code: &str, message: &str, details: D) {
        if !self.is_active() {
            trace!("dropping error on inactive sink of {}", self.channel);
            return;
        }
        let buf = to_value(details)
            .map_err(Into::into)
            .and_then(|details| {
                self.codec
                    .encode_error_envelope(code, Some(message), &details)
            });
        match buf {
            Ok(buf) => self.send(buf),
            Err(err) => error!("Failed to encode error on {}: {}", self.channel, err),
        }
    }

    /// Ends the stream. The framework sees an empty message.
    pub fn end_of_stream(&self) {
        if !self.is_active() {
            return;
        }
        self.state.ended.store(true, Ordering::SeqCst);
        self.send(Vec::new());
    }

    fn send(&self, buf: Vec<u8>) {
        match self.engine.upgrade() {
            Some(engine) => engine.send_message(self.channel.clone(), buf, None),
            None => trace!("engine is gone, dropping event on {}", self.channel),
        }
    }
}
