//! Named channels carrying platform messages between the embedder and the
//! framework.

mod event_channel;
mod message_channel;
mod method_call;
mod method_channel;
pub mod platform_message;
mod registry;

pub use self::event_channel::{EventChannel, EventHandler, EventSink};
pub use self::message_channel::{Message, MessageChannel, MessageHandler};
pub use self::method_call::MethodCall;
pub use self::method_channel::{HandlerMode, MethodCallHandler, MethodChannel};
pub use self::registry::ChannelRegistry;

use crate::channel::platform_message::PlatformMessage;
use crate::error::InvokeError;
use crate::{FlutterEngine, FlutterEngineWeakRef};

/// Callback receiving the raw answer to a message sent to the framework.
pub(crate) type ReplyCallback = Box<dyn FnOnce(Result<Vec<u8>, InvokeError>) + Send>;

pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    fn engine(&self) -> Option<FlutterEngine>;

    /// Called by the registry when the channel is registered.
    fn init(&self, engine: FlutterEngineWeakRef);

    /// Handles a message addressed to this channel. Called on the platform
    /// thread, without any registry lock held.
    fn handle_platform_message(&self, msg: PlatformMessage);

    /// Sends raw bytes to the framework side of this channel.
    fn send_buffer(&self, buf: Vec<u8>) {
        match self.engine() {
            Some(engine) => engine.send_message(self.name().to_owned(), buf, None),
            None => tracing::warn!("Cannot send on channel {}: engine is gone", self.name()),
        }
    }
}
