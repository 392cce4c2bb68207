//! The seam between the embedder and the wrapped engine library.

use crate::error::FlutterEngineError;
use crate::ffi::{
    FlutterPointerEvent, FlutterProjectArgs, FlutterResponseHandle, FlutterTask,
    FlutterWindowMetricsEvent,
};
use crate::flutter_callbacks::FlutterEngineCallbacks;

/// Invoked by the engine with the response payload of a host to engine
/// message. An empty payload means no handler exists on the framework side.
pub type PlatformMessageReply = Box<dyn FnOnce(&[u8]) + Send>;

/// Operations the embedder needs from the engine library.
///
/// The native engine is an external collaborator; an implementation of this
/// trait owns the actual engine instance and translates these calls into the
/// library's API. Engine to host traffic flows through the
/// [`FlutterEngineCallbacks`] handed to [`run`](Self::run).
///
/// Every method except [`current_time`](Self::current_time) is only called on
/// the platform thread.
pub trait FlutterEngineBinding: Send + Sync {
    /// Starts the engine. `callbacks` stays valid for the engine's lifetime.
    fn run(
        &self,
        args: &FlutterProjectArgs,
        callbacks: FlutterEngineCallbacks,
    ) -> Result<(), FlutterEngineError>;

    fn shutdown(&self);

    /// Current time on the engine clock, in nanoseconds.
    fn current_time(&self) -> u64;

    fn run_task(&self, task: &FlutterTask);

    fn send_platform_message(
        &self,
        channel: &str,
        message: &[u8],
        reply: Option<PlatformMessageReply>,
    ) -> Result<(), FlutterEngineError>;

    fn send_platform_message_response(&self, handle: FlutterResponseHandle, message: &[u8]);

    fn send_window_metrics_event(&self, event: FlutterWindowMetricsEvent);

    fn send_pointer_event(&self, event: FlutterPointerEvent);
}
