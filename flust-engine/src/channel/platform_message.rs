use std::fmt;

use tracing::{trace, warn};

use crate::ffi::FlutterResponseHandle;
use crate::FlutterEngineWeakRef;

/// A message received from the framework.
#[derive(Debug)]
pub struct PlatformMessage {
    pub channel: String,
    pub message: Vec<u8>,
    pub response_handle: Option<PlatformMessageResponseHandle>,
}

impl PlatformMessage {
    pub fn new(
        channel: impl Into<String>,
        message: Vec<u8>,
        response_handle: Option<PlatformMessageResponseHandle>,
    ) -> Self {
        Self {
            channel: channel.into(),
            message,
            response_handle,
        }
    }

    /// Answers the message with `data`, if the sender waits for an answer.
    pub fn respond(&mut self, data: Vec<u8>) {
        if let Some(handle) = self.response_handle.take() {
            handle.send_response(data);
        }
    }
}

/// Pending answer to a [`PlatformMessage`].
///
/// The engine keeps state for every handle until it is answered, so a handle
/// dropped without an answer sends an empty response.
pub struct PlatformMessageResponseHandle {
    engine: FlutterEngineWeakRef,
    handle: Option<FlutterResponseHandle>,
}

impl PlatformMessageResponseHandle {
    pub(crate) fn new(engine: FlutterEngineWeakRef, handle: FlutterResponseHandle) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    pub fn send_response(mut self, data: Vec<u8>) {
        self.respond(data);
    }

    fn respond(&mut self, data: Vec<u8>) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let Some(engine) = self.engine.upgrade() else {
            warn!("Cannot answer message {:?}: engine is gone", handle);
            return;
        };
        trace!("responding to {:?} with {} bytes", handle, data.len());
        engine.run_on_platform_thread(move |engine| {
            engine.send_platform_message_response(handle, &data);
        });
    }
}

impl fmt::Debug for PlatformMessageResponseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformMessageResponseHandle")
            .field("handle", &self.handle)
            .finish()
    }
}

impl Drop for PlatformMessageResponseHandle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            trace!("response handle dropped unanswered");
            self.respond(Vec::new());
        }
    }
}
