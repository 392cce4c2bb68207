use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;
use tracing::trace;

use crate::event::WindowEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    /// Posted when engine work became available; carries no payload.
    Wake,
    Window(WindowEvent),
    Exit,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("event loop is closed")]
pub struct EventLoopClosed;

/// Receiving end of the platform thread's event queue.
pub struct EventLoop {
    receiver: Receiver<LoopEvent>,
    proxy: EventLoopProxy,
}

/// Posts events to an [`EventLoop`] from any thread.
#[derive(Clone, Debug)]
pub struct EventLoopProxy {
    sender: Sender<LoopEvent>,
}

impl EventLoopProxy {
    pub fn send_event(&self, event: LoopEvent) -> Result<(), EventLoopClosed> {
        self.sender.send(event).map_err(|_| EventLoopClosed)
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            receiver,
            proxy: EventLoopProxy { sender },
        }
    }

    pub fn create_proxy(&self) -> EventLoopProxy {
        self.proxy.clone()
    }

    /// Blocks for at most `timeout` until an event arrives, then drains the
    /// queue. Returns the events in posting order; empty on timeout.
    pub fn poll(&self, timeout: Duration) -> Vec<LoopEvent> {
        let first = match self.receiver.recv_timeout(timeout) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => return Vec::new(),
            // The loop holds a sender itself, so this cannot happen.
            Err(RecvTimeoutError::Disconnected) => return vec![LoopEvent::Exit],
        };
        let mut events = vec![first];
        events.extend(self.receiver.try_iter());
        trace!("event loop woke with {} events", events.len());
        events
    }
}

/// How long the loop may sleep: the refresh interval, shortened to the next
/// engine deadline. Zero when a task is already due.
pub fn wait_timeout(
    next_deadline: Option<Instant>,
    refresh_interval: Duration,
    now: Instant,
) -> Duration {
    match next_deadline {
        Some(deadline) => deadline
            .saturating_duration_since(now)
            .min(refresh_interval),
        None => refresh_interval,
    }
}
