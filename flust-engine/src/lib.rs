pub mod binding;
pub mod builder;
pub mod channel;
pub mod codec;
pub mod error;
pub mod ffi;
mod flutter_callbacks;
pub mod plugins;
pub mod tasks;

pub use crate::flutter_callbacks::FlutterEngineCallbacks;

use std::io;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{error, trace, warn};

use crate::binding::{FlutterEngineBinding, PlatformMessageReply};
use crate::builder::FlutterEngineBuilder;
use crate::channel::platform_message::PlatformMessage;
use crate::channel::{Channel, ChannelRegistry, ReplyCallback};
use crate::error::{FlutterEngineError, InvokeError};
use crate::ffi::{
    FlutterPointerEvent, FlutterProjectArgs, FlutterResponseHandle, FlutterWindowMetricsEvent,
};
use crate::tasks::{TaskRunner, Tasker};

pub(crate) type MainThreadEngineFn = Box<dyn FnOnce(&FlutterEngine) + Send>;

struct FlutterEngineInner {
    binding: Arc<dyn FlutterEngineBinding>,
    channel_registry: RwLock<ChannelRegistry>,
    platform_runner: TaskRunner,
    platform_receiver: Receiver<MainThreadEngineFn>,
    platform_sender: Sender<MainThreadEngineFn>,
    tasker: Tasker,
    project_args: FlutterProjectArgs,
}

#[derive(Clone, Default)]
pub struct FlutterEngineWeakRef {
    inner: Weak<FlutterEngineInner>,
}

impl FlutterEngineWeakRef {
    pub fn upgrade(&self) -> Option<FlutterEngine> {
        self.inner.upgrade().map(|arc| FlutterEngine { inner: arc })
    }

    pub fn is_valid(&self) -> bool {
        self.upgrade().is_some()
    }

    pub fn ptr_equal(&self, other: Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

/// Handle to a running engine. Clones share the same engine.
#[derive(Clone)]
pub struct FlutterEngine {
    inner: Arc<FlutterEngineInner>,
}

impl FlutterEngine {
    pub(crate) fn new(builder: FlutterEngineBuilder) -> Result<Self, CreateError> {
        let binding = builder.binding.ok_or(CreateError::NoBinding)?;
        let platform_handler = builder.platform_handler.ok_or(CreateError::NoHandler)?;

        let (main_tx, main_rx) = unbounded();

        let engine = Self {
            inner: Arc::new(FlutterEngineInner {
                binding,
                channel_registry: RwLock::new(ChannelRegistry::new()),
                platform_runner: TaskRunner::new(platform_handler),
                platform_receiver: main_rx,
                platform_sender: main_tx,
                tasker: Tasker::new()?,
                project_args: builder.project_args,
            }),
        };

        engine
            .inner
            .channel_registry
            .write()
            .init(engine.downgrade());

        Ok(engine)
    }

    pub fn register_channel<C>(&self, channel: C) -> Weak<C>
    where
        C: Channel + 'static,
    {
        trace!("register channel: {}", channel.name());
        self.inner
            .channel_registry
            .write()
            .register_channel(channel)
    }

    pub fn remove_channel(&self, channel_name: &str) -> Option<Arc<dyn Channel>> {
        trace!("remove channel: {}", channel_name);
        self.inner
            .channel_registry
            .write()
            .remove_channel(channel_name)
    }

    pub fn with_channel<F>(&self, channel_name: &str, f: F)
    where
        F: FnOnce(&dyn Channel),
    {
        let channel = self.inner.channel_registry.read().channel(channel_name);
        if let Some(channel) = channel {
            f(&*channel);
        }
    }

    pub fn downgrade(&self) -> FlutterEngineWeakRef {
        FlutterEngineWeakRef {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn assets(&self) -> &Path {
        &self.inner.project_args.assets_path
    }

    pub fn icu_data(&self) -> &Path {
        &self.inner.project_args.icu_data_path
    }

    pub fn arguments(&self) -> &Vec<String> {
        &self.inner.project_args.command_line_args
    }

    pub fn project_args(&self) -> &FlutterProjectArgs {
        &self.inner.project_args
    }

    pub fn run(&self) -> Result<(), RunError> {
        if !self.is_platform_thread() {
            return Err(RunError::NotPlatformThread);
        }

        let callbacks = FlutterEngineCallbacks::new(
            self.downgrade(),
            self.inner.platform_runner.clone(),
        );
        self.inner
            .binding
            .run(&self.inner.project_args, callbacks)?;
        Ok(())
    }

    pub fn shutdown(&self) {
        trace!("shutdown");
        self.run_on_platform_thread(|engine| engine.inner.binding.shutdown());
    }

    /// Current time on the engine clock, in nanoseconds.
    pub fn current_time(&self) -> u64 {
        self.inner.binding.current_time()
    }

    #[inline]
    pub fn is_platform_thread(&self) -> bool {
        self.inner.platform_runner.runs_task_on_current_thread()
    }

    fn post_platform_callback(&self, callback: MainThreadEngineFn) {
        trace!("post_platform_callback");
        if self.inner.platform_sender.send(callback).is_err() {
            error!("Platform callback queue is closed");
            return;
        }
        self.inner.platform_runner.wake();
    }

    /// Runs `f` on the platform thread: immediately when already there,
    /// otherwise on the next pass of the event loop.
    pub fn run_on_platform_thread<F>(&self, f: F)
    where
        F: FnOnce(&FlutterEngine) + 'static + Send,
    {
        trace!("run_on_platform_thread");
        if self.is_platform_thread() {
            f(self);
        } else {
            self.post_platform_callback(Box::new(f));
        }
    }

    /// Runs `f` on the platform thread and waits for its result. Returns
    /// `None` when the platform thread dropped the callback without running it.
    pub fn run_on_platform_thread_blocking<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&FlutterEngine) -> R + 'static + Send,
        R: Send + 'static,
    {
        if self.is_platform_thread() {
            return Some(f(self));
        }

        let (tx, rx) = bounded(1);
        self.post_platform_callback(Box::new(move |engine| {
            tx.send(f(engine)).ok();
        }));
        rx.recv().ok()
    }

    /// Runs `f` on the tasker thread, away from the event loop.
    pub fn run_on_tasker<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.tasker.spawn(f);
    }

    /// Runs due engine tasks and queued platform callbacks. Returns when the
    /// next engine task is due.
    pub fn execute_platform_tasks(&self) -> Option<Instant> {
        assert!(self.is_platform_thread(), "Not on platform thread");

        let binding = &self.inner.binding;
        self.inner
            .platform_runner
            .execute_tasks(|task| binding.run_task(task));

        let callbacks: Vec<MainThreadEngineFn> = self.inner.platform_receiver.try_iter().collect();
        for cb in callbacks {
            cb(self);
        }

        // Callbacks may have posted new tasks.
        self.inner.platform_runner.next_deadline()
    }

    pub fn send_window_metrics_event(&self, event: FlutterWindowMetricsEvent) {
        trace!("send_window_metrics_event");
        self.run_on_platform_thread(move |engine| {
            engine.inner.binding.send_window_metrics_event(event)
        });
    }

    pub fn send_pointer_event(&self, event: FlutterPointerEvent) {
        self.run_on_platform_thread(move |engine| engine.inner.binding.send_pointer_event(event));
    }

    /// Sends `message` on `channel`. `reply` receives the framework's answer,
    /// or the transport error when the message could not be sent.
    pub(crate) fn send_message(
        &self,
        channel: String,
        message: Vec<u8>,
        reply: Option<ReplyCallback>,
    ) {
        self.run_on_platform_thread(move |engine| {
            engine.send_platform_message(&channel, &message, reply)
        });
    }

    fn send_platform_message(&self, channel: &str, message: &[u8], reply: Option<ReplyCallback>) {
        trace!("Sending message on channel {}", channel);
        let binding = &self.inner.binding;
        let Some(reply) = reply else {
            if let Err(err) = binding.send_platform_message(channel, message, None) {
                error!("Failed to send message on {}: {}", channel, err);
            }
            return;
        };

        // Whichever side finishes first, engine answer or send failure, gets
        // to call `reply`.
        let slot = Arc::new(Mutex::new(Some(reply)));
        let engine_slot = slot.clone();
        let on_reply: PlatformMessageReply = Box::new(move |data: &[u8]| {
            let reply = engine_slot.lock().take();
            if let Some(reply) = reply {
                reply(Ok(data.to_vec()));
            }
        });

        if let Err(err) = binding.send_platform_message(channel, message, Some(on_reply)) {
            error!("Failed to send message on {}: {}", channel, err);
            let reply = slot.lock().take();
            if let Some(reply) = reply {
                reply(Err(InvokeError::Transport(err)));
            }
        }
    }

    pub(crate) fn send_platform_message_response(
        &self,
        response_handle: FlutterResponseHandle,
        bytes: &[u8],
    ) {
        trace!("Sending message response");
        self.inner
            .binding
            .send_platform_message_response(response_handle, bytes);
    }

    pub(crate) fn handle_platform_message(&self, mut message: PlatformMessage) {
        trace!("Received message on channel {}", message.channel);
        let channel = self.inner.channel_registry.read().channel(&message.channel);
        match channel {
            Some(channel) => channel.handle_platform_message(message),
            None => {
                warn!("No channel registered for {}", message.channel);
                message.respond(Vec::new());
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum CreateError {
    #[error("No platform handler set")]
    NoHandler,

    #[error("No engine binding set")]
    NoBinding,

    #[error("Failed to start tasker thread: {0}")]
    Tasker(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Engine must be started on the platform thread")]
    NotPlatformThread,

    #[error(transparent)]
    Engine(#[from] FlutterEngineError),
}
