#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flust_engine::binding::{FlutterEngineBinding, PlatformMessageReply};
use flust_engine::builder::FlutterEngineBuilder;
use flust_engine::error::FlutterEngineError;
use flust_engine::ffi::{
    FlutterPointerEvent, FlutterProjectArgs, FlutterResponseHandle, FlutterTask,
    FlutterWindowMetricsEvent,
};
use flust_engine::tasks::TaskRunnerHandler;
use flust_engine::{FlutterEngine, FlutterEngineCallbacks};
use parking_lot::Mutex;

/// In-memory engine recording everything the embedder sends to it.
#[derive(Default)]
pub struct RecordingBinding {
    pub callbacks: Mutex<Option<FlutterEngineCallbacks>>,
    pub now: AtomicU64,
    pub fail_sends: AtomicBool,
    pub running: AtomicBool,
    pub messages: Mutex<Vec<(String, Vec<u8>)>>,
    pub responses: Mutex<Vec<(FlutterResponseHandle, Vec<u8>)>>,
    pub tasks: Mutex<Vec<FlutterTask>>,
    pub metrics: Mutex<Vec<FlutterWindowMetricsEvent>>,
    pub pointers: Mutex<Vec<FlutterPointerEvent>>,
    /// Canned answers per channel, delivered as soon as a message expecting
    /// an answer is sent.
    pub answers: Mutex<HashMap<String, Vec<u8>>>,
    pub pending: Mutex<Vec<(String, PlatformMessageReply)>>,
}

impl RecordingBinding {
    pub fn callbacks(&self) -> FlutterEngineCallbacks {
        self.callbacks
            .lock()
            .clone()
            .expect("engine has not been started")
    }

    pub fn answer(&self, channel: &str, data: Vec<u8>) {
        self.answers.lock().insert(channel.to_owned(), data);
    }

    pub fn messages_on(&self, channel: &str) -> Vec<Vec<u8>> {
        self.messages
            .lock()
            .iter()
            .filter(|(name, _)| name == channel)
            .map(|(_, data)| data.clone())
            .collect()
    }

    pub fn response(&self, handle: usize) -> Option<Vec<u8>> {
        self.responses
            .lock()
            .iter()
            .find(|(h, _)| h.0 == handle)
            .map(|(_, data)| data.clone())
    }
}

impl FlutterEngineBinding for RecordingBinding {
    fn run(
        &self,
        _args: &FlutterProjectArgs,
        callbacks: FlutterEngineCallbacks,
    ) -> Result<(), FlutterEngineError> {
        *self.callbacks.lock() = Some(callbacks);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn current_time(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn run_task(&self, task: &FlutterTask) {
        self.tasks.lock().push(*task);
    }

    fn send_platform_message(
        &self,
        channel: &str,
        message: &[u8],
        reply: Option<PlatformMessageReply>,
    ) -> Result<(), FlutterEngineError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(FlutterEngineError::InvalidArguments);
        }
        self.messages
            .lock()
            .push((channel.to_owned(), message.to_vec()));

        if let Some(reply) = reply {
            let answer = self.answers.lock().get(channel).cloned();
            match answer {
                Some(answer) => reply(&answer),
                None => self.pending.lock().push((channel.to_owned(), reply)),
            }
        }
        Ok(())
    }

    fn send_platform_message_response(&self, handle: FlutterResponseHandle, message: &[u8]) {
        self.responses.lock().push((handle, message.to_vec()));
    }

    fn send_window_metrics_event(&self, event: FlutterWindowMetricsEvent) {
        self.metrics.lock().push(event);
    }

    fn send_pointer_event(&self, event: FlutterPointerEvent) {
        self.pointers.lock().push(event);
    }
}

#[derive(Default)]
pub struct CountingWaker(pub AtomicUsize);

impl TaskRunnerHandler for CountingWaker {
    fn wake(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn engine() -> (FlutterEngine, Arc<RecordingBinding>) {
    let binding = Arc::new(RecordingBinding::default());
    let engine = FlutterEngineBuilder::new()
        .with_binding(binding.clone())
        .with_platform_handler(Arc::new(CountingWaker::default()))
        .build()
        .unwrap();
    engine.run().unwrap();
    (engine, binding)
}

/// Pumps the platform thread until `done` holds or the timeout expires.
pub fn pump_until(engine: &FlutterEngine, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        engine.execute_platform_tasks();
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}
