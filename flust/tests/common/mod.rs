#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use flust::handler::MemoryClipboard;
use flust::{Application, ApplicationBuilder};
use flust_engine::binding::{FlutterEngineBinding, PlatformMessageReply};
use flust_engine::codec::{MethodCallData, MethodCodec, JSON_CODEC};
use flust_engine::error::FlutterEngineError;
use flust_engine::ffi::{
    FlutterPointerEvent, FlutterProjectArgs, FlutterResponseHandle, FlutterTask,
    FlutterWindowMetricsEvent,
};
use flust_engine::FlutterEngineCallbacks;
use parking_lot::Mutex;

/// Engine double that records what the embedder sends it.
pub struct FakeEngine {
    pub epoch: Instant,
    pub callbacks: Mutex<Option<FlutterEngineCallbacks>>,
    pub args: Mutex<Option<FlutterProjectArgs>>,
    pub running: AtomicBool,
    pub messages: Mutex<Vec<(String, Vec<u8>)>>,
    pub responses: Mutex<Vec<(FlutterResponseHandle, Vec<u8>)>>,
    pub tasks: Mutex<Vec<FlutterTask>>,
    pub metrics: Mutex<Vec<FlutterWindowMetricsEvent>>,
    pub pointers: Mutex<Vec<FlutterPointerEvent>>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
            callbacks: Default::default(),
            args: Default::default(),
            running: Default::default(),
            messages: Default::default(),
            responses: Default::default(),
            tasks: Default::default(),
            metrics: Default::default(),
            pointers: Default::default(),
        }
    }
}

impl FakeEngine {
    pub fn callbacks(&self) -> FlutterEngineCallbacks {
        self.callbacks.lock().clone().expect("engine not running")
    }

    /// Delivers a JSON method call from the framework.
    pub fn call_json(&self, channel: &str, method: &str, args: serde_json::Value) {
        let call = serde_json::json!({ "method": method, "args": args });
        let handle = FlutterResponseHandle(self.responses.lock().len() + 1);
        self.callbacks()
            .platform_message(channel, &serde_json::to_vec(&call).unwrap(), Some(handle));
    }

    pub fn messages_on(&self, channel: &str) -> Vec<Vec<u8>> {
        self.messages
            .lock()
            .iter()
            .filter(|(name, _)| name == channel)
            .map(|(_, data)| data.clone())
            .collect()
    }

    pub fn json_calls_on(&self, channel: &str) -> Vec<MethodCallData> {
        self.messages_on(channel)
            .iter()
            .map(|data| JSON_CODEC.decode_method_call(data).unwrap())
            .collect()
    }

    pub fn lifecycle(&self) -> Vec<String> {
        self.messages_on(flust_plugins::lifecycle::CHANNEL_NAME)
            .into_iter()
            .map(|data| String::from_utf8(data).unwrap())
            .collect()
    }
}

impl FlutterEngineBinding for FakeEngine {
    fn run(
        &self,
        args: &FlutterProjectArgs,
        callbacks: FlutterEngineCallbacks,
    ) -> Result<(), FlutterEngineError> {
        *self.args.lock() = Some(args.clone());
        *self.callbacks.lock() = Some(callbacks);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn current_time(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
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
        self.messages
            .lock()
            .push((channel.to_owned(), message.to_vec()));
        if let Some(reply) = reply {
            reply(&[]);
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

pub fn builder(engine: &Arc<FakeEngine>) -> ApplicationBuilder {
    Application::builder()
        .with_binding(engine.clone())
        .with_clipboard(Box::new(MemoryClipboard::default()))
        .with_assets_path("/bundle/data/flutter_assets")
        .with_icu_data_path("/bundle/data/icudtl.dat")
        .with_aot_library_path("/bundle/lib/libapp.so")
        .with_locale("en-US")
}

/// A started application on the current thread.
pub fn started() -> (Application, Arc<FakeEngine>) {
    let engine = Arc::new(FakeEngine::default());
    let mut app = builder(&engine).build().unwrap();
    app.start().unwrap();
    (app, engine)
}
