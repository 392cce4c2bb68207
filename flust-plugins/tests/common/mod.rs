#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use flust_engine::binding::{FlutterEngineBinding, PlatformMessageReply};
use flust_engine::builder::FlutterEngineBuilder;
use flust_engine::codec::{MethodCallData, MethodCodec, JSON_CODEC};
use flust_engine::error::FlutterEngineError;
use flust_engine::ffi::{
    FlutterPointerEvent, FlutterProjectArgs, FlutterResponseHandle, FlutterTask,
    FlutterWindowMetricsEvent,
};
use flust_engine::tasks::TaskRunnerHandler;
use flust_engine::{FlutterEngine, FlutterEngineCallbacks};
use parking_lot::Mutex;

/// Stands in for the framework: records what plugins send and answers
/// messages from a script.
#[derive(Default)]
pub struct FakeFramework {
    pub callbacks: Mutex<Option<FlutterEngineCallbacks>>,
    pub messages: Mutex<Vec<(String, Vec<u8>)>>,
    pub responses: Mutex<Vec<(FlutterResponseHandle, Vec<u8>)>>,
    pub answers: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeFramework {
    /// Delivers `data` on `channel` and returns the plugin's answer.
    pub fn deliver(&self, channel: &str, data: &[u8]) -> Option<Vec<u8>> {
        let callbacks = self.callbacks.lock().clone().expect("engine not running");
        let handle = self.responses.lock().len() + 1;
        callbacks.platform_message(channel, data, Some(FlutterResponseHandle(handle)));
        self.responses
            .lock()
            .iter()
            .find(|(h, _)| h.0 == handle)
            .map(|(_, data)| data.clone())
    }

    pub fn call_json(&self, channel: &str, method: &str, args: serde_json::Value) -> Vec<u8> {
        let call = serde_json::json!({ "method": method, "args": args });
        self.deliver(channel, &serde_json::to_vec(&call).unwrap())
            .expect("no response")
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
}

impl FlutterEngineBinding for FakeFramework {
    fn run(
        &self,
        _args: &FlutterProjectArgs,
        callbacks: FlutterEngineCallbacks,
    ) -> Result<(), FlutterEngineError> {
        *self.callbacks.lock() = Some(callbacks);
        Ok(())
    }

    fn shutdown(&self) {}

    fn current_time(&self) -> u64 {
        0
    }

    fn run_task(&self, _task: &FlutterTask) {}

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
            let answer = self.answers.lock().get(channel).cloned().unwrap_or_default();
            reply(&answer);
        }
        Ok(())
    }

    fn send_platform_message_response(&self, handle: FlutterResponseHandle, message: &[u8]) {
        self.responses.lock().push((handle, message.to_vec()));
    }

    fn send_window_metrics_event(&self, _event: FlutterWindowMetricsEvent) {}

    fn send_pointer_event(&self, _event: FlutterPointerEvent) {}
}

struct NoopWaker;

impl TaskRunnerHandler for NoopWaker {
    fn wake(&self) {}
}

pub fn engine() -> (FlutterEngine, Arc<FakeFramework>) {
    let framework = Arc::new(FakeFramework::default());
    let engine = FlutterEngineBuilder::new()
        .with_binding(framework.clone())
        .with_platform_handler(Arc::new(NoopWaker))
        .build()
        .unwrap();
    engine.run().unwrap();
    (engine, framework)
}
