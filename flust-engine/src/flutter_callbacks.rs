use tracing::{trace, warn};

use crate::channel::platform_message::{PlatformMessage, PlatformMessageResponseHandle};
use crate::ffi::{FlutterResponseHandle, FlutterTask};
use crate::tasks::TaskRunner;
use crate::FlutterEngineWeakRef;

/// Entry points the engine uses to reach the embedder.
///
/// A [`FlutterEngineBinding`](crate::binding::FlutterEngineBinding) receives
/// one of these from [`FlutterEngine::run`](crate::FlutterEngine::run) and
/// forwards the engine's callbacks to it. Cloning is cheap and the value may be
/// moved to any engine thread.
#[derive(Clone)]
pub struct FlutterEngineCallbacks {
    engine: FlutterEngineWeakRef,
    platform_runner: TaskRunner,
}

impl FlutterEngineCallbacks {
    pub(crate) fn new(engine: FlutterEngineWeakRef, platform_runner: TaskRunner) -> Self {
        Self {
            engine,
            platform_runner,
        }
    }

    /// A message from the framework arrived on `channel`. Called on the
    /// platform thread.
    pub fn platform_message(
        &self,
        channel: &str,
        data: &[u8],
        response_handle: Option<FlutterResponseHandle>,
    ) {
        trace!("platform_message_callback");
        let Some(engine) = self.engine.upgrade() else {
            warn!("Dropping message on channel {}: engine is gone", channel);
            return;
        };

        let response_handle = response_handle
            .map(|handle| PlatformMessageResponseHandle::new(self.engine.clone(), handle));
        engine.handle_platform_message(PlatformMessage::new(channel, data.to_vec(), response_handle));
    }

    pub fn runs_task_on_current_thread(&self) -> bool {
        trace!("runs_task_on_current_thread");
        self.platform_runner.runs_task_on_current_thread()
    }

    /// The engine wants `task` run on the platform thread at
    /// `target_time_nanos` on its own clock.
    pub fn post_task(&self, task: FlutterTask, target_time_nanos: u64) {
        trace!("post_task");
        let Some(engine) = self.engine.upgrade() else {
            trace!("engine is gone, dropping task {:?}", task);
            return;
        };
        self.platform_runner
            .post_task(task, target_time_nanos, engine.current_time());
    }

    pub fn root_isolate_created(&self) {
        trace!("root_isolate_create_callback");
    }
}
