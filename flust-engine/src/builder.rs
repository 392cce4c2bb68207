use std::path::PathBuf;
use std::sync::Arc;

use crate::binding::FlutterEngineBinding;
use crate::ffi::FlutterProjectArgs;
use crate::tasks::TaskRunnerHandler;
use crate::{CreateError, FlutterEngine};

pub struct FlutterEngineBuilder {
    pub(crate) binding: Option<Arc<dyn FlutterEngineBinding>>,
    pub(crate) platform_handler: Option<Arc<dyn TaskRunnerHandler + Send + Sync>>,
    pub(crate) project_args: FlutterProjectArgs,
}

impl FlutterEngineBuilder {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            binding: None,
            platform_handler: None,
            project_args: Default::default(),
        }
    }

    pub fn with_binding(mut self, binding: Arc<dyn FlutterEngineBinding>) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn with_platform_handler(
        mut self,
        handler: Arc<dyn TaskRunnerHandler + Send + Sync>,
    ) -> Self {
        self.platform_handler = Some(handler);
        self
    }

    pub fn with_asset_path(mut self, path: PathBuf) -> Self {
        self.project_args.assets_path = path;
        self
    }

    pub fn with_icu_data_path(mut self, path: PathBuf) -> Self {
        self.project_args.icu_data_path = path;
        self
    }

    pub fn with_aot_library_path(mut self, path: PathBuf) -> Self {
        self.project_args.aot_library_path = path;
        self
    }

    pub fn with_persistent_cache_path(mut self, path: PathBuf) -> Self {
        self.project_args.persistent_cache_path = path;
        self
    }

    pub fn with_arg(mut self, arg: String) -> Self {
        self.project_args.command_line_args.push(arg);
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        for arg in args.into_iter() {
            self.project_args.command_line_args.push(arg);
        }
        self
    }

    /// Creates the engine. The calling thread becomes the platform thread.
    pub fn build(self) -> Result<FlutterEngine, CreateError> {
        FlutterEngine::new(self)
    }
}
