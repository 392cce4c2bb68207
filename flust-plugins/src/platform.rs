//! Clipboard, window title and application exit requests.
//! It handles flutter/platform type message.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use flust_engine::{
    channel::{MethodCall, MethodCallHandler, MethodChannel},
    codec::{Value, JSON_CODEC},
    plugins::Plugin,
    FlutterEngine,
};

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/platform";

pub const TEXT_PLAIN: &str = "text/plain";

#[derive(Debug)]
pub struct MimeError;

impl std::fmt::Display for MimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Unsupported clipboard format")
    }
}

impl std::error::Error for MimeError {}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSwitcherDescription {
    pub label: String,
    #[serde(default)]
    pub primary_color: i64,
}

pub trait PlatformHandler {
    fn set_application_switcher_description(&mut self, description: AppSwitcherDescription);

    fn set_clipboard_data(&mut self, text: String);

    fn get_clipboard_data(&mut self, mime: &str) -> Result<String, MimeError>;

    /// `SystemNavigator.pop`: the application asked to exit.
    fn pop(&mut self) {}
}

pub struct PlatformPlugin {
    channel: Weak<MethodChannel>,
    handler: Arc<Mutex<dyn PlatformHandler + Send>>,
}

impl PlatformPlugin {
    pub fn new(handler: Arc<Mutex<dyn PlatformHandler + Send>>) -> Self {
        Self {
            channel: Weak::new(),
            handler,
        }
    }
}

impl Plugin for PlatformPlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        self.channel = engine.register_channel(MethodChannel::new(
            CHANNEL_NAME,
            Handler {
                handler: self.handler.clone(),
            },
            &JSON_CODEC,
        ));
    }
}

struct Handler {
    handler: Arc<Mutex<dyn PlatformHandler + Send>>,
}

#[derive(Deserialize)]
struct ClipboardData {
    text: String,
}

impl MethodCallHandler for Handler {
    fn on_method_call(&mut self, call: MethodCall) {
        debug!(
            "got method call {} with args {:?}",
            call.method(),
            call.raw_args()
        );
        match call.method().as_str() {
            "SystemChrome.setApplicationSwitcherDescription" => {
                match call.args::<AppSwitcherDescription>() {
                    Ok(description) => {
                        self.handler
                            .lock()
                            .set_application_switcher_description(description);
                        call.success_empty()
                    }
                    Err(err) => call.error("invalid-args", err.to_string(), Value::Null),
                }
            }
            "Clipboard.setData" => match call.args::<ClipboardData>() {
                Ok(data) => {
                    self.handler.lock().set_clipboard_data(data.text);
                    call.success_empty()
                }
                Err(err) => call.error("invalid-args", err.to_string(), Value::Null),
            },
            "Clipboard.getData" => {
                let mime = call.raw_args().as_str().unwrap_or(TEXT_PLAIN).to_owned();
                match self.handler.lock().get_clipboard_data(&mime) {
                    Ok(text) => call.success(json!({ "text": text })),
                    Err(err) => {
                        warn!("clipboard request for {}: {}", mime, err);
                        call.error("unknown-data", err.to_string(), Value::Null)
                    }
                }
            }
            "Clipboard.hasStrings" => {
                let has_strings = self
                    .handler
                    .lock()
                    .get_clipboard_data(TEXT_PLAIN)
                    .map(|text| !text.is_empty())
                    .unwrap_or(false);
                call.success(json!({ "value": has_strings }))
            }
            "SystemNavigator.pop" => {
                self.handler.lock().pop();
                call.success_empty()
            }
            "HapticFeedback.vibrate" | "SystemSound.play" => call.success_empty(),
            _ => call.not_implemented(),
        }
    }
}
