//! A plugin to handle mouse cursor.
//! It handles flutter/mousecursor type message.
use std::{str::FromStr, sync::Arc};

use parking_lot::Mutex;
use strum::EnumString;
use tracing::{debug, warn};

use flust_engine::{
    channel::{MethodCall, MethodCallHandler, MethodChannel},
    codec::{Value, STANDARD_CODEC},
    plugins::Plugin,
    FlutterEngine,
};

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/mousecursor";

/// Cursor kinds named by the framework's `SystemMouseCursors` constants.
/// The camelCase variant name is the `kind` sent over the channel.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum::Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum SystemMouseCursor {
    Alias,
    AllScroll,
    Basic,
    Cell,
    Click,
    ContextMenu,
    Copy,
    Disappearing,
    Forbidden,
    Grab,
    Grabbing,
    Help,
    Move,
    NoDrop,
    /// Hidden cursor.
    None,
    Precise,
    /// Busy, but still accepts input.
    Progress,

    // Edge and corner resizing.
    ResizeColumn,
    ResizeDown,
    ResizeDownLeft,
    ResizeDownRight,
    ResizeLeft,
    ResizeLeftRight,
    ResizeRight,
    ResizeRow,
    ResizeUp,
    ResizeUpDown,
    ResizeUpLeft,
    ResizeUpLeftDownRight,
    ResizeUpRight,
    ResizeUpRightDownLeft,

    Text,
    VerticalText,
    /// Busy, input is ignored.
    Wait,
    ZoomIn,
    ZoomOut,
}

/// The host could not show the requested cursor.
#[derive(Debug)]
pub struct MouseCursorError {
    pub reason: String,
}

impl std::fmt::Display for MouseCursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "cursor unavailable: {}", self.reason)
    }
}

impl std::error::Error for MouseCursorError {}

pub trait MouseCursorHandler {
    fn activate_system_cursor(&mut self, kind: SystemMouseCursor) -> Result<(), MouseCursorError>;
}

/// Forwards `activateSystemCursor` requests to a [`MouseCursorHandler`].
pub struct MouseCursorPlugin {
    handler: Arc<Mutex<dyn MouseCursorHandler + Send>>,
}

impl MouseCursorPlugin {
    pub fn new(handler: Arc<Mutex<dyn MouseCursorHandler + Send>>) -> Self {
        Self { handler }
    }
}

impl Plugin for MouseCursorPlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        engine.register_channel(MethodChannel::new(
            CHANNEL_NAME,
            Handler {
                handler: self.handler.clone(),
            },
            &STANDARD_CODEC,
        ));
    }
}

struct Handler {
    handler: Arc<Mutex<dyn MouseCursorHandler + Send>>,
}

fn requested_cursor(args: &Value) -> Option<SystemMouseCursor> {
    let kind = args.as_map()?.get("kind")?.as_str()?;
    SystemMouseCursor::from_str(kind).ok()
}

impl MethodCallHandler for Handler {
    fn on_method_call(&mut self, call: MethodCall) {
        debug!(
            "got method call {} with args {:?}",
            call.method(),
            call.raw_args()
        );
        match call.method().as_str() {
            "activateSystemCursor" => {
                let Some(kind) = requested_cursor(call.raw_args()) else {
                    return call.error("unknown-data", "Unknown data type", Value::Null);
                };

                match self.handler.lock().activate_system_cursor(kind) {
                    Ok(()) => call.success_empty(),
                    Err(err) => {
                        warn!("cannot activate cursor {}: {}", kind, err);
                        call.error("cursor-error", err.to_string(), Value::Null)
                    }
                };
            }
            _ => call.not_implemented(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_names() {
        assert_eq!(
            SystemMouseCursor::from_str("resizeUpLeftDownRight"),
            Ok(SystemMouseCursor::ResizeUpLeftDownRight)
        );
        assert_eq!(SystemMouseCursor::NoDrop.to_string(), "noDrop");
        assert!(SystemMouseCursor::from_str("sparkles").is_err());
    }

    #[test]
    fn cursor_from_args() {
        let mut map = flust_engine::codec::value::ValueMap::new();
        map.insert("kind", "text");
        map.insert("device", 0);
        assert_eq!(
            requested_cursor(&Value::Map(map)),
            Some(SystemMouseCursor::Text)
        );
        assert_eq!(requested_cursor(&Value::Null), None);
    }
}
