//! `flutter/keyevent`: raw key presses in the GLFW layout the framework's
//! Linux keymap decodes.

use std::sync::Weak;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use flust_engine::{
    channel::{Message, MessageChannel, MessageHandler},
    codec::{value::from_value, Value, JSON_CODEC},
    plugins::Plugin,
    FlutterEngine,
};

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/keyevent";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyAction {
    #[serde(rename = "type")]
    pub kind: KeyActionType,
    pub toolkit: String,
    pub keymap: String,
    pub key_code: i32,
    pub scan_code: i32,
    pub modifiers: i32,
    pub unicode_scalar_values: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specified_logical_key: Option<i64>,
}

impl KeyAction {
    pub fn glfw(
        kind: KeyActionType,
        key_code: i32,
        scan_code: i32,
        modifiers: i32,
        character: Option<char>,
    ) -> Self {
        Self {
            kind,
            toolkit: "glfw".into(),
            keymap: "linux".into(),
            key_code,
            scan_code,
            modifiers,
            unicode_scalar_values: character.map_or(0, |c| u32::from(c) as i64),
            specified_logical_key: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyActionType {
    Keydown,
    Keyup,
}

#[derive(Deserialize)]
struct Reply {
    handled: bool,
}

#[derive(Default)]
pub struct KeyEventPlugin {
    channel: Weak<MessageChannel>,
}

impl Plugin for KeyEventPlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        self.channel = engine.register_channel(MessageChannel::new(
            CHANNEL_NAME,
            Inbound,
            &JSON_CODEC,
        ));
    }
}

impl KeyEventPlugin {
    pub fn new() -> Self {
        Default::default()
    }

    /// Fire and forget.
    pub fn key_action(&self, action: KeyAction) {
        match self.channel.upgrade() {
            Some(channel) => channel.send(action),
            None => trace!("key event dropped, channel gone"),
        }
    }

    /// Sends `action`; `callback` learns whether the framework consumed it.
    /// A missing or malformed answer counts as not handled.
    pub fn key_action_with_reply<F>(&self, action: KeyAction, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let Some(channel) = self.channel.upgrade() else {
            return callback(false);
        };
        channel.send_with_reply(action, move |reply| {
            let handled = reply
                .map_err(|err| trace!("key event not answered: {}", err))
                .and_then(|value| from_value::<Reply>(value).map_err(|_| ()))
                .map_or(false, |reply| reply.handled);
            callback(handled)
        });
    }
}

/// The framework never initiates traffic here.
struct Inbound;

impl MessageHandler for Inbound {
    fn on_message(&mut self, msg: Message) {
        warn!("unexpected message on {}: {:?}", msg.channel(), msg.value());
        msg.respond(Value::Null)
    }
}
