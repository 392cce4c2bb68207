//! User preferences the framework reads on startup.
//! It sends flutter/settings type message.

use std::sync::Weak;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use flust_engine::{
    channel::{Message, MessageChannel, MessageHandler},
    codec::{Value, JSON_CODEC},
    plugins::Plugin,
    FlutterEngine,
};

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/settings";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlatformBrightness {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Default)]
pub struct SettingsPlugin {
    channel: Weak<MessageChannel>,
}

impl Plugin for SettingsPlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        self.channel =
            engine.register_channel(MessageChannel::new(CHANNEL_NAME, Handler, &JSON_CODEC));
    }
}

impl SettingsPlugin {
    pub fn start_message(&self) -> SettingsMessage<'_> {
        SettingsMessage {
            plugin: self,
            settings: Settings::default(),
        }
    }

    fn send(&self, settings: &Settings) {
        debug!("Sending settings {:?}", settings);
        match self.channel.upgrade() {
            Some(channel) => channel.send(settings),
            None => error!("Failed to upgrade channel to send settings"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Settings {
    text_scale_factor: f64,
    always_use_24_hour_format: bool,
    platform_brightness: PlatformBrightness,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_scale_factor: 1.0,
            always_use_24_hour_format: false,
            platform_brightness: PlatformBrightness::Light,
        }
    }
}

/// Accumulates settings until [`SettingsMessage::send`].
#[must_use]
pub struct SettingsMessage<'a> {
    plugin: &'a SettingsPlugin,
    settings: Settings,
}

impl SettingsMessage<'_> {
    pub fn set_text_scale_factor(mut self, factor: f64) -> Self {
        self.settings.text_scale_factor = factor;
        self
    }

    pub fn set_use_24_hour_format(mut self, value: bool) -> Self {
        self.settings.always_use_24_hour_format = value;
        self
    }

    pub fn set_platform_brightness(mut self, brightness: PlatformBrightness) -> Self {
        self.settings.platform_brightness = brightness;
        self
    }

    pub fn send(self) {
        self.plugin.send(&self.settings)
    }
}

struct Handler;

impl MessageHandler for Handler {
    fn on_message(&mut self, msg: Message) {
        msg.respond(Value::Null)
    }
}
