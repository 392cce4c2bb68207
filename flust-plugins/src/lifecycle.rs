//! Application lifecycle notifications.
//! It sends flutter/lifecycle type message.

use std::sync::Weak;

use strum::{Display, EnumString};
use tracing::{debug, error};

use flust_engine::{
    channel::{Message, MessageChannel, MessageHandler},
    codec::{Value, STRING_CODEC},
    plugins::Plugin,
    FlutterEngine,
};

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/lifecycle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum AppLifecycleState {
    #[strum(serialize = "AppLifecycleState.resumed")]
    Resumed,
    #[strum(serialize = "AppLifecycleState.inactive")]
    Inactive,
    #[strum(serialize = "AppLifecycleState.hidden")]
    Hidden,
    #[strum(serialize = "AppLifecycleState.paused")]
    Paused,
    #[strum(serialize = "AppLifecycleState.detached")]
    Detached,
}

#[derive(Default)]
pub struct LifecyclePlugin {
    channel: Weak<MessageChannel>,
}

impl Plugin for LifecyclePlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        self.channel =
            engine.register_channel(MessageChannel::new(CHANNEL_NAME, Handler, &STRING_CODEC));
    }
}

impl LifecyclePlugin {
    pub fn send_state(&self, state: AppLifecycleState) {
        debug!("Sending lifecycle state {}", state);
        match self.channel.upgrade() {
            Some(channel) => channel.send(state.to_string()),
            None => error!("Failed to upgrade channel to send lifecycle state"),
        }
    }

    pub fn send_app_is_resumed(&self) {
        self.send_state(AppLifecycleState::Resumed)
    }

    pub fn send_app_is_inactive(&self) {
        self.send_state(AppLifecycleState::Inactive)
    }

    pub fn send_app_is_paused(&self) {
        self.send_state(AppLifecycleState::Paused)
    }

    pub fn send_app_is_detached(&self) {
        self.send_state(AppLifecycleState::Detached)
    }
}

struct Handler;

impl MessageHandler for Handler {
    fn on_message(&mut self, msg: Message) {
        msg.respond(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AppLifecycleState;

    #[test]
    fn state_names() {
        assert_eq!(
            AppLifecycleState::Resumed.to_string(),
            "AppLifecycleState.resumed"
        );
        assert_eq!(
            AppLifecycleState::Detached.to_string(),
            "AppLifecycleState.detached"
        );
        assert_eq!(
            AppLifecycleState::from_str("AppLifecycleState.paused"),
            Ok(AppLifecycleState::Paused)
        );
    }
}
