//! Route changes requested by the host.
//! It sends flutter/navigation type message.

use std::sync::Weak;

use tracing::{debug, error};

use flust_engine::{
    channel::{MethodCall, MethodCallHandler, MethodChannel},
    codec::{Value, JSON_CODEC},
    plugins::Plugin,
    FlutterEngine,
};

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/navigation";

#[derive(Default)]
pub struct NavigationPlugin {
    channel: Weak<MethodChannel>,
}

impl Plugin for NavigationPlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        self.channel =
            engine.register_channel(MethodChannel::new(CHANNEL_NAME, Handler, &JSON_CODEC));
    }
}

impl NavigationPlugin {
    pub fn set_initial_route(&self, initial_route: &str) {
        self.invoke("setInitialRoute", Value::String(initial_route.to_owned()));
    }

    pub fn push_route(&self, route: &str) {
        self.invoke("pushRoute", Value::String(route.to_owned()));
    }

    pub fn pop_route(&self) {
        self.invoke("popRoute", Value::Null);
    }

    fn invoke(&self, method: &str, args: Value) {
        match self.channel.upgrade() {
            Some(channel) => channel.invoke_method(method, args),
            None => error!("Failed to upgrade channel to send {}", method),
        }
    }
}

struct Handler;

impl MethodCallHandler for Handler {
    fn on_method_call(&mut self, call: MethodCall) {
        debug!(
            "got method call {} with args {:?}",
            call.method(),
            call.raw_args()
        );
        call.not_implemented()
    }
}
