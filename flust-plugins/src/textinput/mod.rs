//! `flutter/textinput`: the focused text field's editing state, kept in sync
//! with the framework while the host applies key presses to it.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use flust_engine::{
    channel::{MethodCall, MethodCallHandler, MethodChannel},
    codec::{value::VecExt, Value, JSON_CODEC},
    plugins::Plugin,
    FlutterEngine,
};

pub use self::text_editing_state::TextEditingState;

mod text_editing_state;
pub(crate) mod utils;

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/textinput";

const MULTILINE_INPUT_TYPE: &str = "TextInputType.multiline";
const INPUT_ACTION_NEWLINE: &str = "TextInputAction.newline";

/// Soft keyboard control requested by the framework.
pub trait TextInputHandler {
    fn show(&mut self);

    fn hide(&mut self);
}

/// The text field holding input focus.
struct Client {
    id: i64,
    config: ClientConfig,
    state: TextEditingState,
}

impl Client {
    fn inserts_newline(&self) -> bool {
        self.config.input_type.name == MULTILINE_INPUT_TYPE
            && self.config.input_action == INPUT_ACTION_NEWLINE
    }
}

type SharedClient = Arc<RwLock<Option<Client>>>;

pub struct TextInputPlugin {
    channel: Weak<MethodChannel>,
    client: SharedClient,
    handler: Arc<Mutex<dyn TextInputHandler + Send>>,
}

impl Plugin for TextInputPlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        self.channel = engine.register_channel(MethodChannel::new(
            CHANNEL_NAME,
            Handler {
                client: self.client.clone(),
                handler: self.handler.clone(),
            },
            &JSON_CODEC,
        ));
    }
}

impl TextInputPlugin {
    pub fn new(handler: Arc<Mutex<dyn TextInputHandler + Send>>) -> Self {
        Self {
            channel: Weak::new(),
            client: Default::default(),
            handler,
        }
    }

    pub fn has_client(&self) -> bool {
        self.client.read().is_some()
    }

    /// Runs `cbk` against the focused field's state. `None` without a client.
    pub fn with_state<R>(&mut self, cbk: impl FnOnce(&mut TextEditingState) -> R) -> Option<R> {
        self.client
            .write()
            .as_mut()
            .map(|client| cbk(&mut client.state))
    }

    /// Sends `TextInputAction.<action>` to the focused field.
    pub fn perform_action(&self, action: &str) {
        let Some(id) = self.client.read().as_ref().map(|client| client.id) else {
            return;
        };
        self.invoke_on_client(
            "TextInputClient.performAction",
            id,
            format!("TextInputAction.{}", action),
        );
    }

    /// Pushes the current editing state back to the framework.
    pub fn notify_changes(&mut self) {
        let update = self
            .client
            .read()
            .as_ref()
            .map(|client| (client.id, client.state.clone()));
        if let Some((id, state)) = update {
            self.invoke_on_client("TextInputClient.updateEditingState", id, state);
        }
    }

    /// Multiline fields whose action is "newline" get a line break; every
    /// client then receives its configured input action.
    pub fn enter_pressed(&mut self) {
        let action = {
            let mut client = self.client.write();
            let Some(client) = client.as_mut() else {
                return;
            };
            let newline = client.inserts_newline();
            if newline {
                client.state.add_characters("\n");
            }
            (client.id, client.config.input_action.clone(), newline)
        };

        let (id, input_action, newline) = action;
        if newline {
            self.notify_changes();
        }
        if !input_action.is_empty() {
            self.invoke_on_client("TextInputClient.performAction", id, input_action);
        }
    }

    fn invoke_on_client<T: Serialize>(&self, method: &str, id: i64, payload: T) {
        let Some(channel) = self.channel.upgrade() else {
            return;
        };
        let mut args: Vec<Value> = Vec::new();
        args.push_as_value(id);
        args.push_as_value(payload);
        channel.invoke_method(method, args);
    }
}

struct Handler {
    client: SharedClient,
    handler: Arc<Mutex<dyn TextInputHandler + Send>>,
}

impl MethodCallHandler for Handler {
    fn on_method_call(&mut self, call: MethodCall) {
        debug!("{} {:?}", call.method(), call.raw_args());
        match call.method().as_str() {
            "TextInput.setClient" => match call.args::<SetClientArgs>() {
                Ok(SetClientArgs(id, config)) => {
                    let mut client = self.client.write();
                    // A new client keeps the text the previous one left, if any.
                    let state = client.take().map(|c| c.state).unwrap_or_default();
                    *client = Some(Client { id, config, state });
                    drop(client);
                    call.success_empty()
                }
                Err(err) => {
                    warn!("invalid TextInput.setClient arguments: {}", err);
                    call.error("invalid-args", err.to_string(), Value::Null)
                }
            },
            "TextInput.clearClient" => {
                self.client.write().take();
                call.success_empty()
            }
            "TextInput.setEditingState" => match call.args::<TextEditingState>() {
                Ok(state) => {
                    match self.client.write().as_mut() {
                        Some(client) => client.state = state,
                        None => debug!("editing state without a client"),
                    }
                    call.success_empty()
                }
                Err(err) => call.error("invalid-args", err.to_string(), Value::Null),
            },
            "TextInput.show" => {
                self.handler.lock().show();
                call.success_empty()
            }
            "TextInput.hide" => {
                self.handler.lock().hide();
                call.success_empty()
            }
            _ => call.not_implemented(),
        }
    }
}

#[derive(Deserialize)]
struct SetClientArgs(i64, ClientConfig);

/// Field configuration sent with `TextInput.setClient`. Only the parts the
/// host acts on are kept.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ClientConfig {
    input_action: String,
    input_type: InputType,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct InputType {
    name: String,
}
