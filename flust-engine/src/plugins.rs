use std::any::Any;
use std::collections::HashMap;

use tracing::{trace, warn};

use crate::FlutterEngine;

pub trait Plugin: Any {
    fn plugin_name() -> &'static str
    where
        Self: Sized;

    /// Registers the plugin's channels on `engine`.
    fn init(&mut self, engine: &FlutterEngine);
}

/// Owns the plugins of an application, keyed by plugin name.
#[derive(Default)]
pub struct PluginRegistrar {
    plugins: HashMap<&'static str, Box<dyn Any>>,
}

impl PluginRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plugin<P>(&mut self, engine: &FlutterEngine, mut plugin: P) -> &mut Self
    where
        P: Plugin + 'static,
    {
        trace!("adding plugin {}", P::plugin_name());
        plugin.init(engine);
        if self.plugins.insert(P::plugin_name(), Box::new(plugin)).is_some() {
            warn!("plugin {} replaced", P::plugin_name());
        }
        self
    }

    pub fn has_plugin<P>(&self) -> bool
    where
        P: Plugin + 'static,
    {
        self.plugins.contains_key(P::plugin_name())
    }

    pub fn with_plugin<F, P>(&self, f: F)
    where
        F: FnOnce(&P),
        P: Plugin + 'static,
    {
        if let Some(plugin) = self.plugins.get(P::plugin_name()) {
            if let Some(plugin) = plugin.downcast_ref::<P>() {
                f(plugin);
            }
        }
    }

    pub fn with_plugin_mut<F, P>(&mut self, f: F)
    where
        F: FnOnce(&mut P),
        P: Plugin + 'static,
    {
        if let Some(plugin) = self.plugins.get_mut(P::plugin_name()) {
            if let Some(plugin) = plugin.downcast_mut::<P>() {
                f(plugin);
            }
        }
    }
}
