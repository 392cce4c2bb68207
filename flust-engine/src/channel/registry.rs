use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tracing::debug;

use super::Channel;
use crate::FlutterEngineWeakRef;

/// Flat namespace of channels, at most one per name.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Arc<dyn Channel>>,
    engine: FlutterEngineWeakRef,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn init(&mut self, engine: FlutterEngineWeakRef) {
        self.engine = engine;
    }

    /// Registers `channel`, replacing any channel previously registered under
    /// the same name.
    pub fn register_channel<C>(&mut self, channel: C) -> Weak<C>
    where
        C: Channel + 'static,
    {
        channel.init(self.engine.clone());
        let name = channel.name().to_owned();
        let channel = Arc::new(channel);
        let weak = Arc::downgrade(&channel);
        if self.channels.insert(name.clone(), channel).is_some() {
            debug!("channel {} replaced", name);
        }
        weak
    }

    pub fn remove_channel(&mut self, channel_name: &str) -> Option<Arc<dyn Channel>> {
        self.channels.remove(channel_name)
    }

    pub fn channel(&self, channel_name: &str) -> Option<Arc<dyn Channel>> {
        self.channels.get(channel_name).cloned()
    }

    pub fn with_channel<F>(&self, channel_name: &str, f: F)
    where
        F: FnOnce(&dyn Channel),
    {
        if let Some(channel) = self.channels.get(channel_name) {
            f(&**channel);
        }
    }

    pub fn contains(&self, channel_name: &str) -> bool {
        self.channels.contains_key(channel_name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::channel::platform_message::PlatformMessage;
    use crate::FlutterEngine;

    struct NamedChannel {
        name: &'static str,
        tag: u32,
        initialized: Mutex<bool>,
    }

    impl NamedChannel {
        fn new(name: &'static str, tag: u32) -> Self {
            Self {
                name,
                tag,
                initialized: Mutex::new(false),
            }
        }
    }

    impl Channel for NamedChannel {
        fn name(&self) -> &str {
            self.name
        }

        fn engine(&self) -> Option<FlutterEngine> {
            None
        }

        fn init(&self, _engine: FlutterEngineWeakRef) {
            *self.initialized.lock() = true;
        }

        fn handle_platform_message(&self, _msg: PlatformMessage) {}
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = ChannelRegistry::new();
        let first = registry.register_channel(NamedChannel::new("flutter/test", 1));
        let second = registry.register_channel(NamedChannel::new("flutter/test", 2));

        assert_eq!(registry.len(), 1);
        assert!(first.upgrade().is_none());
        let second = second.upgrade().unwrap();
        assert_eq!(second.tag, 2);
        assert!(*second.initialized.lock());
    }

    #[test]
    fn remove_deregisters() {
        let mut registry = ChannelRegistry::new();
        registry.register_channel(NamedChannel::new("flutter/a", 1));
        registry.register_channel(NamedChannel::new("flutter/b", 2));

        assert!(registry.remove_channel("flutter/a").is_some());
        assert!(registry.remove_channel("flutter/a").is_none());
        assert!(!registry.contains("flutter/a"));
        assert!(registry.channel("flutter/b").is_some());

        let mut seen = None;
        registry.with_channel("flutter/b", |channel| seen = Some(channel.name().to_owned()));
        assert_eq!(seen.as_deref(), Some("flutter/b"));
    }
}
