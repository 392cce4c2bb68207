//! Plugin to work with locales.
//! It handles flutter/localization type message.

use std::sync::Weak;

use icu_locid::Locale;
use tracing::{debug, error, info, warn};

use flust_engine::{
    channel::{MethodCall, MethodCallHandler, MethodChannel},
    codec::JSON_CODEC,
    plugins::Plugin,
    FlutterEngine,
};

pub const PLUGIN_NAME: &str = module_path!();
pub const CHANNEL_NAME: &str = "flutter/localization";

#[derive(Default)]
pub struct LocalizationPlugin {
    channel: Weak<MethodChannel>,
}

impl Plugin for LocalizationPlugin {
    fn plugin_name() -> &'static str {
        PLUGIN_NAME
    }

    fn init(&mut self, engine: &FlutterEngine) {
        self.channel =
            engine.register_channel(MethodChannel::new(CHANNEL_NAME, Handler, &JSON_CODEC));
    }
}

impl LocalizationPlugin {
    pub fn send_locale(&self, locale: String) {
        self.send_locales(&[locale])
    }

    /// Sends the preferred locales, most preferred first. Entries that do
    /// not parse are skipped.
    pub fn send_locales(&self, locales: &[String]) {
        debug!("Sending locales to flutter");
        let Some(channel) = self.channel.upgrade() else {
            error!("Failed to upgrade channel to send message");
            return;
        };

        let languages: Vec<String> = locales
            .iter()
            .filter_map(|locale| match locale_quadruple(locale) {
                Some(quadruple) => {
                    info!("Available locale: {}", locale);
                    Some(quadruple)
                }
                None => {
                    warn!("Failed to parse locale: {}", locale);
                    None
                }
            })
            .flatten()
            .collect();

        channel.invoke_method("setLocale", languages)
    }
}

/// `[language, country, script, variant]`, empty strings for absent parts.
/// POSIX names such as `de_DE.UTF-8` are accepted.
pub fn locale_quadruple(locale: &str) -> Option<[String; 4]> {
    let tag = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .replace('_', "-");
    let loc = tag.parse::<Locale>().ok()?;
    Some([
        loc.id.language.as_str().to_owned(),
        loc.id.region.as_ref().map_or("", |r| r.as_str()).to_owned(),
        loc.id.script.as_ref().map_or("", |s| s.as_str()).to_owned(),
        loc.id
            .variants
            .first()
            .map_or("", |v| v.as_str())
            .to_owned(),
    ])
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
