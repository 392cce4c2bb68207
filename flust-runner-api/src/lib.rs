use std::path::PathBuf;
use std::time::Duration;

use dpi::Size;

/// How long the event loop sleeps when no engine task is pending.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(25);

/// Attributes used when creating an application.
#[derive(Debug, Clone)]
pub struct ApplicationAttributes {
    pub inner_size: Option<Size>,
    pub title: Option<String>,
    pub app_id: Option<String>,
    pub args: Vec<String>,
    pub aot_library_path: PathBuf,
    pub assets_path: PathBuf,
    pub icu_data_path: PathBuf,
    pub persistent_cache_path: PathBuf,
    /// Upper bound on a single wait of the event loop.
    pub refresh_interval: Duration,
    /// BCP 47 tag reported to the framework. Falls back to the system locale.
    pub locale: Option<String>,
    pub initial_route: Option<String>,
}

impl Default for ApplicationAttributes {
    fn default() -> Self {
        Self {
            inner_size: None,
            title: None,
            app_id: None,
            args: Vec::new(),
            aot_library_path: PathBuf::new(),
            assets_path: PathBuf::new(),
            icu_data_path: PathBuf::new(),
            persistent_cache_path: PathBuf::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            locale: None,
            initial_route: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_interval_defaults_to_25ms() {
        let attributes = ApplicationAttributes::default();
        assert_eq!(attributes.refresh_interval, Duration::from_millis(25));
        assert!(attributes.assets_path.as_os_str().is_empty());
        assert!(attributes.locale.is_none());
    }
}
