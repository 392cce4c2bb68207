use std::{fs::canonicalize, io::ErrorKind, path::PathBuf, sync::Arc, time::Duration, time::Instant};

use copypasta::ClipboardProvider;
use dpi::{PhysicalSize, Size};
use flust_engine::{
    binding::FlutterEngineBinding,
    builder::FlutterEngineBuilder,
    ffi::{FlutterWindowMetricsEvent, IMPLICIT_VIEW_ID},
    plugins::{Plugin, PluginRegistrar},
    CreateError, FlutterEngine, RunError,
};
use flust_plugins::{
    keyevent::{KeyAction, KeyActionType, KeyEventPlugin},
    lifecycle::LifecyclePlugin,
    localization::LocalizationPlugin,
    mousecursor::MouseCursorPlugin,
    navigation::NavigationPlugin,
    platform::{PlatformHandler, PlatformPlugin, TEXT_PLAIN},
    settings::{PlatformBrightness, SettingsPlugin},
    textinput::TextInputPlugin,
};
use flust_runner_api::ApplicationAttributes;
use parking_lot::Mutex;
use sys_locale::get_locale;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::event::{ElementState, KeyEvent, Modifiers, WindowEvent};
use crate::event_loop::{wait_timeout, EventLoop, EventLoopProxy, LoopEvent};
use crate::handler::{
    FlustMouseCursorHandler, FlustPlatformHandler, FlustTextInputHandler, MemoryClipboard,
    PlatformTaskHandler, WindowState,
};
use crate::keyboard::{raw_key, raw_modifiers, text_edit, TextEdit};
use crate::pointer::Pointers;

const FALLBACK_LOCALE: &str = "en-US";

/// A Flutter application: the engine, its system plugins and the event loop
/// driving both on the thread that built it.
pub struct Application {
    engine: FlutterEngine,
    event_loop: EventLoop,
    plugins: PluginRegistrar,
    attributes: ApplicationAttributes,
    platform: Arc<Mutex<FlustPlatformHandler>>,
    window: Arc<Mutex<WindowState>>,
    pointers: Pointers,
    modifiers: Modifiers,
    exit_requested: bool,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub fn new(
        attributes: ApplicationAttributes,
        binding: Arc<dyn FlutterEngineBinding>,
        clipboard: Box<dyn ClipboardProvider + Send>,
    ) -> Result<Application, ApplicationBuildError> {
        let event_loop = EventLoop::new();
        let proxy = event_loop.create_proxy();

        let engine = FlutterEngineBuilder::new()
            .with_binding(binding)
            .with_platform_handler(Arc::new(PlatformTaskHandler::new(proxy.clone())))
            .with_asset_path(attributes.assets_path.clone())
            .with_icu_data_path(attributes.icu_data_path.clone())
            .with_aot_library_path(attributes.aot_library_path.clone())
            .with_persistent_cache_path(attributes.persistent_cache_path.clone())
            .with_args(attributes.args.clone())
            .build()?;

        let window = Arc::new(Mutex::new(WindowState {
            title: attributes.title.clone(),
            ..Default::default()
        }));
        let platform = Arc::new(Mutex::new(FlustPlatformHandler::new(
            clipboard,
            window.clone(),
            proxy,
        )));

        let mut plugins = PluginRegistrar::new();
        plugins
            .add_plugin(&engine, PlatformPlugin::new(platform.clone()))
            .add_plugin(
                &engine,
                TextInputPlugin::new(Arc::new(Mutex::new(FlustTextInputHandler::new(
                    window.clone(),
                )))),
            )
            .add_plugin(
                &engine,
                MouseCursorPlugin::new(Arc::new(Mutex::new(FlustMouseCursorHandler::new(
                    window.clone(),
                )))),
            )
            .add_plugin(&engine, KeyEventPlugin::new())
            .add_plugin(&engine, LifecyclePlugin::default())
            .add_plugin(&engine, LocalizationPlugin::default())
            .add_plugin(&engine, NavigationPlugin::default())
            .add_plugin(&engine, SettingsPlugin::default());

        Ok(Self {
            pointers: Pointers::new(engine.clone(), IMPLICIT_VIEW_ID),
            engine,
            event_loop,
            plugins,
            attributes,
            platform,
            window,
            modifiers: Modifiers::default(),
            exit_requested: false,
        })
    }

    pub fn engine(&self) -> &FlutterEngine {
        &self.engine
    }

    /// Handle for the host window system to post its events.
    pub fn create_proxy(&self) -> EventLoopProxy {
        self.event_loop.create_proxy()
    }

    pub fn window_state(&self) -> WindowState {
        self.window.lock().clone()
    }

    pub fn add_plugin<P>(&mut self, plugin: P)
    where
        P: Plugin + 'static,
    {
        self.plugins.add_plugin(&self.engine, plugin);
    }

    pub fn with_plugin<F, P>(&self, f: F)
    where
        F: FnOnce(&P),
        P: Plugin + 'static,
    {
        self.plugins.with_plugin(f)
    }

    pub fn with_plugin_mut<F, P>(&mut self, f: F)
    where
        F: FnOnce(&mut P),
        P: Plugin + 'static,
    {
        self.plugins.with_plugin_mut(f)
    }

    /// Starts the engine and drives the event loop until exit is requested.
    pub fn run(mut self) -> Result<(), ApplicationRunError> {
        self.start()?;
        while self.wait_for_events() {}
        self.stop();
        Ok(())
    }

    /// Starts the engine and sends the startup state. [`Application::run`]
    /// does this; hosts that drive [`Application::wait_for_events`] themselves
    /// call it once up front.
    pub fn start(&mut self) -> Result<(), ApplicationRunError> {
        info!("Starting engine with assets from {:?}", self.attributes.assets_path);
        self.engine.run()?;

        if let Some(size) = self.attributes.inner_size {
            self.resize(size.to_physical(1.0), 1.0);
        }

        let locale = self
            .attributes
            .locale
            .clone()
            .or_else(get_locale)
            .unwrap_or_else(|| FALLBACK_LOCALE.to_owned());
        self.with_plugin(|localization: &LocalizationPlugin| localization.send_locale(locale));

        self.with_plugin(|settings: &SettingsPlugin| {
            settings
                .start_message()
                .set_platform_brightness(PlatformBrightness::Light)
                .set_use_24_hour_format(true)
                .set_text_scale_factor(1.0)
                .send();
        });

        if let Some(route) = self.attributes.initial_route.clone() {
            self.with_plugin(|navigation: &NavigationPlugin| navigation.set_initial_route(&route));
        }

        self.with_plugin(|lifecycle: &LifecyclePlugin| lifecycle.send_app_is_resumed());
        Ok(())
    }

    /// Tells the framework the application is going away and shuts the
    /// engine down.
    pub fn stop(&mut self) {
        self.with_plugin(|lifecycle: &LifecyclePlugin| lifecycle.send_app_is_detached());
        // Flush what the plugins queued before the engine goes away.
        self.engine.execute_platform_tasks();
        self.engine.shutdown();
    }

    /// One pass of the event loop: runs due engine work, sleeps until the
    /// next engine deadline (at most the refresh interval) or until an event
    /// arrives, then handles every queued event. Returns false once exit was
    /// requested.
    pub fn wait_for_events(&mut self) -> bool {
        let next_task = self.engine.execute_platform_tasks();
        let timeout = wait_timeout(next_task, self.attributes.refresh_interval, Instant::now());

        let mut resize = None;
        for event in self.event_loop.poll(timeout) {
            match event {
                LoopEvent::Wake => {}
                LoopEvent::Exit => self.exit_requested = true,
                LoopEvent::Window(WindowEvent::Resized { size, scale_factor }) => {
                    resize = Some((size, scale_factor));
                }
                LoopEvent::Window(event) => self.handle_window_event(event),
            }
        }

        if let Some((size, scale_factor)) = resize {
            self.resize(size, scale_factor);
        }

        !self.exit_requested
    }

    fn resize(&self, size: PhysicalSize<u32>, scale_factor: f64) {
        debug!("window metrics {:?} @ {}", size, scale_factor);
        self.engine
            .send_window_metrics_event(FlutterWindowMetricsEvent::new(
                IMPLICIT_VIEW_ID,
                size,
                scale_factor,
            ));
    }

    fn handle_window_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::Resized { size, scale_factor } => self.resize(size, scale_factor),
            WindowEvent::CursorEntered { device_id } => self.pointers.enter(device_id),
            WindowEvent::CursorLeft { device_id } => self.pointers.leave(device_id),
            WindowEvent::CursorMoved {
                device_id,
                position,
            } => self.pointers.moved(device_id, position),
            WindowEvent::MouseInput {
                device_id,
                state,
                button,
            } => self.pointers.input(device_id, state, button),
            WindowEvent::MouseWheel { device_id, delta } => self.pointers.wheel(device_id, delta),
            WindowEvent::Touch {
                id,
                phase,
                location,
                ..
            } => self.pointers.touch(id, phase, location),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers,
            WindowEvent::KeyboardInput { event } => self.handle_key(event),
            WindowEvent::Focused(true) => {
                self.with_plugin(|lifecycle: &LifecyclePlugin| lifecycle.send_app_is_resumed())
            }
            WindowEvent::Focused(false) => {
                self.with_plugin(|lifecycle: &LifecyclePlugin| lifecycle.send_app_is_inactive())
            }
            WindowEvent::CloseRequested => self.exit_requested = true,
        }
    }

    fn handle_key(&mut self, event: KeyEvent) {
        if let Some(key_code) = raw_key(&event.logical_key) {
            let action_type = match event.state {
                ElementState::Pressed => KeyActionType::Keydown,
                ElementState::Released => KeyActionType::Keyup,
            };
            let action = KeyAction::glfw(
                action_type,
                key_code as i32,
                event.scan_code as i32,
                raw_modifiers(self.modifiers),
                event.text.as_deref().and_then(|text| text.chars().next()),
            );
            self.with_plugin(|keyevent: &KeyEventPlugin| keyevent.key_action(action));
        }

        if event.state == ElementState::Pressed {
            if let Some(edit) = text_edit(&event.logical_key, event.text.as_deref(), self.modifiers)
            {
                self.edit_text(edit);
            }
        }
    }

    fn edit_text(&mut self, edit: TextEdit) {
        let platform = self.platform.clone();
        self.with_plugin_mut(|text_input: &mut TextInputPlugin| {
            let changed = match edit {
                TextEdit::Enter => return text_input.enter_pressed(),
                TextEdit::Copy => {
                    if let Some(text) = text_input.with_state(|state| state.selected_text().to_owned()) {
                        if !text.is_empty() {
                            platform.lock().set_clipboard_data(text);
                        }
                    }
                    false
                }
                TextEdit::Cut => match text_input.with_state(|state| state.cut()).flatten() {
                    Some(text) => {
                        platform.lock().set_clipboard_data(text);
                        true
                    }
                    None => false,
                },
                TextEdit::Paste => {
                    let pasted = platform.lock().get_clipboard_data(TEXT_PLAIN);
                    match pasted {
                        Ok(text) if !text.is_empty() => text_input
                            .with_state(|state| state.add_characters(&text))
                            .is_some(),
                        _ => false,
                    }
                }
                edit => text_input
                    .with_state(|state| edit.apply(state))
                    .unwrap_or(false),
            };
            if changed {
                text_input.notify_changes();
            }
        });
    }
}

/// Configure application before creation.
///
/// You can access this from [`Application::builder`].
#[derive(Default)]
pub struct ApplicationBuilder {
    /// The attributes to use to create the application.
    pub(crate) attributes: ApplicationAttributes,
    binding: Option<Arc<dyn FlutterEngineBinding>>,
    clipboard: Option<Box<dyn ClipboardProvider + Send>>,
}

impl ApplicationBuilder {
    /// Builds the application. The calling thread becomes the platform thread.
    pub fn build(mut self) -> Result<Application, ApplicationBuildError> {
        #[cfg(target_os = "linux")]
        self.use_default_paths_if_empty();

        let binding = self.binding.ok_or(CreateError::NoBinding)?;
        let clipboard = self.clipboard.unwrap_or_else(system_clipboard);
        Application::new(self.attributes, binding, clipboard)
    }

    pub fn attributes(&self) -> &ApplicationAttributes {
        &self.attributes
    }

    pub fn with_binding(mut self, binding: Arc<dyn FlutterEngineBinding>) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardProvider + Send>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn with_inner_size<S: Into<Size>>(mut self, size: S) -> Self {
        self.attributes.inner_size = Some(size.into());
        self
    }

    pub fn with_title<T: Into<String>>(mut self, title: T) -> Self {
        self.attributes.title = Some(title.into());
        self
    }

    pub fn with_app_id<T: Into<String>>(mut self, app_id: T) -> Self {
        self.attributes.app_id = Some(app_id.into());
        self
    }

    pub fn with_arg(mut self, arg: String) -> Self {
        self.attributes.args.push(arg);
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.attributes.args.extend(args);
        self
    }

    pub fn with_aot_library_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.attributes.aot_library_path = path.into();
        self
    }

    pub fn with_assets_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.attributes.assets_path = path.into();
        self
    }

    pub fn with_icu_data_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.attributes.icu_data_path = path.into();
        self
    }

    pub fn with_persistent_cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.attributes.persistent_cache_path = path.into();
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.attributes.refresh_interval = interval;
        self
    }

    pub fn with_locale<T: Into<String>>(mut self, locale: T) -> Self {
        self.attributes.locale = Some(locale.into());
        self
    }

    pub fn with_initial_route<T: Into<String>>(mut self, route: T) -> Self {
        self.attributes.initial_route = Some(route.into());
        self
    }

    #[cfg(target_os = "linux")]
    fn use_default_paths_if_empty(&mut self) {
        let app_id = self.attributes.app_id.clone().unwrap_or_default();

        // `~/.cache/APP_ID` keeps the engine cache under
        // `~/.cache/APP_ID/flutter_engine`.
        if self.attributes.persistent_cache_path.as_os_str().is_empty() && !app_id.is_empty() {
            self.attributes.persistent_cache_path = dirs::cache_dir()
                .map(|cache_dir| cache_dir.join(app_id))
                .unwrap_or_default();
        }

        if !self.attributes.assets_path.as_os_str().is_empty()
            && !self.attributes.icu_data_path.as_os_str().is_empty()
            && !self.attributes.aot_library_path.as_os_str().is_empty()
        {
            return;
        }

        let Ok(executable_dir) = get_executable_dir() else {
            warn!("Unable to resolve path for /proc/self/exe");
            return;
        };
        fill_bundle_paths(&mut self.attributes, &executable_dir);
    }
}

/// Fills empty paths with the layout of a Linux Flutter bundle rooted at
/// `bundle_dir`.
fn fill_bundle_paths(attributes: &mut ApplicationAttributes, bundle_dir: &std::path::Path) {
    if attributes.aot_library_path.as_os_str().is_empty() {
        attributes.aot_library_path = bundle_dir.join("lib").join("libapp.so");
    }

    if attributes.assets_path.as_os_str().is_empty() {
        attributes.assets_path = bundle_dir.join("data").join("flutter_assets");
    }

    if attributes.icu_data_path.as_os_str().is_empty() {
        attributes.icu_data_path = bundle_dir.join("data").join("icudtl.dat");
    }
}

fn system_clipboard() -> Box<dyn ClipboardProvider + Send> {
    match copypasta::ClipboardContext::new() {
        Ok(clipboard) => Box::new(clipboard),
        Err(err) => {
            warn!("System clipboard unavailable, keeping clipboard in memory: {}", err);
            Box::new(MemoryClipboard::default())
        }
    }
}

#[derive(Error, Debug)]
pub enum ApplicationBuildError {
    #[error(transparent)]
    CreateEngineError(#[from] CreateError),
}

#[derive(Error, Debug)]
pub enum ApplicationRunError {
    #[error(transparent)]
    StartEngineError(#[from] RunError),
}

#[cfg(target_os = "linux")]
pub fn get_executable_dir() -> Result<PathBuf, std::io::Error> {
    canonicalize("/proc/self/exe").and_then(|path| {
        path.parent()
            .map(|path| path.into())
            .ok_or(std::io::Error::from(ErrorKind::NotFound))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_layout_fills_only_empty_paths() {
        let mut attributes = ApplicationAttributes {
            assets_path: PathBuf::from("/opt/app/assets"),
            ..Default::default()
        };
        fill_bundle_paths(&mut attributes, std::path::Path::new("/opt/bundle"));

        assert_eq!(attributes.assets_path, PathBuf::from("/opt/app/assets"));
        assert_eq!(
            attributes.icu_data_path,
            PathBuf::from("/opt/bundle/data/icudtl.dat")
        );
        assert_eq!(
            attributes.aot_library_path,
            PathBuf::from("/opt/bundle/lib/libapp.so")
        );
    }

    #[test]
    fn builder_without_binding_fails() {
        let result = Application::builder()
            .with_clipboard(Box::new(MemoryClipboard::default()))
            .build();
        assert!(matches!(
            result,
            Err(ApplicationBuildError::CreateEngineError(CreateError::NoBinding))
        ));
    }
}
