use std::error::Error;
use std::sync::Arc;

use copypasta::ClipboardProvider;
use flust_engine::tasks::TaskRunnerHandler;
use flust_plugins::mousecursor::{MouseCursorError, MouseCursorHandler, SystemMouseCursor};
use flust_plugins::platform::{AppSwitcherDescription, MimeError, PlatformHandler, TEXT_PLAIN};
use flust_plugins::textinput::TextInputHandler;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::event_loop::{EventLoopProxy, LoopEvent};

/// What the framework asked the window to look like. The host toolkit reads
/// this to update the real window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub title: Option<String>,
    pub cursor: SystemMouseCursor,
    pub soft_keyboard_visible: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            title: None,
            cursor: SystemMouseCursor::Basic,
            soft_keyboard_visible: false,
        }
    }
}

pub struct PlatformTaskHandler {
    proxy: EventLoopProxy,
}

impl PlatformTaskHandler {
    pub fn new(proxy: EventLoopProxy) -> Self {
        Self { proxy }
    }
}

impl TaskRunnerHandler for PlatformTaskHandler {
    fn wake(&self) {
        self.proxy.send_event(LoopEvent::Wake).ok();
    }
}

pub struct FlustPlatformHandler {
    clipboard: Box<dyn ClipboardProvider + Send>,
    window: Arc<Mutex<WindowState>>,
    proxy: EventLoopProxy,
}

impl FlustPlatformHandler {
    pub fn new(
        clipboard: Box<dyn ClipboardProvider + Send>,
        window: Arc<Mutex<WindowState>>,
        proxy: EventLoopProxy,
    ) -> Self {
        Self {
            clipboard,
            window,
            proxy,
        }
    }
}

impl PlatformHandler for FlustPlatformHandler {
    fn set_application_switcher_description(&mut self, description: AppSwitcherDescription) {
        self.window.lock().title = Some(description.label);
    }

    fn set_clipboard_data(&mut self, text: String) {
        if let Err(err) = self.clipboard.set_contents(text) {
            error!("{}", err);
        }
    }

    fn get_clipboard_data(&mut self, mime: &str) -> Result<String, MimeError> {
        if mime != TEXT_PLAIN {
            return Err(MimeError);
        }
        let result = self.clipboard.get_contents();
        if let Err(err) = &result {
            error!("{}", err);
        }
        Ok(result.unwrap_or_default())
    }

    fn pop(&mut self) {
        debug!("framework requested exit");
        self.proxy.send_event(LoopEvent::Exit).ok();
    }
}

pub struct FlustMouseCursorHandler {
    window: Arc<Mutex<WindowState>>,
}

impl FlustMouseCursorHandler {
    pub fn new(window: Arc<Mutex<WindowState>>) -> Self {
        Self { window }
    }
}

impl MouseCursorHandler for FlustMouseCursorHandler {
    fn activate_system_cursor(&mut self, kind: SystemMouseCursor) -> Result<(), MouseCursorError> {
        self.window.lock().cursor = kind;
        Ok(())
    }
}

pub struct FlustTextInputHandler {
    window: Arc<Mutex<WindowState>>,
}

impl FlustTextInputHandler {
    pub fn new(window: Arc<Mutex<WindowState>>) -> Self {
        Self { window }
    }
}

impl TextInputHandler for FlustTextInputHandler {
    fn show(&mut self) {
        self.window.lock().soft_keyboard_visible = true;
    }

    fn hide(&mut self) {
        self.window.lock().soft_keyboard_visible = false;
    }
}

/// Process-local clipboard, for hosts without a system clipboard.
#[derive(Default)]
pub struct MemoryClipboard {
    contents: String,
}

impl ClipboardProvider for MemoryClipboard {
    fn get_contents(&mut self) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(self.contents.clone())
    }

    fn set_contents(&mut self, contents: String) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.contents = contents;
        Ok(())
    }
}
