//! Handlers for the system channels the framework talks to.

pub mod keyevent;
pub mod lifecycle;
pub mod localization;
pub mod mousecursor;
pub mod navigation;
pub mod platform;
pub mod settings;
pub mod textinput;
