//! Input delivered by the host window system. Whatever toolkit owns the
//! window translates its events into these and posts them through an
//! [`EventLoopProxy`](crate::event_loop::EventLoopProxy).

use dpi::{PhysicalPosition, PhysicalSize};

pub type DeviceId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseScrollDelta {
    /// Lines and rows, as reported by classic wheels.
    LineDelta(f32, f32),
    PixelDelta(PhysicalPosition<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    Escape,
    Enter,
    Tab,
    Backspace,
    Insert,
    Delete,
    ArrowRight,
    ArrowLeft,
    ArrowDown,
    ArrowUp,
    PageUp,
    PageDown,
    Home,
    End,
    CapsLock,
    Pause,
    Shift,
    Control,
    Alt,
    Super,
    /// F1 to F25.
    F(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Named(NamedKey),
    /// Unmodified character produced by the key.
    Character(String),
    Unidentified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub logical_key: Key,
    pub scan_code: u32,
    pub state: ElementState,
    /// Text the key press produces with modifiers applied, if any.
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Resized {
        size: PhysicalSize<u32>,
        scale_factor: f64,
    },
    CursorEntered {
        device_id: DeviceId,
    },
    CursorLeft {
        device_id: DeviceId,
    },
    CursorMoved {
        device_id: DeviceId,
        position: PhysicalPosition<f64>,
    },
    MouseInput {
        device_id: DeviceId,
        state: ElementState,
        button: MouseButton,
    },
    MouseWheel {
        device_id: DeviceId,
        delta: MouseScrollDelta,
    },
    Touch {
        device_id: DeviceId,
        id: u64,
        phase: TouchPhase,
        location: PhysicalPosition<f64>,
    },
    ModifiersChanged(Modifiers),
    KeyboardInput {
        event: KeyEvent,
    },
    Focused(bool),
    CloseRequested,
}
