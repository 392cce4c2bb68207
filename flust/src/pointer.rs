use dpi::PhysicalPosition;
use flust_engine::ffi::{
    FlutterPointerDeviceKind, FlutterPointerEvent, FlutterPointerMouseButtons, FlutterPointerPhase,
    FlutterPointerSignalKind, FlutterViewId,
};
use flust_engine::FlutterEngine;

use crate::event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase};

/// Pixels scrolled per wheel line.
const SCROLL_LINE_PIXELS: f64 = 20.0;

/// Touch device numbers start here, clear of the mice counted up from zero.
const TOUCH_DEVICE_BASE: i32 = 1 << 16;

struct Pointer {
    device_id: DeviceId,
    position: PhysicalPosition<f64>,
    /// Bitmask of `FlutterPointerMouseButtons` currently held.
    buttons: i64,
    added: bool,
}

/// Turns per-device mouse and touch input into engine pointer events,
/// tracking position and pressed buttons for each mouse.
pub struct Pointers {
    engine: FlutterEngine,
    view_id: FlutterViewId,
    pointers: Vec<Pointer>,
    /// Active touch ids by slot. A slot is reused once its touch lifts.
    touches: Vec<Option<u64>>,
}

impl Pointers {
    pub fn new(engine: FlutterEngine, view_id: FlutterViewId) -> Self {
        Self {
            engine,
            view_id,
            pointers: Default::default(),
            touches: Default::default(),
        }
    }

    fn index(&mut self, device_id: DeviceId) -> usize {
        if let Some(index) = self.pointers.iter().position(|p| p.device_id == device_id) {
            index
        } else {
            self.pointers.push(Pointer {
                device_id,
                position: PhysicalPosition::new(0.0, 0.0),
                buttons: 0,
                added: false,
            });
            self.pointers.len() - 1
        }
    }

    fn send(
        &self,
        device: usize,
        phase: FlutterPointerPhase,
        signal_kind: FlutterPointerSignalKind,
        scroll_delta: (f64, f64),
    ) {
        let pointer = &self.pointers[device];
        self.engine.send_pointer_event(FlutterPointerEvent::new(
            device as i32,
            phase,
            pointer.position,
            signal_kind,
            scroll_delta,
            FlutterPointerDeviceKind::Mouse,
            pointer.buttons,
            self.view_id,
        ));
    }

    /// The engine rejects events for devices it has not seen added.
    fn ensure_added(&mut self, device: usize) {
        if !self.pointers[device].added {
            self.pointers[device].added = true;
            self.send(
                device,
                FlutterPointerPhase::Add,
                FlutterPointerSignalKind::None,
                (0.0, 0.0),
            );
        }
    }

    pub fn enter(&mut self, device_id: DeviceId) {
        let device = self.index(device_id);
        self.ensure_added(device);
    }

    pub fn leave(&mut self, device_id: DeviceId) {
        let device = self.index(device_id);
        if !self.pointers[device].added {
            return;
        }
        self.send(
            device,
            FlutterPointerPhase::Remove,
            FlutterPointerSignalKind::None,
            (0.0, 0.0),
        );
        let pointer = &mut self.pointers[device];
        pointer.added = false;
        pointer.buttons = 0;
    }

    fn motion_phase(&self, device: usize) -> FlutterPointerPhase {
        if self.pointers[device].buttons == 0 {
            FlutterPointerPhase::Hover
        } else {
            FlutterPointerPhase::Move
        }
    }

    pub fn moved(&mut self, device_id: DeviceId, position: PhysicalPosition<f64>) {
        let device = self.index(device_id);
        self.pointers[device].position = position;
        self.ensure_added(device);
        let phase = self.motion_phase(device);
        self.send(device, phase, FlutterPointerSignalKind::None, (0.0, 0.0));
    }

    pub fn input(&mut self, device_id: DeviceId, state: ElementState, button: MouseButton) {
        let device = self.index(device_id);
        self.ensure_added(device);
        let button = i64::from(match button {
            MouseButton::Left => FlutterPointerMouseButtons::Primary,
            MouseButton::Right => FlutterPointerMouseButtons::Secondary,
            MouseButton::Middle => FlutterPointerMouseButtons::Middle,
            MouseButton::Back => FlutterPointerMouseButtons::Back,
            MouseButton::Forward => FlutterPointerMouseButtons::Forward,
            MouseButton::Other(_) => return,
        });

        let held = self.pointers[device].buttons;
        let (phase, buttons) = match state {
            ElementState::Pressed if held & button != 0 => return,
            ElementState::Pressed if held == 0 => (FlutterPointerPhase::Down, button),
            ElementState::Pressed => (FlutterPointerPhase::Move, held | button),
            ElementState::Released if held & button == 0 => return,
            ElementState::Released if held == button => (FlutterPointerPhase::Up, 0),
            ElementState::Released => (FlutterPointerPhase::Move, held & !button),
        };
        self.pointers[device].buttons = buttons;
        self.send(device, phase, FlutterPointerSignalKind::None, (0.0, 0.0));
    }

    pub fn wheel(&mut self, device_id: DeviceId, delta: MouseScrollDelta) {
        let device = self.index(device_id);
        self.ensure_added(device);
        let delta = match delta {
            MouseScrollDelta::LineDelta(x, y) => (
                -f64::from(x) * SCROLL_LINE_PIXELS,
                -f64::from(y) * SCROLL_LINE_PIXELS,
            ),
            MouseScrollDelta::PixelDelta(position) => (-position.x, -position.y),
        };
        let phase = self.motion_phase(device);
        self.send(device, phase, FlutterPointerSignalKind::Scroll, delta);
    }

    pub fn touch(&mut self, id: u64, phase: TouchPhase, position: PhysicalPosition<f64>) {
        let phases: &[FlutterPointerPhase] = match phase {
            TouchPhase::Started => &[FlutterPointerPhase::Add, FlutterPointerPhase::Down],
            TouchPhase::Moved => &[FlutterPointerPhase::Move],
            TouchPhase::Ended => &[FlutterPointerPhase::Up, FlutterPointerPhase::Remove],
            TouchPhase::Cancelled => &[FlutterPointerPhase::Cancel, FlutterPointerPhase::Remove],
        };
        let slot = self.touch_slot(id);
        for phase in phases {
            self.engine.send_pointer_event(FlutterPointerEvent::new(
                TOUCH_DEVICE_BASE + slot as i32,
                *phase,
                position,
                FlutterPointerSignalKind::None,
                (0.0, 0.0),
                FlutterPointerDeviceKind::Touch,
                0,
                self.view_id,
            ));
        }
        if matches!(phase, TouchPhase::Ended | TouchPhase::Cancelled) {
            self.touches[slot] = None;
        }
    }

    fn touch_slot(&mut self, id: u64) -> usize {
        if let Some(slot) = self.touches.iter().position(|t| *t == Some(id)) {
            return slot;
        }
        match self.touches.iter().position(Option::is_none) {
            Some(slot) => {
                self.touches[slot] = Some(id);
                slot
            }
            None => {
                self.touches.push(Some(id));
                self.touches.len() - 1
            }
        }
    }
}
