//! Plain Rust mirrors of the values that cross the engine boundary.
//!
//! A [`FlutterEngineBinding`](crate::binding::FlutterEngineBinding)
//! implementation converts these into whatever representation the wrapped
//! engine library expects.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dpi::{PhysicalPosition, PhysicalSize};

pub type FlutterViewId = i64;

// Warning: The implicit view ID value needs to be kept in sync with the
// `kFlutterImplicitViewId` constant on the engine side.
pub const IMPLICIT_VIEW_ID: FlutterViewId = 0;

/// Opaque task token handed out by the engine through `post_task`.
///
/// The embedder never looks inside; it only hands the token back to
/// [`FlutterEngineBinding::run_task`](crate::binding::FlutterEngineBinding::run_task)
/// once the task is due.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlutterTask {
    pub runner: usize,
    pub task: u64,
}

impl FlutterTask {
    pub const fn new(runner: usize, task: u64) -> Self {
        Self { runner, task }
    }
}

/// Engine side handle identifying an incoming platform message that expects
/// a response.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlutterResponseHandle(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FlutterPointerPhase {
    Cancel,
    Up,
    Down,
    Move,
    Add,
    Remove,
    Hover,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FlutterPointerDeviceKind {
    Mouse,
    Touch,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FlutterPointerSignalKind {
    None,
    Scroll,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FlutterPointerMouseButtons {
    None = 0,
    Primary = 1,
    Secondary = 2,
    Middle = 4,
    Back = 8,
    Forward = 16,
}

impl From<FlutterPointerMouseButtons> for i64 {
    fn from(btn: FlutterPointerMouseButtons) -> Self {
        btn as i64
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlutterPointerEvent {
    pub timestamp: Duration,
    pub device: i32,
    pub phase: FlutterPointerPhase,
    pub position: PhysicalPosition<f64>,
    pub signal_kind: FlutterPointerSignalKind,
    pub scroll_delta: (f64, f64),
    pub device_kind: FlutterPointerDeviceKind,
    pub buttons: i64,
    pub view_id: FlutterViewId,
}

impl FlutterPointerEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: i32,
        phase: FlutterPointerPhase,
        position: PhysicalPosition<f64>,
        signal_kind: FlutterPointerSignalKind,
        scroll_delta: (f64, f64),
        device_kind: FlutterPointerDeviceKind,
        buttons: i64,
        view_id: FlutterViewId,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Self {
            timestamp,
            device,
            phase,
            position,
            signal_kind,
            scroll_delta,
            device_kind,
            buttons,
            view_id,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlutterWindowMetricsEvent {
    pub view_id: FlutterViewId,
    pub size: PhysicalSize<u32>,
    pub pixel_ratio: f64,
}

impl FlutterWindowMetricsEvent {
    pub fn new(view_id: FlutterViewId, size: PhysicalSize<u32>, pixel_ratio: f64) -> Self {
        Self {
            view_id,
            size,
            pixel_ratio,
        }
    }
}

/// Configuration handed to the engine library when it starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlutterProjectArgs {
    pub assets_path: PathBuf,
    pub icu_data_path: PathBuf,
    pub aot_library_path: PathBuf,
    pub persistent_cache_path: PathBuf,
    /// Engine switches, without the leading executable name.
    pub command_line_args: Vec<String>,
}
