//! Flutter embedder core: application setup, the platform event loop and
//! the bridge from host window events to the engine.

pub mod application;
pub mod event;
pub mod event_loop;
pub mod handler;
pub mod keyboard;
pub mod logging;
pub mod pointer;

pub use application::{Application, ApplicationBuildError, ApplicationBuilder, ApplicationRunError};
pub use event_loop::{EventLoop, EventLoopProxy, LoopEvent};
