//! GPU device + frame control.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue as an explicit context
//!   object (no global device singleton)
//! - owning the presentation target: a window surface or a headless
//!   backbuffer ring
//! - driving the begin-frame / record / submit / present / synchronize cycle

mod context;
mod frame;
mod init;
mod present;

pub use context::{ContextInit, DeviceContext};
pub use frame::{FRAME_COUNT, Frame, FrameController};
pub use init::DeviceInit;
