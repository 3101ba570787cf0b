//! GPU command submission and resource-lifecycle core.
//!
//! This crate owns the pieces of a renderer that talk to the GPU directly:
//! - the device context and the begin/record/submit/present frame cycle
//! - CPU–GPU synchronization (fence counter over queue submissions)
//! - staged uploads of CPU bytes into device-local buffers and textures
//! - shader-visible descriptor allocation
//! - binding-layout and pipeline-configuration builders
//! - offscreen render targets with scoped begin/end transitions
//!
//! Scene graphs, materials, asset parsing and the window/message loop live
//! above this crate and consume its services.

pub mod descriptor;
pub mod device;
pub mod offscreen;
pub mod pipeline;
pub mod resource;
pub mod sync;
pub mod upload;

pub mod error;
pub mod logging;

pub use error::{GpuError, GpuResult};
