//! CPU–GPU synchronization.
//!
//! The GPU executes asynchronously after submission; the only way to know
//! that submitted work has completed is a fence wait. One [`FenceCounter`]
//! exists per queue that needs synchronization: the frame controller keeps a
//! steady-state instance, and the upload engine creates a transient one per
//! upload.

mod fence;

pub use fence::FenceCounter;
