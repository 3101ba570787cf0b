//! Offscreen render targets.
//!
//! The manager owns every offscreen texture/view triple and hands out opaque
//! handles, so callers never touch the raw resources. Each target moves
//! through a two-state machine: begin transitions it render-target-writable
//! and opens a cleared, viewport-scoped pass; end transitions it back to
//! shader-readable.

mod target;

pub use target::{RenderTargetHandle, RenderTargetManager, TargetState};
