//! GPU resources and their usage-state machine.
//!
//! Every block of GPU-addressable memory is wrapped in a [`GpuResource`] that
//! tracks exactly one active usage state. Code records an explicit
//! [`GpuResource::transition`] before each new usage; the tracker validates
//! the transition and wgpu inserts the matching hardware barrier when the
//! commands execute. An illegal transition is a contract violation, because
//! the equivalent untracked usage would be undefined GPU behavior.

mod state;
mod typed;

pub use state::{GpuResource, ResourceKind, UsageState, validate_transition};
pub use typed::TypedBuffer;
