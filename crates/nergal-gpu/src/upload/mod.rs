//! Staged uploads into device-local memory.
//!
//! One consolidated engine replaces the per-loader copy helpers a renderer
//! tends to accumulate. Uploads are synchronous and blocking by design: they
//! trade load-time latency for simplicity and are never issued per frame.

mod engine;

pub use engine::{TextureUploadDesc, UploadEngine, align_copy_bytes_per_row};
