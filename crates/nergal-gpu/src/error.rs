//! Central error handling for the GPU core.
//!
//! One taxonomy for everything fallible in this crate:
//! - `Init`: device/surface/heap creation failing during setup. Fatal; no
//!   partial device is exposed to callers.
//! - `Frame`: per-frame acquisition/submission/presentation failures. The
//!   frame must not present.
//! - `Upload`: staging/copy/wait failures during asset load.
//! - `Readback`: copy-to-host failures (test and capture paths).
//! - `Contract`: programming errors — stale handles, out-of-order state
//!   transitions, unwritten descriptor slots. These are reported loudly
//!   instead of being tolerated, because they map to undefined GPU behavior.

/// Centralized error type for all GPU core operations.
#[derive(thiserror::Error, Debug)]
pub enum GpuError {
    #[error("init error: {0}")]
    Init(String),

    #[error("frame error: {0}")]
    Frame(String),

    #[error("upload error: {0}")]
    Upload(String),

    #[error("readback error: {0}")]
    Readback(String),

    #[error("contract violation: {0}")]
    Contract(String),
}

impl GpuError {
    pub fn init<T: ToString>(msg: T) -> Self {
        GpuError::Init(msg.to_string())
    }

    pub fn frame<T: ToString>(msg: T) -> Self {
        GpuError::Frame(msg.to_string())
    }

    pub fn upload<T: ToString>(msg: T) -> Self {
        GpuError::Upload(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        GpuError::Readback(msg.to_string())
    }

    pub fn contract<T: ToString>(msg: T) -> Self {
        GpuError::Contract(msg.to_string())
    }
}

/// Result type alias for GPU core operations.
pub type GpuResult<T> = Result<T, GpuError>;
