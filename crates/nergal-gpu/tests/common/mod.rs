use nergal_gpu::device::{ContextInit, DeviceContext};
use nergal_gpu::logging::{LoggingConfig, init_logging};

/// Acquires a headless context, or `None` when the machine has no usable
/// adapter (CI without a GPU or software rasterizer).
pub fn test_context() -> Option<DeviceContext> {
    init_logging(LoggingConfig::default());
    match DeviceContext::headless(&ContextInit::default()) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}
