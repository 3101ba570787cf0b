//! Logger setup for applications embedding the GPU core.

mod init;

pub use init::{LoggingConfig, init_logging};
