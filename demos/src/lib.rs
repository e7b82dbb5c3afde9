//! Shared setup for the v3dkit command-line tools

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
