//! Logger setup.
//!
//! The crate itself only emits through the `log` facade; this module wires
//! up an `env_logger` backend for binaries and tests that want one.

mod init;

pub use init::{LoggingConfig, init_logging};
