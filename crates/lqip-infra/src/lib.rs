//! LQIP Infrastructure Library
//!
//! Tracing initialisation and error reporting shared by the binaries.

pub mod error;
pub mod telemetry;

pub use error::report_error;
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
