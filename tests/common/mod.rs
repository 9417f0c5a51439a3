//! Shared helpers for the integration tests.
//!
//! - `logger`: per-test structured logging to stderr
//! - `log_capture`: capture `tracing` events emitted by the library
//!
//! Backend doubles come from `euk::test_utils` plus `wiremock`.

pub mod log_capture;
pub mod logger;
