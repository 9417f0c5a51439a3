//! euk - EUK console
//!
//! Backend access layer and command-line console for the EUK social-welfare
//! case-management system: categories, cases, beneficiaries (T1/T2), user and
//! route administration, license status and document printing.
//!
//! All backend traffic goes through [`core::client::ApiClient`], which owns
//! request throttling, in-flight deduplication, response caching and retry
//! with exponential backoff.

// Note: deny (not forbid) to allow #[allow(unsafe_code)] in test helpers for env var manipulation
#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod render;
pub mod services;
pub mod storage;
pub mod util;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{EukError, ExitCode, Result};

// Re-export test utilities for external test crates
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;
