//! Utility functions.

pub mod env;
pub mod fs;

pub use env::should_use_color;
pub use fs::write_atomic;
