//! Infrastructure layer - platform-specific implementations
//!
//! This module contains the platform seams the vault core depends on and their
//! concrete host-side implementations.

pub mod platform;

// Re-export infrastructure components
pub use platform::*;
