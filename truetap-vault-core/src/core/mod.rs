//! Core vault functionality
//!
//! Derivation paths, transaction framing, custody providers, the session
//! manager, wallet connectors and device capability detection.

pub mod derivation;
pub mod transactions;
pub mod provider;
pub mod manager;
pub mod connector;
pub mod device;

pub use derivation::DerivationPath;
pub use manager::SeedVaultManager;
pub use provider::{FakeSeedVaultProvider, RealSeedVaultProvider, SeedVaultProvider};
