//! TrueTap Vault Core
//!
//! Key-custody layer for TrueTap on Solana Mobile devices.
//! Talks to the on-device Seed Vault through a platform bridge, falls back to
//! a simulated vault elsewhere, and offers a uniform connector contract over
//! Seed Vault and Mobile Wallet Adapter signing.
//!
//! ## Architecture
//!
//! - **Core**: derivation paths, transaction framing, providers, the session
//!   manager, connectors and device detection
//! - **Infrastructure**: platform seams (`PlatformBridge`, `DeviceProbe`) and
//!   their channel/snapshot implementations
//! - **Shared**: common types, constants, configuration and errors
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use truetap_vault_core::{init_vault_core, ChannelBridge, DeviceSnapshot, VaultConfig};
//!
//! # async fn run() -> Result<(), truetap_vault_core::VaultError> {
//! let config = VaultConfig::from_env()?;
//! let (bridge, _host) = ChannelBridge::new(Vec::<String>::new());
//! let core = init_vault_core(config, Arc::new(bridge), Arc::new(DeviceSnapshot::detect())).await?;
//!
//! if let Some(key) = core.manager.initialize_and_authorize().await {
//!     println!("Connected as {}", key);
//! }
//! core.shutdown();
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod core;
pub mod infrastructure;
pub mod shared;

pub use crate::core::connector::{
    ActivityHandle, ActivityResultSender, ConnectParams, ConnectionResult, MobileWalletAdapterClient, MwaOutcome,
    MwaWalletConnector, SeedVaultWalletConnector, SignMessageParams, SignTransactionParams, WalletConnection,
    WalletConnector, WalletResult,
};
pub use crate::core::device::{available_backends, FallbackAvailability, FallbackWalletHandler, SeekerDeviceValidator};
pub use crate::core::{DerivationPath, FakeSeedVaultProvider, RealSeedVaultProvider, SeedVaultManager, SeedVaultProvider};
pub use infrastructure::platform::{BridgeHost, BuildInfo, ChannelBridge, DeviceProbe, DeviceSnapshot, PlatformBridge};
pub use shared::config::VaultConfig;
pub use shared::error::{VaultError, VaultResult};
pub use shared::types::{
    AuthResult, DeviceValidationResult, ProviderInfo, PublicKeyResult, SessionPhase, SignedTransaction,
    SigningResult, VaultPublicKey, VaultState, WalletBackend,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging. Fails if a logger is already installed.
pub fn init() -> Result<(), VaultError> {
    env_logger::try_init().map_err(|e| VaultError::config(format!("Failed to initialize logging: {}", e)))
}

/// Probe the device and build a vault session.
///
/// The provider is chosen once here: the hardware Seed Vault when the device
/// reports one and the bridge can reach it, the simulated vault otherwise or
/// when `force_fake_vault` is set.
pub async fn init_vault_core(
    config: VaultConfig,
    bridge: Arc<dyn PlatformBridge>,
    probe: Arc<dyn DeviceProbe>,
) -> Result<VaultCore, VaultError> {
    let validation = SeekerDeviceValidator::new(probe.clone()).validate_device();
    let fallback = FallbackWalletHandler::new(probe, config.fallback_wallets.clone()).check_availability();

    let provider: Arc<dyn SeedVaultProvider> = if config.force_fake_vault {
        log::info!("Simulated Seed Vault forced by configuration");
        Arc::new(FakeSeedVaultProvider::new(config.fake_seed))
    } else if validation.has_seed_vault {
        let real = RealSeedVaultProvider::new(bridge);
        if real.is_available().await {
            Arc::new(real)
        } else {
            log::warn!("Device reports Seed Vault but the bridge cannot reach it; using simulated vault");
            Arc::new(FakeSeedVaultProvider::new(config.fake_seed))
        }
    } else {
        log::info!("No Seed Vault on {}; using simulated vault", validation.device_info);
        Arc::new(FakeSeedVaultProvider::new(config.fake_seed))
    };

    let info = provider.provider_info();
    log::info!("Vault core {} using {} {}", VERSION, info.name, info.version);

    let manager = Arc::new(SeedVaultManager::new(provider));
    let seed_vault = SeedVaultWalletConnector::new(manager.clone());

    Ok(VaultCore {
        config,
        validation,
        fallback,
        manager,
        seed_vault,
        started_at: Utc::now(),
    })
}

/// A vault session: the selected provider behind its manager, plus the
/// device facts it was selected from
pub struct VaultCore {
    pub config: VaultConfig,
    pub validation: DeviceValidationResult,
    pub fallback: FallbackAvailability,
    pub manager: Arc<SeedVaultManager>,
    pub seed_vault: SeedVaultWalletConnector,
    pub started_at: DateTime<Utc>,
}

impl VaultCore {
    pub fn is_simulated(&self) -> bool {
        self.manager.provider_info().is_fake
    }

    /// Usable signing backends, unranked
    pub fn backends(&self) -> Vec<WalletBackend> {
        available_backends(&self.validation, &self.fallback)
    }

    /// Mobile Wallet Adapter connector using the configured identity and cluster
    pub fn mwa_connector(&self, client: Arc<dyn MobileWalletAdapterClient>) -> MwaWalletConnector {
        MwaWalletConnector::new(client, self.config.identity.clone(), self.config.cluster)
    }

    /// End the session and drop any authorization
    pub fn shutdown(&self) {
        self.manager.disconnect();
        log::info!("Vault core shut down after {}s", (Utc::now() - self.started_at).num_seconds());
    }
}

impl Drop for VaultCore {
    fn drop(&mut self) {
        log::debug!("VaultCore dropped");
    }
}
