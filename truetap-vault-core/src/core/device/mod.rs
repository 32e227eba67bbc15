//! Device capability detection
//!
//! [`SeekerDeviceValidator`] decides whether the hardware Seed Vault can be
//! used; [`FallbackWalletHandler`] looks for wallet apps that can sign over
//! Mobile Wallet Adapter instead. Neither picks a backend on its own:
//! [`available_backends`] lists every usable one and leaves the choice to the
//! caller.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::infrastructure::platform::DeviceProbe;
use crate::shared::config::FallbackWallet;
use crate::shared::constants::*;
use crate::shared::types::{DeviceValidationResult, WalletBackend};

pub struct SeekerDeviceValidator {
    probe: Arc<dyn DeviceProbe>,
}

impl SeekerDeviceValidator {
    pub fn new(probe: Arc<dyn DeviceProbe>) -> Self {
        Self { probe }
    }

    /// Run every capability check and collect the failures. No single
    /// failing check stops the others.
    pub fn validate_device(&self) -> DeviceValidationResult {
        let build = self.probe.build_info();
        let mut errors = Vec::new();

        let hardware_match = self.is_likely_seeker();
        if !hardware_match {
            errors.push(format!(
                "Device '{}' by '{}' is not a Solana Seeker",
                build.model, build.manufacturer
            ));
        }

        let package_installed = self.probe.is_package_installed(SEED_VAULT_PACKAGE);
        let seed_vault_version = if package_installed {
            self.probe.package_version(SEED_VAULT_PACKAGE)
        } else {
            errors.push(format!("Seed Vault package {} is not installed", SEED_VAULT_PACKAGE));
            None
        };

        let service_resolvable = self.probe.resolves_service(SEED_VAULT_SERVICE);
        if !service_resolvable {
            errors.push("Seed Vault service is not resolvable".to_string());
        }

        let platform_supported = build.platform_version >= MIN_SEED_VAULT_PLATFORM_VERSION;
        if !platform_supported {
            errors.push(format!(
                "Platform version {} is below the required {}",
                build.platform_version, MIN_SEED_VAULT_PLATFORM_VERSION
            ));
        }

        let missing: Vec<&str> = REQUIRED_ACTIONS
            .iter()
            .copied()
            .filter(|action| !self.probe.resolves_action(action))
            .collect();
        if !missing.is_empty() {
            errors.push(format!("Seed Vault actions not resolvable: {}", missing.join(", ")));
        }

        let has_seed_vault = package_installed && service_resolvable && platform_supported && missing.is_empty();
        let result = DeviceValidationResult {
            is_genuine_seeker: hardware_match && has_seed_vault,
            has_seed_vault,
            seed_vault_version,
            device_info: build.describe(),
            validation_errors: errors,
        };

        log::info!(
            "Device validation: seeker={} seed_vault={} ({} issue(s))",
            result.is_genuine_seeker,
            result.has_seed_vault,
            result.validation_errors.len()
        );
        for error in &result.validation_errors {
            log::debug!("Validation: {}", error);
        }
        result
    }

    /// Model/manufacturer match only
    pub fn is_likely_seeker(&self) -> bool {
        let build = self.probe.build_info();
        let model = build.model.trim();
        let manufacturer = build.manufacturer.trim();
        SEEKER_MODELS.iter().any(|m| m.eq_ignore_ascii_case(model))
            && SOLANA_MOBILE_MANUFACTURERS
                .iter()
                .any(|m| m.eq_ignore_ascii_case(manufacturer))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackAvailability {
    pub is_available: bool,
    pub installed_wallets: Vec<FallbackWallet>,
    pub message: String,
}

/// Finds wallet apps that can sign when the hardware vault is unavailable
pub struct FallbackWalletHandler {
    probe: Arc<dyn DeviceProbe>,
    wallets: Vec<FallbackWallet>,
}

impl FallbackWalletHandler {
    pub fn new(probe: Arc<dyn DeviceProbe>, wallets: Vec<FallbackWallet>) -> Self {
        Self { probe, wallets }
    }

    pub fn wallets(&self) -> &[FallbackWallet] {
        &self.wallets
    }

    pub fn check_availability(&self) -> FallbackAvailability {
        let installed: Vec<FallbackWallet> = self
            .wallets
            .iter()
            .filter(|wallet| self.probe.is_package_installed(&wallet.package))
            .cloned()
            .collect();

        let message = if installed.is_empty() {
            let labels: Vec<&str> = self.wallets.iter().map(|w| w.label.as_str()).collect();
            if labels.is_empty() {
                "No compatible wallet app is installed".to_string()
            } else {
                format!("No compatible wallet app is installed. Install one of: {}", labels.join(", "))
            }
        } else {
            let labels: Vec<&str> = installed.iter().map(|w| w.label.as_str()).collect();
            format!("Compatible wallet found: {}", labels.join(", "))
        };

        log::debug!("{}", message);
        FallbackAvailability {
            is_available: !installed.is_empty(),
            installed_wallets: installed,
            message,
        }
    }
}

/// Every backend the device can use, in no particular order of preference
pub fn available_backends(validation: &DeviceValidationResult, fallback: &FallbackAvailability) -> Vec<WalletBackend> {
    let mut backends = Vec::new();
    if validation.has_seed_vault {
        backends.push(WalletBackend::SeedVault);
    }
    if fallback.is_available {
        backends.push(WalletBackend::MobileWalletAdapter);
    }
    backends
}
