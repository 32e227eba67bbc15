use anyhow::Context;
use std::sync::Arc;

use truetap_vault_core::shared::utils::bytes_to_hex;
use truetap_vault_core::{
    available_backends, DerivationPath, DeviceProbe, DeviceSnapshot, FakeSeedVaultProvider, FallbackWalletHandler,
    SeekerDeviceValidator, VaultConfig,
};

fn main() -> anyhow::Result<()> {
    if let Err(e) = truetap_vault_core::init() {
        eprintln!("Logging disabled: {}", e);
    }

    let config = VaultConfig::from_env().context("Failed to load vault configuration")?;

    // A host may hand us its device snapshot as JSON
    let snapshot = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
            DeviceSnapshot::from_json(&json).with_context(|| format!("Invalid device snapshot in {}", path))?
        }
        None => DeviceSnapshot::detect(),
    };
    let probe: Arc<dyn DeviceProbe> = Arc::new(snapshot);

    let validation = SeekerDeviceValidator::new(probe.clone()).validate_device();
    let handler = FallbackWalletHandler::new(probe, config.fallback_wallets.clone());
    let fallback = handler.check_availability();

    println!("TrueTap Vault Core {} configuration:\n", truetap_vault_core::VERSION);
    println!("{}", serde_json::to_string_pretty(&config)?);

    println!("\nDevice: {}", validation.device_info);
    println!("  Genuine Seeker: {}", validation.is_genuine_seeker);
    println!("  Seed Vault: {}", validation.has_seed_vault);
    println!(
        "  Seed Vault version: {}",
        validation.seed_vault_version.as_deref().unwrap_or("(unknown)")
    );
    for error in &validation.validation_errors {
        println!("  - {}", error);
    }

    println!("\nFallback wallets: {}", fallback.message);
    for wallet in handler.wallets() {
        let installed = fallback.installed_wallets.iter().any(|w| w.package == wallet.package);
        println!("  - {} ({}){}", wallet.label, wallet.package, if installed { " installed" } else { "" });
    }
    let backends: Vec<&str> = available_backends(&validation, &fallback)
        .iter()
        .map(|b| b.name())
        .collect();
    println!(
        "Available backends: {}",
        if backends.is_empty() { "(none)".to_string() } else { backends.join(", ") }
    );

    if config.force_fake_vault || !validation.has_seed_vault {
        if let Some(seed) = config.fake_seed {
            let key = FakeSeedVaultProvider::new(Some(seed)).public_key_for(&DerivationPath::default_account());
            println!("\nSimulated vault key ({}): {}", DerivationPath::default_account(), bytes_to_hex(&key));
        } else {
            println!("\nSimulated vault uses a random seed per session");
        }
    }

    println!("Report generated at {}", chrono::Utc::now().to_rfc3339());
    Ok(())
}
