//! Platform-specific implementations
//!
//! The vault core never talks to Android directly. Everything it needs from the
//! host platform goes through two seams:
//!
//! - [`PlatformBridge`]: checks whether a handler exists for a Seed Vault
//!   action and launches requests. Completions come back later through
//!   `handle_activity_result` on the provider.
//! - [`DeviceProbe`]: read-only device facts (build identifiers, installed
//!   packages, resolvable services and actions).
//!
//! [`ChannelBridge`] and [`DeviceSnapshot`] are the concrete implementations
//! used by a host that forwards requests over IPC and reports device facts as
//! a snapshot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::core::derivation::DerivationPath;
use crate::shared::error::{VaultError, VaultResult};
use crate::shared::types::RequestCode;

/// A request issued to the platform's Seed Vault surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRequest {
    pub request_code: RequestCode,
    pub action: String,
    pub payload: Option<Vec<u8>>,
    pub derivation_path: Option<DerivationPath>,
    pub auth_token: Option<u64>,
}

/// Launch surface for Seed Vault requests
#[async_trait]
pub trait PlatformBridge: Send + Sync {
    /// Whether a handler is registered for `action`
    async fn resolves(&self, action: &str) -> bool;

    /// Issue a request. Returns once the request has been handed to the
    /// platform, not when it completes.
    async fn launch(&self, request: PlatformRequest) -> VaultResult<()>;
}

/// Build identifiers reported by the device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub manufacturer: String,
    pub model: String,
    pub brand: String,
    pub device: String,
    pub platform_version: u32,
}

impl BuildInfo {
    pub fn describe(&self) -> String {
        format!(
            "{} {} ({}/{}, platform {})",
            self.manufacturer, self.model, self.brand, self.device, self.platform_version
        )
    }
}

/// Read-only device facts used for capability detection
#[cfg_attr(test, mockall::automock)]
pub trait DeviceProbe: Send + Sync {
    fn build_info(&self) -> BuildInfo;

    fn is_package_installed(&self, package: &str) -> bool;

    fn package_version(&self, package: &str) -> Option<String>;

    fn resolves_service(&self, service: &str) -> bool;

    fn resolves_action(&self, action: &str) -> bool;
}

// Channel-backed bridge
pub struct ChannelBridge {
    actions: Mutex<HashSet<String>>,
    outbound: mpsc::UnboundedSender<PlatformRequest>,
}

/// Host side of a [`ChannelBridge`]: receives launched requests
pub struct BridgeHost {
    inbound: mpsc::UnboundedReceiver<PlatformRequest>,
}

impl ChannelBridge {
    /// Create a bridge that resolves `actions` and forwards launches to the
    /// returned host handle
    pub fn new<I, S>(actions: I) -> (Self, BridgeHost)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (outbound, inbound) = mpsc::unbounded_channel();
        let bridge = Self {
            actions: Mutex::new(actions.into_iter().map(Into::into).collect()),
            outbound,
        };
        (bridge, BridgeHost { inbound })
    }

    pub fn register_action(&self, action: impl Into<String>) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.insert(action.into());
        }
    }

    pub fn unregister_action(&self, action: &str) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.remove(action);
        }
    }
}

#[async_trait]
impl PlatformBridge for ChannelBridge {
    async fn resolves(&self, action: &str) -> bool {
        self.actions
            .lock()
            .map(|actions| actions.contains(action))
            .unwrap_or(false)
    }

    async fn launch(&self, request: PlatformRequest) -> VaultResult<()> {
        log::debug!("Forwarding request {} ({}) to platform host", request.request_code, request.action);
        self.outbound
            .send(request)
            .map_err(|_| VaultError::platform("Platform host is not listening"))
    }
}

impl BridgeHost {
    /// Next launched request, or `None` once the bridge is dropped
    pub async fn next_request(&mut self) -> Option<PlatformRequest> {
        self.inbound.recv().await
    }

    /// Non-blocking poll for a launched request
    pub fn try_next_request(&mut self) -> Option<PlatformRequest> {
        self.inbound.try_recv().ok()
    }
}

/// Device facts captured once and served from memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub build: BuildInfo,
    /// Installed package -> version name, when known
    pub packages: HashMap<String, Option<String>>,
    pub services: HashSet<String>,
    pub actions: HashSet<String>,
}

impl DeviceSnapshot {
    pub fn new(build: BuildInfo) -> Self {
        Self {
            build,
            ..Self::default()
        }
    }

    /// Best-effort snapshot of the current host. Non-mobile hosts report no
    /// vendor packages, so callers fall back to the simulated vault.
    pub fn detect() -> Self {
        #[cfg(target_os = "android")]
        let model = "android".to_string();
        #[cfg(not(target_os = "android"))]
        let model = sys_info::os_type().unwrap_or_else(|_| "unknown".to_string());
        #[cfg(not(target_os = "android"))]
        let version = sys_info::os_release().unwrap_or_else(|_| "unknown".to_string());
        #[cfg(target_os = "android")]
        let version = "unknown".to_string();

        Self::new(BuildInfo {
            manufacturer: "unknown".to_string(),
            model,
            brand: version,
            device: std::env::consts::ARCH.to_string(),
            platform_version: 0,
        })
    }

    /// Parse a snapshot serialized by the host
    pub fn from_json(json: &str) -> VaultResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_package(mut self, package: impl Into<String>, version: Option<&str>) -> Self {
        self.packages.insert(package.into(), version.map(str::to_string));
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.services.insert(service.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.insert(action.into());
        self
    }
}

impl DeviceProbe for DeviceSnapshot {
    fn build_info(&self) -> BuildInfo {
        self.build.clone()
    }

    fn is_package_installed(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    fn package_version(&self, package: &str) -> Option<String> {
        self.packages.get(package).cloned().flatten()
    }

    fn resolves_service(&self, service: &str) -> bool {
        self.services.contains(service)
    }

    fn resolves_action(&self, action: &str) -> bool {
        self.actions.contains(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::*;

    #[tokio::test]
    async fn test_channel_bridge_forwards_requests() {
        let (bridge, mut host) = ChannelBridge::new([ACTION_SIGN_MESSAGE]);
        assert!(bridge.resolves(ACTION_SIGN_MESSAGE).await);
        assert!(!bridge.resolves(ACTION_SIGN_TRANSACTION).await);

        let request = PlatformRequest {
            request_code: REQUEST_SIGN_MESSAGE,
            action: ACTION_SIGN_MESSAGE.to_string(),
            payload: Some(vec![1, 2, 3]),
            derivation_path: Some(DerivationPath::default()),
            auth_token: Some(7),
        };
        bridge.launch(request.clone()).await.expect("launch");
        assert_eq!(host.next_request().await, Some(request));
    }

    #[tokio::test]
    async fn test_channel_bridge_registration() {
        let (bridge, _host) = ChannelBridge::new(Vec::<String>::new());
        bridge.register_action(ACTION_GET_PUBLIC_KEY);
        assert!(bridge.resolves(ACTION_GET_PUBLIC_KEY).await);
        bridge.unregister_action(ACTION_GET_PUBLIC_KEY);
        assert!(!bridge.resolves(ACTION_GET_PUBLIC_KEY).await);
    }

    #[tokio::test]
    async fn test_launch_fails_when_host_is_gone() {
        let (bridge, host) = ChannelBridge::new([ACTION_SIGN_MESSAGE]);
        drop(host);
        let result = bridge
            .launch(PlatformRequest {
                request_code: REQUEST_SIGN_MESSAGE,
                action: ACTION_SIGN_MESSAGE.to_string(),
                payload: None,
                derivation_path: None,
                auth_token: None,
            })
            .await;
        assert!(matches!(result, Err(VaultError::Platform(_))));
    }

    #[test]
    fn test_device_snapshot_probe() {
        let snapshot = DeviceSnapshot::new(BuildInfo::default())
            .with_package(SEED_VAULT_PACKAGE, Some("1.2.0"))
            .with_package("app.phantom", None)
            .with_service(SEED_VAULT_SERVICE)
            .with_action(ACTION_SIGN_MESSAGE);

        assert!(snapshot.is_package_installed(SEED_VAULT_PACKAGE));
        assert_eq!(snapshot.package_version(SEED_VAULT_PACKAGE), Some("1.2.0".to_string()));
        assert_eq!(snapshot.package_version("app.phantom"), None);
        assert!(snapshot.resolves_service(SEED_VAULT_SERVICE));
        assert!(snapshot.resolves_action(ACTION_SIGN_MESSAGE));
        assert!(!snapshot.resolves_action(ACTION_SIGN_TRANSACTION));
    }

    #[test]
    fn test_device_snapshot_json() {
        let json = r#"{
            "build": {"manufacturer": "Solana Mobile", "model": "Seeker", "brand": "solanamobile", "device": "seeker", "platform_version": 34},
            "packages": {"com.solanamobile.seedvault": "1.0.0"},
            "services": [],
            "actions": []
        }"#;
        let snapshot = DeviceSnapshot::from_json(json).expect("parse snapshot");
        assert_eq!(snapshot.build.model, "Seeker");
        assert!(snapshot.is_package_installed(SEED_VAULT_PACKAGE));
        assert!(DeviceSnapshot::from_json("not json").is_err());
    }

    #[test]
    fn test_detect_host() {
        let snapshot = DeviceSnapshot::detect();
        assert!(!snapshot.build.model.is_empty());
        assert!(snapshot.packages.is_empty());
    }
}
