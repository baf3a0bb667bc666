//! Domain Ports - Collaborator traits for the host dashboard
//!
//! These traits define the boundaries between the reconciliation logic and
//! the services it reads from. Adapters implement these traits to provide
//! concrete functionality; tests substitute in-memory fakes.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// OSD (object storage daemon) identifier
pub type OsdId = u32;

// =============================================================================
// Local Registry Types
// =============================================================================

/// A daemon reported by the local registry for a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    /// Daemon type (e.g. `osd`, `mon`, `mgr`)
    #[serde(rename = "type")]
    pub service_type: String,
    /// Daemon id within its type
    pub id: String,
}

impl ServiceRef {
    pub fn new(service_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            id: id.into(),
        }
    }
}

/// A server known to the local daemon registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalServer {
    pub hostname: String,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(default)]
    pub ceph_version: String,
}

impl LocalServer {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            services: Vec::new(),
            ceph_version: String::new(),
        }
    }
}

// =============================================================================
// Orchestrator Types
// =============================================================================

/// Status the orchestrator reports for hosts in maintenance mode
pub const MAINTENANCE_STATUS: &str = "maintenance";

/// Host as described by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    pub hostname: String,
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub status: String,
}

impl HostSpec {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            addr: String::new(),
            labels: Vec::new(),
            status: String::new(),
        }
    }

    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// A storage device discovered by the orchestrator
///
/// Only `path` is interpreted; every other attribute is carried through to
/// API consumers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device path, with or without the `/dev/` prefix
    pub path: String,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Device {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: serde_json::Map::new(),
        }
    }
}

/// Device inventory of one host as reported by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryHost {
    pub name: String,
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Kind of device indicator light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Ident,
    Fault,
}

impl std::fmt::Display for LightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LightKind::Ident => write!(f, "ident"),
            LightKind::Fault => write!(f, "fault"),
        }
    }
}

// =============================================================================
// OSD Metadata Types
// =============================================================================

/// Per-OSD metadata relevant to device mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsdMetadata {
    #[serde(default)]
    pub hostname: Option<String>,
    /// Comma-separated device names, e.g. `nvme0n1,sdb`
    #[serde(default)]
    pub devices: Option<String>,
}

impl OsdMetadata {
    pub fn new(hostname: impl Into<String>, devices: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            devices: Some(devices.into()),
        }
    }
}

// =============================================================================
// Local Registry Port
// =============================================================================

/// Port for the local daemon registry
pub trait LocalRegistry: Send + Sync {
    /// List servers known to the cluster daemons
    fn list_local_hosts(&self) -> Vec<LocalServer>;
}

// =============================================================================
// Orchestrator Port
// =============================================================================

/// Port for the external orchestrator service
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// Whether an orchestrator backend is configured and reachable
    async fn available(&self) -> bool;

    /// List hosts managed by the orchestrator
    async fn list_hosts(&self) -> Result<Vec<HostSpec>>;

    /// Add a host
    async fn add_host(&self, spec: HostSpec) -> Result<()>;

    /// Remove a host
    async fn remove_host(&self, hostname: &str) -> Result<()>;

    /// Attach a label to a host
    async fn add_label(&self, hostname: &str, label: &str) -> Result<()>;

    /// Detach a label from a host
    async fn remove_label(&self, hostname: &str, label: &str) -> Result<()>;

    /// Put a host into maintenance mode
    async fn enter_maintenance(&self, hostname: &str, force: bool) -> Result<()>;

    /// Take a host out of maintenance mode
    async fn exit_maintenance(&self, hostname: &str) -> Result<()>;

    /// Switch a device indicator light on or off
    async fn blink_device_light(
        &self,
        hostname: &str,
        device: &str,
        kind: LightKind,
        on: bool,
    ) -> Result<()>;

    /// List device inventories, optionally restricted to some hosts
    async fn list_inventory(
        &self,
        hostnames: Option<&[String]>,
        refresh: bool,
    ) -> Result<Vec<InventoryHost>>;
}

// =============================================================================
// OSD Metadata Port
// =============================================================================

/// Port for the OSD metadata snapshot
pub trait OsdMetadataStore: Send + Sync {
    /// Current metadata of every OSD, keyed by OSD id
    fn get_osd_metadata(&self) -> BTreeMap<OsdId, OsdMetadata>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type LocalRegistryRef = Arc<dyn LocalRegistry>;
pub type OrchestratorClientRef = Arc<dyn OrchestratorClient>;
pub type OsdMetadataStoreRef = Arc<dyn OsdMetadataStore>;
