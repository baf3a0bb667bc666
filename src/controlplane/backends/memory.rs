//! In-Memory Collaborator Adapters
//!
//! Implements the local registry, orchestrator and OSD metadata ports over
//! in-process state. Used by the standalone binary (seeded from a fixture)
//! and by tests.

use crate::domain::ports::{
    HostSpec, InventoryHost, LightKind, LocalRegistry, LocalServer, OrchestratorClient, OsdId,
    OsdMetadata, OsdMetadataStore, MAINTENANCE_STATUS,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

// =============================================================================
// Local Registry
// =============================================================================

/// Local registry backed by a fixed server list
#[derive(Debug, Default)]
pub struct StaticLocalRegistry {
    servers: RwLock<Vec<LocalServer>>,
}

impl StaticLocalRegistry {
    pub fn new(servers: Vec<LocalServer>) -> Self {
        Self {
            servers: RwLock::new(servers),
        }
    }

    /// Replace the server list
    pub fn set_servers(&self, servers: Vec<LocalServer>) {
        *self.servers.write() = servers;
    }
}

impl LocalRegistry for StaticLocalRegistry {
    fn list_local_hosts(&self) -> Vec<LocalServer> {
        self.servers.read().clone()
    }
}

// =============================================================================
// OSD Metadata
// =============================================================================

/// OSD metadata store backed by a fixed snapshot
#[derive(Debug, Default)]
pub struct StaticOsdMetadata {
    metadata: RwLock<BTreeMap<OsdId, OsdMetadata>>,
}

impl StaticOsdMetadata {
    pub fn new(metadata: BTreeMap<OsdId, OsdMetadata>) -> Self {
        Self {
            metadata: RwLock::new(metadata),
        }
    }

    /// Insert or replace the metadata of one OSD
    pub fn upsert(&self, osd_id: OsdId, metadata: OsdMetadata) {
        self.metadata.write().insert(osd_id, metadata);
    }
}

impl OsdMetadataStore for StaticOsdMetadata {
    fn get_osd_metadata(&self) -> BTreeMap<OsdId, OsdMetadata> {
        self.metadata.read().clone()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Number of most recent calls kept by [`InMemoryOrchestrator`]
pub const CALL_JOURNAL_CAPACITY: usize = 256;

/// Calls received by [`InMemoryOrchestrator`], in arrival order.
///
/// Host listing is not journaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorCall {
    AddHost { hostname: String },
    RemoveHost { hostname: String },
    AddLabel { hostname: String, label: String },
    RemoveLabel { hostname: String, label: String },
    EnterMaintenance { hostname: String, force: bool },
    ExitMaintenance { hostname: String },
    BlinkDeviceLight {
        hostname: String,
        device: String,
        kind: LightKind,
        on: bool,
    },
    ListInventory {
        hostnames: Option<Vec<String>>,
        refresh: bool,
    },
}

#[derive(Debug, Default)]
struct OrchestratorState {
    hosts: IndexMap<String, HostSpec>,
    inventory: Vec<InventoryHost>,
    calls: VecDeque<OrchestratorCall>,
}

impl OrchestratorState {
    fn record(&mut self, call: OrchestratorCall) {
        if self.calls.len() == CALL_JOURNAL_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

/// Orchestrator keeping hosts and inventory in memory
#[derive(Debug)]
pub struct InMemoryOrchestrator {
    available: AtomicBool,
    state: RwLock<OrchestratorState>,
}

impl InMemoryOrchestrator {
    /// Create an empty orchestrator
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            state: RwLock::new(OrchestratorState::default()),
        }
    }

    /// Seed the managed hosts, keeping their order
    pub fn with_hosts(self, hosts: Vec<HostSpec>) -> Self {
        {
            let mut state = self.state.write();
            state.hosts = hosts
                .into_iter()
                .map(|host| (host.hostname.clone(), host))
                .collect();
        }
        self
    }

    /// Seed the device inventory
    pub fn with_inventory(self, inventory: Vec<InventoryHost>) -> Self {
        self.state.write().inventory = inventory;
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Most recent calls, oldest first
    pub fn calls(&self) -> Vec<OrchestratorCall> {
        self.state.read().calls.iter().cloned().collect()
    }

    /// Current spec of a managed host
    pub fn host(&self, hostname: &str) -> Option<HostSpec> {
        self.state.read().hosts.get(hostname).cloned()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::OrchestratorUnavailable)
        }
    }

    /// Record a call and apply `f` to the host it targets
    fn update_host<F>(&self, call: OrchestratorCall, operation: &str, hostname: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut HostSpec),
    {
        self.ensure_available()?;
        let mut state = self.state.write();
        state.record(call);
        match state.hosts.get_mut(hostname) {
            Some(host) => {
                f(host);
                Ok(())
            }
            None => Err(Error::orchestrator(
                operation,
                format!("host {} is not managed by the orchestrator", hostname),
            )),
        }
    }
}

#[async_trait]
impl OrchestratorClient for InMemoryOrchestrator {
    async fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn list_hosts(&self) -> Result<Vec<HostSpec>> {
        self.ensure_available()?;
        Ok(self.state.read().hosts.values().cloned().collect())
    }

    async fn add_host(&self, spec: HostSpec) -> Result<()> {
        self.ensure_available()?;
        let mut state = self.state.write();
        state.record(OrchestratorCall::AddHost {
            hostname: spec.hostname.clone(),
        });
        if state.hosts.contains_key(&spec.hostname) {
            return Err(Error::orchestrator(
                "add_host",
                format!("host {} already exists", spec.hostname),
            ));
        }
        info!("Added host {}", spec.hostname);
        state.hosts.insert(spec.hostname.clone(), spec);
        Ok(())
    }

    async fn remove_host(&self, hostname: &str) -> Result<()> {
        self.ensure_available()?;
        let mut state = self.state.write();
        state.record(OrchestratorCall::RemoveHost {
            hostname: hostname.to_string(),
        });
        match state.hosts.shift_remove(hostname) {
            Some(_) => {
                info!("Removed host {}", hostname);
                Ok(())
            }
            None => Err(Error::orchestrator(
                "remove_host",
                format!("host {} is not managed by the orchestrator", hostname),
            )),
        }
    }

    async fn add_label(&self, hostname: &str, label: &str) -> Result<()> {
        let call = OrchestratorCall::AddLabel {
            hostname: hostname.to_string(),
            label: label.to_string(),
        };
        self.update_host(call, "add_label", hostname, |host| {
            if !host.labels.iter().any(|l| l == label) {
                host.labels.push(label.to_string());
            }
        })
    }

    async fn remove_label(&self, hostname: &str, label: &str) -> Result<()> {
        let call = OrchestratorCall::RemoveLabel {
            hostname: hostname.to_string(),
            label: label.to_string(),
        };
        self.update_host(call, "remove_label", hostname, |host| {
            host.labels.retain(|l| l != label);
        })
    }

    async fn enter_maintenance(&self, hostname: &str, force: bool) -> Result<()> {
        let call = OrchestratorCall::EnterMaintenance {
            hostname: hostname.to_string(),
            force,
        };
        self.update_host(call, "enter_maintenance", hostname, |host| {
            host.status = MAINTENANCE_STATUS.to_string();
        })
    }

    async fn exit_maintenance(&self, hostname: &str) -> Result<()> {
        let call = OrchestratorCall::ExitMaintenance {
            hostname: hostname.to_string(),
        };
        self.update_host(call, "exit_maintenance", hostname, |host| {
            host.status.clear();
        })
    }

    async fn blink_device_light(
        &self,
        hostname: &str,
        device: &str,
        kind: LightKind,
        on: bool,
    ) -> Result<()> {
        self.ensure_available()?;
        debug!(
            "Device light {} {} on {}: {}",
            kind,
            device,
            hostname,
            if on { "on" } else { "off" }
        );
        self.state.write().record(OrchestratorCall::BlinkDeviceLight {
            hostname: hostname.to_string(),
            device: device.to_string(),
            kind,
            on,
        });
        Ok(())
    }

    async fn list_inventory(
        &self,
        hostnames: Option<&[String]>,
        refresh: bool,
    ) -> Result<Vec<InventoryHost>> {
        self.ensure_available()?;
        let mut state = self.state.write();
        state.record(OrchestratorCall::ListInventory {
            hostnames: hostnames.map(<[String]>::to_vec),
            refresh,
        });

        Ok(state
            .inventory
            .iter()
            .filter(|host| hostnames.map_or(true, |names| names.contains(&host.name)))
            .cloned()
            .collect())
    }
}
