//! Cluster Fixture
//!
//! YAML description of a cluster used to seed the in-memory adapters.
//!
//! ```yaml
//! local_hosts:
//!   - hostname: node1
//!     ceph_version: "18.2.0"
//!     services:
//!       - { type: osd, id: "0" }
//! orchestrator:
//!   available: true
//!   hosts:
//!     - { hostname: node1, addr: 10.0.0.1, labels: [mon] }
//!   inventory:
//!     - name: node1
//!       addr: 10.0.0.1
//!       devices:
//!         - { path: /dev/sdb, available: false }
//! osd_metadata:
//!   0: { hostname: node1, devices: "sdb" }
//! ```

use super::memory::{InMemoryOrchestrator, StaticLocalRegistry, StaticOsdMetadata};
use crate::domain::ports::{HostSpec, InventoryHost, LocalServer, OsdId, OsdMetadata};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Orchestrator part of a fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorFixture {
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub hosts: Vec<HostSpec>,
    #[serde(default)]
    pub inventory: Vec<InventoryHost>,
}

fn default_available() -> bool {
    true
}

impl Default for OrchestratorFixture {
    fn default() -> Self {
        Self {
            available: default_available(),
            hosts: Vec::new(),
            inventory: Vec::new(),
        }
    }
}

/// Whole-cluster fixture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterFixture {
    #[serde(default)]
    pub local_hosts: Vec<LocalServer>,
    #[serde(default)]
    pub orchestrator: OrchestratorFixture,
    #[serde(default)]
    pub osd_metadata: BTreeMap<OsdId, OsdMetadata>,
}

/// In-memory adapters built from a fixture
#[derive(Debug, Clone)]
pub struct ClusterBackends {
    pub local_registry: Arc<StaticLocalRegistry>,
    pub orchestrator: Arc<InMemoryOrchestrator>,
    pub osd_metadata: Arc<StaticOsdMetadata>,
}

impl ClusterFixture {
    /// Parse a fixture from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a fixture file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let fixture = Self::from_yaml_str(&contents)?;
        info!(
            "Loaded cluster fixture {}: {} local hosts, {} orchestrator hosts, {} OSDs",
            path.display(),
            fixture.local_hosts.len(),
            fixture.orchestrator.hosts.len(),
            fixture.osd_metadata.len()
        );
        Ok(fixture)
    }

    /// Build the in-memory adapters
    pub fn into_backends(self) -> ClusterBackends {
        let orchestrator = InMemoryOrchestrator::new(self.orchestrator.available)
            .with_hosts(self.orchestrator.hosts)
            .with_inventory(self.orchestrator.inventory);

        ClusterBackends {
            local_registry: Arc::new(StaticLocalRegistry::new(self.local_hosts)),
            orchestrator: Arc::new(orchestrator),
            osd_metadata: Arc::new(StaticOsdMetadata::new(self.osd_metadata)),
        }
    }
}
