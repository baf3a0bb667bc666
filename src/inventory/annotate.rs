//! Inventory annotation
//!
//! Attaches to every orchestrator-reported device the ids of the OSDs that
//! use it.

use super::osd_map::{build_device_osd_map, normalize_device_name, DeviceOsdMap};
use crate::domain::ports::{
    Device, InventoryHost, OrchestratorClientRef, OsdId, OsdMetadataStoreRef,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

// =============================================================================
// Refresh Flag
// =============================================================================

/// Tri-state `refresh` request flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshFlag {
    /// Parameter absent
    #[default]
    Unset,
    True,
    False,
}

impl RefreshFlag {
    /// Parse a query parameter value. Only the exact string `true` is true.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            None => RefreshFlag::Unset,
            Some("true") => RefreshFlag::True,
            Some(_) => RefreshFlag::False,
        }
    }

    /// Whether the orchestrator should rescan devices
    pub fn should_refresh(self) -> bool {
        matches!(self, RefreshFlag::True)
    }
}

// =============================================================================
// Annotated Inventory
// =============================================================================

/// Device record with the OSDs using it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDevice {
    #[serde(flatten)]
    pub device: Device,
    /// Sorted ids of OSDs on this device
    pub osd_ids: Vec<OsdId>,
}

/// Host inventory with annotated devices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInventory {
    pub name: String,
    pub addr: String,
    pub devices: Vec<AnnotatedDevice>,
}

/// Annotate inventories with the OSD ids found in `device_osd_map`.
///
/// Devices with no matching OSD get an empty id list.
pub fn annotate_inventory(
    inventory: Vec<InventoryHost>,
    device_osd_map: &DeviceOsdMap,
) -> Vec<HostInventory> {
    inventory
        .into_iter()
        .map(|host| {
            let host_osds = device_osd_map.get(&host.name);
            let devices = host
                .devices
                .into_iter()
                .map(|device| {
                    let osd_ids = host_osds
                        .and_then(|osds| osds.get(normalize_device_name(&device.path)))
                        .map(|ids| ids.iter().copied().collect())
                        .unwrap_or_default();
                    AnnotatedDevice { device, osd_ids }
                })
                .collect();

            HostInventory {
                name: host.name,
                addr: host.addr,
                devices,
            }
        })
        .collect()
}

// =============================================================================
// Inventory Service
// =============================================================================

/// Fetches orchestrator inventories and annotates them with OSD usage
pub struct InventoryService {
    orchestrator: OrchestratorClientRef,
    osd_metadata: OsdMetadataStoreRef,
}

impl InventoryService {
    pub fn new(orchestrator: OrchestratorClientRef, osd_metadata: OsdMetadataStoreRef) -> Self {
        Self {
            orchestrator,
            osd_metadata,
        }
    }

    /// Current device to OSD map, rebuilt from the metadata store
    pub fn device_osd_map(&self) -> DeviceOsdMap {
        build_device_osd_map(&self.osd_metadata.get_osd_metadata())
    }

    /// Annotated inventories for `hostnames` (all hosts when `None`)
    pub async fn get_inventories(
        &self,
        hostnames: Option<&[String]>,
        refresh: RefreshFlag,
    ) -> Result<Vec<HostInventory>> {
        if !self.orchestrator.available().await {
            return Err(Error::OrchestratorUnavailable);
        }

        let inventory = self
            .orchestrator
            .list_inventory(hostnames, refresh.should_refresh())
            .await?;
        debug!(
            "Fetched inventory for {} hosts (refresh: {:?})",
            inventory.len(),
            refresh
        );

        Ok(annotate_inventory(inventory, &self.device_osd_map()))
    }
}
