//! Device to OSD mapping
//!
//! Builds `hostname -> device name -> {osd ids}` from the OSD metadata
//! snapshot. The map is rebuilt on every call and never cached.

use crate::domain::ports::{OsdId, OsdMetadata};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix carried by kernel device paths
pub const DEVICE_PATH_PREFIX: &str = "/dev/";

/// Devices of one host, keyed by normalized device name
pub type HostDeviceOsds = BTreeMap<String, BTreeSet<OsdId>>;

/// Mapping from hostname to the OSDs using each of its devices
pub type DeviceOsdMap = BTreeMap<String, HostDeviceOsds>;

/// Strip one leading `/dev/` from a device name or path.
///
/// Used on both the OSD side and the inventory side so that `sdb` and
/// `/dev/sdb` compare equal.
#[inline]
pub fn normalize_device_name(name: &str) -> &str {
    name.strip_prefix(DEVICE_PATH_PREFIX).unwrap_or(name)
}

/// Split an OSD `devices` field into normalized device names.
///
/// An empty field yields no names; empty tokens in between commas are
/// skipped as well.
pub fn parse_device_list(devices: &str) -> BTreeSet<&str> {
    devices
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(normalize_device_name)
        .collect()
}

/// Build the device to OSD map from an OSD metadata snapshot.
///
/// OSDs without a hostname or without devices contribute nothing, so a host
/// whose OSDs report no devices does not appear in the map.
pub fn build_device_osd_map(osd_metadata: &BTreeMap<OsdId, OsdMetadata>) -> DeviceOsdMap {
    let mut map = DeviceOsdMap::new();

    for (&osd_id, metadata) in osd_metadata {
        let hostname = match metadata.hostname.as_deref() {
            Some(hostname) if !hostname.is_empty() => hostname,
            _ => continue,
        };
        let names = match metadata.devices.as_deref() {
            Some(devices) => parse_device_list(devices),
            None => continue,
        };
        if names.is_empty() {
            continue;
        }

        let host_devices = map.entry(hostname.to_string()).or_default();
        for name in names {
            host_devices
                .entry(name.to_string())
                .or_default()
                .insert(osd_id);
        }
    }

    map
}
