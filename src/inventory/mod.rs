//! Inventory Module
//!
//! Maps storage devices to the OSDs that use them and annotates
//! orchestrator device inventories with that mapping.

pub mod annotate;
pub mod osd_map;

pub use annotate::*;
pub use osd_map::*;
