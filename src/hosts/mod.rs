//! Hosts Module
//!
//! Host reconciliation across the local registry and the orchestrator,
//! plus host label and maintenance management.

pub mod labels;
pub mod reconciler;

pub use labels::*;
pub use reconciler::*;
