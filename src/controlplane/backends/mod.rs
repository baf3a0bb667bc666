//! Collaborator Backends
//!
//! Provides adapters for the services the dashboard reads from:
//! - Memory: in-process local registry, orchestrator and OSD metadata
//! - Fixture: YAML cluster description seeding the memory adapters

pub mod fixture;
pub mod memory;

pub use fixture::*;
pub use memory::*;
