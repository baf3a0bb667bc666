//! Host Dashboard
//!
//! A dashboard service that lists cluster hosts, merges them from the local
//! daemon registry and the orchestrator, manages host labels and maintenance
//! mode, and maps storage devices to the OSDs that use them.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        REST API (axum)                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌───────────────┐  │
//! │  │ Host Reconciler │  │    Inventory    │  │ Task Manager  │  │
//! │  │ (merge, labels, │  │ (device -> OSD  │  │ (identify,    │  │
//! │  │  maintenance)   │  │   annotation)   │  │  cancel)      │  │
//! │  └────────┬────────┘  └────────┬────────┘  └───────────────┘  │
//! ├───────────┴────────────────────┴──────────────────────────────┤
//! │                           Ports                                │
//! │  ┌──────────────┐  ┌───────────────────┐  ┌────────────────┐  │
//! │  │Local Registry│  │Orchestrator Client│  │ OSD Metadata   │  │
//! │  └──────────────┘  └───────────────────┘  └────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: REST API and in-memory backends
//! - [`hosts`]: Host merging and host management
//! - [`inventory`]: Device to OSD mapping and inventory annotation
//! - [`tasks`]: Background task manager
//! - [`domain`]: Core domain types and ports
//! - [`metrics`]: Prometheus metrics
//! - [`error`]: Error types and handling

pub mod controlplane;
pub mod domain;
pub mod error;
pub mod hosts;
pub mod inventory;
pub mod metrics;
pub mod tasks;

// Re-export commonly used types
pub use controlplane::{
    ApiContext, ApiServer, ApiServerConfig, ClusterBackends, ClusterFixture,
    InMemoryOrchestrator, RestRouter, StaticLocalRegistry, StaticOsdMetadata,
};

pub use domain::ports::{
    Device, HostSpec, InventoryHost, LightKind, LocalRegistry, LocalServer,
    OrchestratorClient, OsdId, OsdMetadata, OsdMetadataStore,
};

pub use error::{Error, Result};

pub use hosts::{HostReconciler, HostRecord, HostSources, ReconcilerConfig, SourceFilter};

pub use inventory::{
    build_device_osd_map, DeviceOsdMap, HostInventory, InventoryService, RefreshFlag,
};

pub use metrics::ApiMetrics;

pub use tasks::{TaskInfo, TaskManager, TaskManagerConfig, TaskOutcome, TaskState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
