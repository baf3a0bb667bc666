//! Dashboard API Server
//!
//! Serves the host and inventory REST API.

use crate::controlplane::backends::ClusterBackends;
use crate::domain::ports::{LocalRegistryRef, OrchestratorClientRef, OsdMetadataStoreRef};
use crate::error::{Error, Result};
use crate::hosts::{HostReconciler, ReconcilerConfig};
use crate::inventory::InventoryService;
use crate::metrics::ApiMetrics;
use crate::tasks::{TaskManager, TaskManagerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

use super::rest::RestRouter;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub rest_addr: SocketAddr,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Max request body size
    pub max_body_size: usize,
    /// Allow cross-origin requests
    pub permissive_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            rest_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024, // 1MB
            permissive_cors: false,
        }
    }
}

// =============================================================================
// API Context
// =============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiContext {
    pub hosts: Arc<HostReconciler>,
    pub inventory: Arc<InventoryService>,
    pub tasks: Arc<TaskManager>,
    pub metrics: ApiMetrics,
}

impl ApiContext {
    /// Wire the services on top of the given adapters
    pub fn new(
        local: LocalRegistryRef,
        orchestrator: OrchestratorClientRef,
        osd_metadata: OsdMetadataStoreRef,
        reconciler: ReconcilerConfig,
        tasks: TaskManagerConfig,
    ) -> Result<Self> {
        let tasks = TaskManager::new(tasks);
        let hosts = HostReconciler::new(reconciler, local, orchestrator.clone(), tasks.clone());
        let inventory = InventoryService::new(orchestrator, osd_metadata);

        Ok(Self {
            hosts: Arc::new(hosts),
            inventory: Arc::new(inventory),
            tasks,
            metrics: ApiMetrics::new()?,
        })
    }

    /// Context backed by in-memory adapters
    pub fn from_backends(
        backends: &ClusterBackends,
        reconciler: ReconcilerConfig,
        tasks: TaskManagerConfig,
    ) -> Result<Self> {
        Self::new(
            backends.local_registry.clone(),
            backends.orchestrator.clone(),
            backends.osd_metadata.clone(),
            reconciler,
            tasks,
        )
    }
}

// =============================================================================
// API Server
// =============================================================================

/// REST API server with graceful shutdown
pub struct ApiServer {
    config: ApiServerConfig,
    context: ApiContext,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, context: ApiContext) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            context,
            shutdown_tx,
        }
    }

    /// Run the API server until shutdown is triggered
    pub async fn run(&self) -> Result<()> {
        info!("Starting dashboard API server on {}", self.config.rest_addr);

        let router = RestRouter::new(self.context.clone())
            .with_request_timeout(Duration::from_secs(self.config.request_timeout_secs))
            .with_max_body_size(self.config.max_body_size)
            .with_permissive_cors(self.config.permissive_cors);
        let app = router.build();

        let listener = tokio::net::TcpListener::bind(self.config.rest_addr)
            .await
            .map_err(|e| Error::Internal(format!("Failed to bind REST server: {}", e)))?;

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("REST server shutting down");
            })
            .await
            .map_err(|e| Error::Internal(format!("REST server error: {}", e)));

        if let Err(e) = &result {
            error!("{}", e);
        }

        // Switch off any identify lights still blinking
        self.context.tasks.shutdown().await;
        result
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::backends::ClusterFixture;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.rest_addr.port(), 8080);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.permissive_cors);
    }

    #[tokio::test]
    async fn test_shutdown_stops_server() {
        let backends = ClusterFixture::default().into_backends();
        let context = ApiContext::from_backends(
            &backends,
            ReconcilerConfig::default(),
            TaskManagerConfig::default(),
        )
        .unwrap();
        let config = ApiServerConfig {
            rest_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Default::default()
        };
        let server = Arc::new(ApiServer::new(config, context));

        let running = {
            let server = server.clone();
            tokio::spawn(async move { server.run().await })
        };
        // Retry until the server has subscribed to the shutdown channel
        let result = loop {
            server.shutdown();
            tokio::time::sleep(Duration::from_millis(10)).await;
            if running.is_finished() {
                break running.await.unwrap();
            }
        };
        assert!(result.is_ok());
    }
}
