//! Prometheus metrics for the dashboard API

use crate::error::{Error, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Metrics collected by the REST layer
#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,
    requests: IntCounterVec,
    executing_tasks: IntGauge,
}

impl ApiMetrics {
    /// Create the metrics and register them on a private registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(
                "host_dashboard_requests_total",
                "API requests by endpoint and status code",
            ),
            &["endpoint", "status"],
        )
        .map_err(metrics_error)?;
        let executing_tasks = IntGauge::new(
            "host_dashboard_tasks_executing",
            "Background tasks currently executing",
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(requests.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(executing_tasks.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            requests,
            executing_tasks,
        })
    }

    /// Count one request
    pub fn observe(&self, endpoint: &str, status: u16) {
        self.requests
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }

    pub fn set_executing_tasks(&self, count: usize) {
        self.executing_tasks.set(count as i64);
    }

    /// Number of requests seen for an endpoint and status
    pub fn request_count(&self, endpoint: &str, status: u16) -> u64 {
        self.requests
            .with_label_values(&[endpoint, &status.to_string()])
            .get()
    }

    /// Encode all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

fn metrics_error(e: prometheus::Error) -> Error {
    Error::Internal(format!("metrics error: {}", e))
}
