//! Host Reconciler
//!
//! Merges the hosts known to the local daemon registry with the hosts
//! managed by the orchestrator, and applies host-level changes (labels,
//! maintenance, add/remove, device identification) through the
//! orchestrator.

use super::labels::{parse_label_list, LabelDiff};
use crate::domain::ports::{
    HostSpec, LightKind, LocalRegistryRef, LocalServer, OrchestratorClientRef, ServiceRef,
    MAINTENANCE_STATUS,
};
use crate::error::{Error, Result};
use crate::tasks::{TaskManager, TaskOutcome};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Task name used for device identification
pub const IDENTIFY_DEVICE_TASK: &str = "host/identify_device";

// =============================================================================
// Host Records
// =============================================================================

/// Which backends reported a host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSources {
    /// Reported by the local daemon registry
    #[serde(rename = "ceph")]
    pub local: bool,
    /// Reported by the orchestrator
    pub orchestrator: bool,
}

/// Merged view of one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub hostname: String,
    pub addr: String,
    /// Sorted, orchestrator-sourced labels
    pub labels: Vec<String>,
    pub status: String,
    pub services: Vec<ServiceRef>,
    pub ceph_version: String,
    pub sources: HostSources,
}

impl HostRecord {
    fn from_local(server: LocalServer) -> Self {
        Self {
            hostname: server.hostname,
            addr: String::new(),
            labels: Vec::new(),
            status: String::new(),
            services: server.services,
            ceph_version: server.ceph_version,
            sources: HostSources {
                local: true,
                orchestrator: false,
            },
        }
    }

    fn from_orchestrator(spec: HostSpec) -> Self {
        let mut record = Self {
            hostname: spec.hostname.clone(),
            addr: String::new(),
            labels: Vec::new(),
            status: String::new(),
            services: Vec::new(),
            ceph_version: String::new(),
            sources: HostSources::default(),
        };
        record.merge_orchestrator(spec);
        record
    }

    fn merge_orchestrator(&mut self, spec: HostSpec) {
        let labels: BTreeSet<String> = spec.labels.into_iter().collect();
        self.labels = labels.into_iter().collect();
        self.addr = spec.addr;
        self.status = spec.status;
        self.sources.orchestrator = true;
    }

    pub fn label_set(&self) -> BTreeSet<String> {
        self.labels.iter().cloned().collect()
    }

    pub fn in_maintenance(&self) -> bool {
        self.status == MAINTENANCE_STATUS
    }
}

/// Merge local and orchestrator hosts by hostname.
///
/// Local hosts keep their registry order, enriched in place when the
/// orchestrator also reports them; orchestrator-only hosts follow in
/// orchestrator order.
pub fn merge_hosts(local: Vec<LocalServer>, orchestrator: Vec<HostSpec>) -> Vec<HostRecord> {
    let mut hosts: IndexMap<String, HostRecord> = IndexMap::new();
    for server in local {
        if !hosts.contains_key(&server.hostname) {
            hosts.insert(server.hostname.clone(), HostRecord::from_local(server));
        }
    }

    for spec in orchestrator {
        match hosts.get_mut(&spec.hostname) {
            Some(record) => record.merge_orchestrator(spec),
            None => {
                hosts.insert(spec.hostname.clone(), HostRecord::from_orchestrator(spec));
            }
        }
    }

    hosts.into_values().collect()
}

// =============================================================================
// Source Filter
// =============================================================================

/// Which backends to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFilter {
    pub local: bool,
    pub orchestrator: bool,
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl SourceFilter {
    pub fn all() -> Self {
        Self {
            local: true,
            orchestrator: true,
        }
    }

    /// Parse a comma-separated `sources` parameter.
    ///
    /// `None` selects every source; unknown tokens are ignored.
    pub fn from_query(sources: Option<&str>) -> Self {
        match sources {
            None => Self::all(),
            Some(sources) => {
                let tokens: Vec<&str> = sources.split(',').map(str::trim).collect();
                Self {
                    local: tokens.iter().any(|t| *t == "ceph" || *t == "local"),
                    orchestrator: tokens.contains(&"orchestrator"),
                }
            }
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Requested changes to an existing host
#[derive(Debug, Clone, Default)]
pub struct HostUpdate {
    /// Enter maintenance if not in it, exit otherwise
    pub toggle_maintenance: bool,
    /// Force entering maintenance
    pub force: bool,
    /// Desired labels, as received; must be a list of strings
    pub labels: Option<Value>,
}

/// Parse an identify duration given as an integer or an integer string
pub fn parse_duration_secs(value: &Value) -> Result<Duration> {
    let secs = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    secs.map(Duration::from_secs).ok_or_else(|| {
        Error::InvalidArgument(format!("duration must be a number of seconds, got {}", value))
    })
}

// =============================================================================
// Reconciler
// =============================================================================

/// Configuration for the host reconciler
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// How long an identify request waits for its task before returning
    pub identify_wait: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            identify_wait: Duration::from_secs(2),
        }
    }
}

/// Merges host views and applies host changes through the orchestrator
pub struct HostReconciler {
    config: ReconcilerConfig,
    local: LocalRegistryRef,
    orchestrator: OrchestratorClientRef,
    tasks: Arc<TaskManager>,
}

impl HostReconciler {
    /// Create a new reconciler
    pub fn new(
        config: ReconcilerConfig,
        local: LocalRegistryRef,
        orchestrator: OrchestratorClientRef,
        tasks: Arc<TaskManager>,
    ) -> Self {
        Self {
            config,
            local,
            orchestrator,
            tasks,
        }
    }

    /// Merged host list from the selected sources.
    ///
    /// An unavailable orchestrator contributes no hosts.
    pub async fn get_hosts(&self, filter: SourceFilter) -> Result<Vec<HostRecord>> {
        let local = if filter.local {
            self.local.list_local_hosts()
        } else {
            Vec::new()
        };

        let orchestrator = if filter.orchestrator && self.orchestrator.available().await {
            self.orchestrator.list_hosts().await?
        } else {
            Vec::new()
        };

        debug!(
            "Merging {} local and {} orchestrator hosts",
            local.len(),
            orchestrator.len()
        );
        Ok(merge_hosts(local, orchestrator))
    }

    /// Look up one host in every source
    pub async fn get_host(&self, hostname: &str) -> Result<HostRecord> {
        self.get_hosts(SourceFilter::all())
            .await?
            .into_iter()
            .find(|host| host.hostname == hostname)
            .ok_or_else(|| Error::HostNotFound {
                hostname: hostname.to_string(),
            })
    }

    /// Sorted union of all orchestrator host labels
    pub async fn list_labels(&self) -> Result<Vec<String>> {
        self.require_orchestrator().await?;
        let labels: BTreeSet<String> = self
            .orchestrator
            .list_hosts()
            .await?
            .into_iter()
            .flat_map(|host| host.labels)
            .collect();
        Ok(labels.into_iter().collect())
    }

    /// Make the host carry exactly `desired` labels
    pub async fn set_labels(&self, hostname: &str, desired: &BTreeSet<String>) -> Result<()> {
        self.require_orchestrator().await?;
        let host = self.get_host(hostname).await?;

        let diff = LabelDiff::between(&host.label_set(), desired);
        for label in &diff.to_remove {
            self.orchestrator.remove_label(hostname, label).await?;
        }
        for label in &diff.to_add {
            self.orchestrator.add_label(hostname, label).await?;
        }

        if !diff.is_empty() {
            info!(
                "Updated labels of {}: removed {:?}, added {:?}",
                hostname, diff.to_remove, diff.to_add
            );
        }
        Ok(())
    }

    /// Enter or exit maintenance mode. `force` only applies on enter.
    pub async fn set_maintenance(&self, hostname: &str, enter: bool, force: bool) -> Result<()> {
        self.require_orchestrator().await?;
        if enter {
            info!("Host {} entering maintenance (force: {})", hostname, force);
            self.orchestrator.enter_maintenance(hostname, force).await
        } else {
            info!("Host {} exiting maintenance", hostname);
            self.orchestrator.exit_maintenance(hostname).await
        }
    }

    /// Flip maintenance mode based on the host's current status.
    ///
    /// Returns `true` when the host entered maintenance.
    pub async fn toggle_maintenance(&self, hostname: &str, force: bool) -> Result<bool> {
        self.require_orchestrator().await?;
        let host = self.get_host(hostname).await?;
        let enter = !host.in_maintenance();
        self.set_maintenance(hostname, enter, force).await?;
        Ok(enter)
    }

    /// Apply a host update request
    pub async fn update_host(&self, hostname: &str, update: HostUpdate) -> Result<()> {
        self.require_orchestrator().await?;
        // Reject the whole request before any change is attempted
        let desired = update.labels.as_ref().map(parse_label_list).transpose()?;
        self.get_host(hostname).await?;

        if update.toggle_maintenance {
            self.toggle_maintenance(hostname, update.force).await?;
        }
        if let Some(desired) = &desired {
            self.set_labels(hostname, desired).await?;
        }
        Ok(())
    }

    /// Add a host to the orchestrator, optionally straight into maintenance
    pub async fn add_host(
        &self,
        hostname: &str,
        addr: Option<String>,
        labels: Vec<String>,
        status: Option<&str>,
    ) -> Result<()> {
        self.require_orchestrator().await?;
        if self.orchestrator_host(hostname).await?.is_some() {
            return Err(Error::HostAlreadyExists {
                hostname: hostname.to_string(),
            });
        }

        let spec = HostSpec::new(hostname)
            .with_addr(addr.unwrap_or_default())
            .with_labels(labels);
        self.orchestrator.add_host(spec).await?;
        info!("Host {} added", hostname);

        if status == Some(MAINTENANCE_STATUS) {
            self.orchestrator.enter_maintenance(hostname, false).await?;
        }
        Ok(())
    }

    /// Remove a host from the orchestrator
    pub async fn remove_host(&self, hostname: &str) -> Result<()> {
        self.require_orchestrator().await?;
        if self.orchestrator_host(hostname).await?.is_none() {
            return Err(Error::HostNotFound {
                hostname: hostname.to_string(),
            });
        }
        self.orchestrator.remove_host(hostname).await?;
        info!("Host {} removed", hostname);
        Ok(())
    }

    /// Blink a device's ident light for `duration` as a background task.
    ///
    /// The light is switched off when the duration elapses or when the task
    /// is cancelled, whichever comes first.
    pub async fn identify_device(
        &self,
        hostname: &str,
        device: &str,
        duration: Duration,
    ) -> Result<TaskOutcome> {
        self.require_orchestrator().await?;

        let metadata = BTreeMap::from([
            ("hostname".to_string(), hostname.to_string()),
            ("device".to_string(), device.to_string()),
        ]);
        let orchestrator = self.orchestrator.clone();
        let hostname = hostname.to_string();
        let device = device.to_string();

        let job = move |cancel: CancellationToken| async move {
            orchestrator
                .blink_device_light(&hostname, &device, LightKind::Ident, true)
                .await?;
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = cancel.cancelled() => {
                    warn!("Identify of {} on {} cancelled", device, hostname);
                }
            }
            orchestrator
                .blink_device_light(&hostname, &device, LightKind::Ident, false)
                .await
        };

        Ok(self
            .tasks
            .run(IDENTIFY_DEVICE_TASK, metadata, self.config.identify_wait, job)
            .await)
    }

    async fn require_orchestrator(&self) -> Result<()> {
        if self.orchestrator.available().await {
            Ok(())
        } else {
            Err(Error::OrchestratorUnavailable)
        }
    }

    async fn orchestrator_host(&self, hostname: &str) -> Result<Option<HostSpec>> {
        Ok(self
            .orchestrator
            .list_hosts()
            .await?
            .into_iter()
            .find(|host| host.hostname == hostname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::backends::{InMemoryOrchestrator, OrchestratorCall, StaticLocalRegistry};
    use crate::tasks::{TaskManagerConfig, TaskState};
    use assert_matches::assert_matches;
    use serde_json::json;

    struct Harness {
        local: Arc<StaticLocalRegistry>,
        orchestrator: Arc<InMemoryOrchestrator>,
        tasks: Arc<TaskManager>,
        reconciler: HostReconciler,
    }

    fn harness(local: &[&str], available: bool, hosts: Vec<HostSpec>) -> Harness {
        let local = Arc::new(StaticLocalRegistry::new(
            local.iter().map(|h| LocalServer::new(*h)).collect(),
        ));
        let orchestrator = Arc::new(InMemoryOrchestrator::new(available).with_hosts(hosts));
        let tasks = TaskManager::new(TaskManagerConfig::default());
        let reconciler = HostReconciler::new(
            ReconcilerConfig::default(),
            local.clone(),
            orchestrator.clone(),
            tasks.clone(),
        );
        Harness {
            local,
            orchestrator,
            tasks,
            reconciler,
        }
    }

    fn labels(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_hosts_merges_sources() {
        let h = harness(
            &["node1", "localhost"],
            true,
            vec![
                HostSpec::new("node1").with_labels(["foo", "bar"]),
                HostSpec::new("node2").with_labels(["bar"]),
            ],
        );

        let hosts = h.reconciler.get_hosts(SourceFilter::all()).await.unwrap();
        let names: Vec<&str> = hosts.iter().map(|h| h.hostname.as_str()).collect();
        assert_eq!(names, vec!["node1", "localhost", "node2"]);

        assert_eq!(
            hosts[0].sources,
            HostSources {
                local: true,
                orchestrator: true
            }
        );
        assert_eq!(hosts[0].labels, vec!["bar", "foo"]);
        assert_eq!(
            hosts[1].sources,
            HostSources {
                local: true,
                orchestrator: false
            }
        );
        assert!(hosts[1].labels.is_empty());
        assert_eq!(
            hosts[2].sources,
            HostSources {
                local: false,
                orchestrator: true
            }
        );
        assert_eq!(hosts[2].labels, vec!["bar"]);
    }

    #[tokio::test]
    async fn test_get_hosts_filters_sources() {
        let h = harness(
            &["local-only", "both"],
            true,
            vec![HostSpec::new("both"), HostSpec::new("orch-only")],
        );

        let names = |hosts: Vec<HostRecord>| -> Vec<String> {
            hosts.into_iter().map(|h| h.hostname).collect()
        };

        let local = h
            .reconciler
            .get_hosts(SourceFilter::from_query(Some("ceph")))
            .await
            .unwrap();
        assert!(local.iter().all(|h| h.sources.local && !h.sources.orchestrator));
        assert_eq!(names(local), vec!["local-only", "both"]);

        let orch = h
            .reconciler
            .get_hosts(SourceFilter::from_query(Some("orchestrator")))
            .await
            .unwrap();
        assert!(orch.iter().all(|h| !h.sources.local && h.sources.orchestrator));
        assert_eq!(names(orch), vec!["both", "orch-only"]);

        let none = h
            .reconciler
            .get_hosts(SourceFilter::from_query(Some("bogus")))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_get_hosts_ignores_unavailable_orchestrator() {
        let h = harness(&["node1"], false, vec![HostSpec::new("node2")]);

        let hosts = h.reconciler.get_hosts(SourceFilter::all()).await.unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].hostname, "node1");
    }

    #[tokio::test]
    async fn test_get_host() {
        let h = harness(&[], false, Vec::new());
        assert_matches!(
            h.reconciler.get_host("node1").await,
            Err(Error::HostNotFound { hostname }) if hostname == "node1"
        );

        h.local.set_servers(vec![LocalServer::new("node1")]);
        let host = h.reconciler.get_host("node1").await.unwrap();
        assert!(host.labels.is_empty());
        assert!(host.sources.local);
    }

    #[tokio::test]
    async fn test_set_labels_applies_difference() {
        let h = harness(
            &[],
            true,
            vec![HostSpec::new("node0").with_labels(["aaa", "bbb"])],
        );

        h.reconciler
            .set_labels("node0", &labels(&["bbb", "ccc"]))
            .await
            .unwrap();

        assert_eq!(
            h.orchestrator.calls(),
            vec![
                OrchestratorCall::RemoveLabel {
                    hostname: "node0".into(),
                    label: "aaa".into()
                },
                OrchestratorCall::AddLabel {
                    hostname: "node0".into(),
                    label: "ccc".into()
                },
            ]
        );
        let host = h.reconciler.get_host("node0").await.unwrap();
        assert_eq!(host.labels, vec!["bbb", "ccc"]);
    }

    #[tokio::test]
    async fn test_update_host_rejects_invalid_labels() {
        let h = harness(&[], true, vec![HostSpec::new("node0").with_labels(["aaa"])]);

        let update = HostUpdate {
            labels: Some(json!("ddd")),
            ..Default::default()
        };
        assert_matches!(
            h.reconciler.update_host("node0", update).await,
            Err(Error::InvalidArgument(_))
        );
        assert!(h.orchestrator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_host_invalid_labels_skip_maintenance() {
        let h = harness(&[], true, vec![HostSpec::new("node0")]);

        let update = HostUpdate {
            toggle_maintenance: true,
            labels: Some(json!("ddd")),
            ..Default::default()
        };
        assert_matches!(
            h.reconciler.update_host("node0", update).await,
            Err(Error::InvalidArgument(_))
        );
        assert!(h.orchestrator.calls().is_empty());
        assert!(!h.reconciler.get_host("node0").await.unwrap().in_maintenance());
    }

    #[tokio::test]
    async fn test_update_host_applies_maintenance_and_labels() {
        let h = harness(&[], true, vec![HostSpec::new("node0").with_labels(["aaa"])]);

        let update = HostUpdate {
            toggle_maintenance: true,
            labels: Some(json!(["bbb"])),
            ..Default::default()
        };
        h.reconciler.update_host("node0", update).await.unwrap();

        let host = h.reconciler.get_host("node0").await.unwrap();
        assert!(host.in_maintenance());
        assert_eq!(host.labels, vec!["bbb"]);
    }

    #[tokio::test]
    async fn test_maintenance_toggle() {
        let h = harness(&[], true, vec![HostSpec::new("node0"), HostSpec::new("node1")]);

        assert!(h.reconciler.toggle_maintenance("node0", false).await.unwrap());
        assert!(h.reconciler.toggle_maintenance("node1", true).await.unwrap());
        assert!(!h.reconciler.toggle_maintenance("node0", false).await.unwrap());
        assert!(!h.reconciler.toggle_maintenance("node1", true).await.unwrap());

        assert_eq!(
            h.orchestrator.calls(),
            vec![
                OrchestratorCall::EnterMaintenance {
                    hostname: "node0".into(),
                    force: false
                },
                OrchestratorCall::EnterMaintenance {
                    hostname: "node1".into(),
                    force: true
                },
                OrchestratorCall::ExitMaintenance {
                    hostname: "node0".into()
                },
                OrchestratorCall::ExitMaintenance {
                    hostname: "node1".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_maintenance_requires_orchestrator() {
        let h = harness(&["node0"], false, Vec::new());

        assert_matches!(
            h.reconciler.set_maintenance("node0", true, false).await,
            Err(Error::OrchestratorUnavailable)
        );
        assert_matches!(
            h.reconciler.set_maintenance("node0", false, false).await,
            Err(Error::OrchestratorUnavailable)
        );
        assert_matches!(
            h.reconciler.set_labels("node0", &labels(&["a"])).await,
            Err(Error::OrchestratorUnavailable)
        );
    }

    #[tokio::test]
    async fn test_add_host() {
        let h = harness(&[], true, vec![HostSpec::new("node1")]);

        h.reconciler
            .add_host("node0", Some("10.0.0.5".into()), vec!["mon".into()], Some("maintenance"))
            .await
            .unwrap();

        let spec = h.orchestrator.host("node0").unwrap();
        assert_eq!(spec.addr, "10.0.0.5");
        assert_eq!(spec.labels, vec!["mon".to_string()]);
        assert_eq!(spec.status, MAINTENANCE_STATUS);

        assert_matches!(
            h.reconciler.add_host("node1", None, Vec::new(), None).await,
            Err(Error::HostAlreadyExists { .. })
        );
    }

    #[tokio::test]
    async fn test_remove_host() {
        let h = harness(&[], true, vec![HostSpec::new("node1")]);

        h.reconciler.remove_host("node1").await.unwrap();
        assert!(h.orchestrator.host("node1").is_none());
        assert_matches!(
            h.reconciler.remove_host("node1").await,
            Err(Error::HostNotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_list_labels() {
        let h = harness(
            &[],
            true,
            vec![
                HostSpec::new("node1").with_labels(["foo"]),
                HostSpec::new("node2").with_labels(["foo", "bar"]),
            ],
        );
        assert_eq!(h.reconciler.list_labels().await.unwrap(), vec!["bar", "foo"]);

        h.orchestrator.set_available(false);
        assert_matches!(
            h.reconciler.list_labels().await,
            Err(Error::OrchestratorUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_identify_device_blinks_for_duration() {
        let h = harness(&[], true, Vec::new());

        let started = tokio::time::Instant::now();
        let outcome = h
            .reconciler
            .identify_device("host-0", "/dev/sdz", Duration::from_secs(1))
            .await
            .unwrap();

        assert_matches!(&outcome, TaskOutcome::Finished { result: Ok(()), .. });
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(outcome.info().metadata["device"], "/dev/sdz");

        let blink = |on| OrchestratorCall::BlinkDeviceLight {
            hostname: "host-0".into(),
            device: "/dev/sdz".into(),
            kind: LightKind::Ident,
            on,
        };
        assert_eq!(h.orchestrator.calls(), vec![blink(true), blink(false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identify_device_cancel_turns_light_off() {
        let h = harness(&[], true, Vec::new());

        let outcome = h
            .reconciler
            .identify_device("host-0", "sdb", Duration::from_secs(60))
            .await
            .unwrap();
        let id = match outcome {
            TaskOutcome::Executing(info) => info.id,
            other => panic!("expected executing task, got {:?}", other),
        };

        h.tasks.cancel(&id).unwrap();
        h.tasks.shutdown().await;

        assert_eq!(h.tasks.get(&id).unwrap().state, TaskState::Cancelled);
        let calls = h.orchestrator.calls();
        assert_eq!(calls.len(), 2);
        assert_matches!(&calls[1], OrchestratorCall::BlinkDeviceLight { on: false, .. });
    }

    #[tokio::test]
    async fn test_identify_device_requires_orchestrator() {
        let h = harness(&[], false, Vec::new());
        assert_matches!(
            h.reconciler
                .identify_device("host-0", "sdb", Duration::from_secs(1))
                .await,
            Err(Error::OrchestratorUnavailable)
        );
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs(&json!(1)).unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration_secs(&json!("15")).unwrap(), Duration::from_secs(15));
        assert_matches!(parse_duration_secs(&json!("soon")), Err(Error::InvalidArgument(_)));
        assert_matches!(parse_duration_secs(&json!(-3)), Err(Error::InvalidArgument(_)));
        assert_matches!(parse_duration_secs(&json!(null)), Err(Error::InvalidArgument(_)));
    }

    #[test]
    fn test_source_filter_parsing() {
        assert_eq!(SourceFilter::from_query(None), SourceFilter::all());
        assert_eq!(
            SourceFilter::from_query(Some("ceph,orchestrator")),
            SourceFilter::all()
        );
        assert_eq!(
            SourceFilter::from_query(Some("orchestrator")),
            SourceFilter {
                local: false,
                orchestrator: true
            }
        );
    }
}
