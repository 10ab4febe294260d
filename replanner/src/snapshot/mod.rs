/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cluster snapshots.
//!
//! The planner's only view of the cluster is a YAML document listing nodes,
//! their capacity and the pods bound to them:
//!
//! ```yaml
//! nodes:
//!   - name: worker-1
//!     capacity: { cpu: "4", memory: 8Gi }
//!     allocatable: { cpu: 3500m, memory: 7Gi }
//!     labels: { topology.kubernetes.io/zone: eu-1a }
//!     taints:
//!       - { key: dedicated, value: db, effect: NoSchedule }
//!     pods:
//!       - name: web-7d4b9
//!         requests: { cpu: 250m, memory: 512Mi }
//!         hostPorts: [{ port: 8080 }]
//! ```
//!
//! Conversion to [`NodeInfo`] uses millicores for CPU and whole bytes for
//! memory (the milli-value divided by 1000, truncated).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{HostPort, NodeInfo, PodAffinityTerm, PodInfo, Taint, Toleration};
use crate::quantity::Quantity;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("node '{node}' has zero {resource} capacity")]
    ZeroCapacity { node: String, resource: &'static str },

    #[error("node '{0}' appears more than once")]
    DuplicateNode(String),

    #[error("pod '{pod}' appears on both '{first}' and '{second}'")]
    DuplicatePod {
        pod: String,
        first: String,
        second: String,
    },

    #[error("pod '{pod}' on node '{node}' requests negative {resource}")]
    NegativeRequest {
        pod: String,
        node: String,
        resource: &'static str,
    },
}

// ── Document types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub cpu: Quantity,
    #[serde(default)]
    pub memory: Quantity,
}

impl ResourceList {
    pub fn millicores(&self) -> i64 {
        self.cpu.milli_value()
    }

    pub fn bytes(&self) -> i64 {
        self.memory.milli_value() / 1000
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSnapshot {
    pub name: String,
    #[serde(default)]
    pub requests: ResourceList,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_ports: Vec<HostPort>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affinity: Vec<PodAffinityTerm>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub name: String,
    pub capacity: ResourceList,
    /// Defaults to `capacity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocatable: Option<ResourceList>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub pods: Vec<PodSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,
}

impl ClusterSnapshot {
    /// # Errors
    /// Returns an error if the file cannot be opened or is not a valid
    /// snapshot document.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading cluster snapshot from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open snapshot file: {}", path.display()))?;
        let snapshot: ClusterSnapshot = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            nodes = snapshot.nodes.len(),
            pods = snapshot.nodes.iter().map(|n| n.pods.len()).sum::<usize>(),
            "Loaded cluster snapshot"
        );
        Ok(snapshot)
    }

    /// Converts the document into working nodes, validating identities and
    /// capacities.
    pub fn to_node_infos(&self) -> Result<Vec<NodeInfo>, SnapshotError> {
        let mut node_names = BTreeSet::new();
        let mut pod_owner: BTreeMap<&str, &str> = BTreeMap::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for ns in &self.nodes {
            if !node_names.insert(ns.name.as_str()) {
                return Err(SnapshotError::DuplicateNode(ns.name.clone()));
            }

            let capacity = ns.capacity;
            let allocatable = ns.allocatable.unwrap_or(capacity);
            if capacity.millicores() <= 0 {
                return Err(SnapshotError::ZeroCapacity {
                    node: ns.name.clone(),
                    resource: "cpu",
                });
            }
            if capacity.bytes() <= 0 {
                return Err(SnapshotError::ZeroCapacity {
                    node: ns.name.clone(),
                    resource: "memory",
                });
            }

            let mut node = NodeInfo::new(ns.name.clone(), capacity.millicores(), capacity.bytes())
                .with_available(allocatable.millicores(), allocatable.bytes());
            node.labels = ns.labels.clone();
            node.taints = ns.taints.clone();

            for ps in &ns.pods {
                if let Some(first) = pod_owner.insert(ps.name.as_str(), ns.name.as_str()) {
                    return Err(SnapshotError::DuplicatePod {
                        pod: ps.name.clone(),
                        first: first.to_string(),
                        second: ns.name.clone(),
                    });
                }
                node.add_pod(pod_info(ps, &ns.name)?);
            }

            debug!(
                node = %node.name,
                cpu = node.max_cpu,
                memory = node.max_memory,
                pods = node.pods.len(),
                "Node loaded"
            );
            nodes.push(node);
        }

        Ok(nodes)
    }
}

fn pod_info(ps: &PodSnapshot, node: &str) -> Result<PodInfo, SnapshotError> {
    let negative = |resource| SnapshotError::NegativeRequest {
        pod: ps.name.clone(),
        node: node.to_string(),
        resource,
    };
    let cpu = ps.requests.millicores();
    let memory = ps.requests.bytes();
    if cpu < 0 {
        return Err(negative("cpu"));
    }
    if memory < 0 {
        return Err(negative("memory"));
    }

    Ok(PodInfo {
        name: ps.name.clone(),
        cpu,
        memory,
        host_ports: ps.host_ports.clone(),
        tolerations: ps.tolerations.clone(),
        labels: ps.labels.clone(),
        affinity: ps.affinity.clone(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AffinityKind, TaintEffect};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const SAMPLE: &str = r#"
nodes:
  - name: worker-1
    capacity: { cpu: "4", memory: 8Gi }
    allocatable: { cpu: 3500m, memory: 7Gi }
    labels: { zone: a }
    taints:
      - { key: dedicated, value: db, effect: NoSchedule }
    pods:
      - name: db-0
        requests: { cpu: 500m, memory: 1Gi }
        hostPorts: [{ port: 5432 }]
        tolerations:
          - { key: dedicated, operator: Equal, value: db, effect: NoSchedule }
        labels: { app: db }
        affinity:
          - kind: AntiAffinity
            matchLabels: { app: db }
  - name: worker-2
    capacity: { cpu: 2, memory: 4Gi }
"#;

    #[test]
    fn load_and_convert_sample() {
        let f = yaml_tempfile(SAMPLE);
        let snapshot = ClusterSnapshot::load_from_file(f.path()).unwrap();
        let nodes = snapshot.to_node_infos().unwrap();

        assert_eq!(nodes.len(), 2);
        let w1 = &nodes[0];
        assert_eq!(w1.max_cpu, 4000);
        assert_eq!(w1.available_cpu, 3500);
        assert_eq!(w1.max_memory, 8 * 1024 * 1024 * 1024);
        assert_eq!(w1.available_memory, 7 * 1024 * 1024 * 1024);
        assert_eq!(w1.taints[0].effect, TaintEffect::NoSchedule);
        assert_eq!(w1.labels.get("zone").map(String::as_str), Some("a"));

        let db = &w1.pods[0];
        assert_eq!(db.cpu, 500);
        assert_eq!(db.memory, 1024 * 1024 * 1024);
        assert_eq!(db.host_ports[0].port, 5432);
        assert_eq!(db.affinity[0].kind, AffinityKind::AntiAffinity);
        assert_eq!(w1.pods_cpu, 500);

        let w2 = &nodes[1];
        assert_eq!(w2.available_cpu, w2.max_cpu, "allocatable defaults to capacity");
        assert!(w2.pods.is_empty());
    }

    #[test]
    fn fractional_memory_is_truncated_to_bytes() {
        let snap: ClusterSnapshot = serde_yaml::from_str(
            "nodes:\n  - name: n\n    capacity: { cpu: 1, memory: 1500m }\n",
        )
        .unwrap();
        assert_eq!(snap.to_node_infos().unwrap()[0].max_memory, 1);
    }

    #[test]
    fn duplicate_pod_names_are_rejected() {
        let snap: ClusterSnapshot = serde_yaml::from_str(
            r#"
nodes:
  - name: a
    capacity: { cpu: 1, memory: 1Gi }
    pods: [{ name: p }]
  - name: b
    capacity: { cpu: 1, memory: 1Gi }
    pods: [{ name: p }]
"#,
        )
        .unwrap();
        assert_eq!(
            snap.to_node_infos(),
            Err(SnapshotError::DuplicatePod {
                pod: "p".into(),
                first: "a".into(),
                second: "b".into()
            })
        );
    }

    #[test]
    fn duplicate_node_names_are_rejected() {
        let snap: ClusterSnapshot = serde_yaml::from_str(
            "nodes:\n  - { name: a, capacity: { cpu: 1, memory: 1 } }\n  - { name: a, capacity: { cpu: 1, memory: 1 } }\n",
        )
        .unwrap();
        assert_eq!(snap.to_node_infos(), Err(SnapshotError::DuplicateNode("a".into())));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let snap: ClusterSnapshot =
            serde_yaml::from_str("nodes:\n  - { name: z, capacity: { cpu: 0, memory: 1Gi } }\n")
                .unwrap();
        assert!(matches!(
            snap.to_node_infos(),
            Err(SnapshotError::ZeroCapacity { resource: "cpu", .. })
        ));
    }

    #[test]
    fn bad_quantity_fails_to_load() {
        let f = yaml_tempfile("nodes:\n  - { name: n, capacity: { cpu: lots, memory: 1Gi } }\n");
        assert!(ClusterSnapshot::load_from_file(f.path()).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        assert!(ClusterSnapshot::load_from_file(Path::new("/nonexistent/snapshot.yaml")).is_err());
    }

    #[test]
    fn snapshot_round_trips_through_yaml() {
        let snap: ClusterSnapshot = serde_yaml::from_str(SAMPLE).unwrap();
        let text = serde_yaml::to_string(&snap).unwrap();
        let again: ClusterSnapshot = serde_yaml::from_str(&text).unwrap();
        assert_eq!(again, snap);
    }
}
