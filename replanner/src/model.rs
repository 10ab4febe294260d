/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core cluster data structures for the replanner.
//!
//! ```text
//! ClusterSnapshot ──(to_node_infos)──►  NodeInfo / PodInfo  ──(policy)──►  Plan
//!                                        ↑ working copies                   ↑ output
//!                                        integer units                      movements + node diff
//! ```
//!
//! # Ownership model
//! Every algorithm, optimizer and policy receives `&[NodeInfo]` and returns a
//! fresh `Vec<NodeInfo>`.  The caller's slice is never touched, so a search
//! can always be abandoned without rolling anything back.
//!
//! # Units
//! CPU is carried in millicores and memory in bytes, both as `i64`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Host ports ────────────────────────────────────────────────────────────────

/// A host-level `(ip, port)` binding requested by a pod.
///
/// An empty `ip` means the wildcard address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostPort {
    #[serde(default)]
    pub ip: String,
    pub port: u16,
}

/// Per-node `(ip, port)` usage counters.
///
/// Tracks how many pods bind each pair, and how many *extra* bindings exist
/// beyond the first, so conflicts can be answered in O(1) and removals stay
/// exact when two pods share a port.
#[derive(Debug, Clone, Default)]
pub struct PortBook {
    usage: BTreeMap<(String, u16), u32>,
    conflicts: u32,
}

impl PortBook {
    pub fn bind(&mut self, port: &HostPort) {
        let count = self
            .usage
            .entry((port.ip.clone(), port.port))
            .or_insert(0);
        if *count > 0 {
            self.conflicts += 1;
        }
        *count += 1;
    }

    pub fn release(&mut self, port: &HostPort) {
        let key = (port.ip.clone(), port.port);
        if let Some(count) = self.usage.get_mut(&key) {
            *count -= 1;
            if *count > 0 {
                self.conflicts -= 1;
            } else {
                self.usage.remove(&key);
            }
        }
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflicts > 0
    }

    pub fn clear(&mut self) {
        self.usage.clear();
        self.conflicts = 0;
    }
}

// ── Taints and tolerations ────────────────────────────────────────────────────

/// Effect of a node taint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TaintEffect {
    /// Only these effects forbid placement; `PreferNoSchedule` is advisory.
    pub fn is_hard(self) -> bool {
        matches!(self, TaintEffect::NoSchedule | TaintEffect::NoExecute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TolerationOperator {
    #[default]
    Equal,
    Exists,
}

/// A pod's tolerance of node taints.
///
/// Matching follows the usual rules: an empty `effect` matches every effect,
/// an empty `key` with `Exists` matches every taint, `Exists` ignores the
/// value, and `Equal` compares it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Toleration {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub operator: TolerationOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<TaintEffect>,
}

impl Toleration {
    pub fn tolerates(&self, taint: &Taint) -> bool {
        if let Some(effect) = self.effect {
            if effect != taint.effect {
                return false;
            }
        }
        if self.key.is_empty() {
            return self.operator == TolerationOperator::Exists;
        }
        if self.key != taint.key {
            return false;
        }
        match self.operator {
            TolerationOperator::Exists => true,
            TolerationOperator::Equal => self.value == taint.value,
        }
    }
}

// ── Pod affinity ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AffinityKind {
    /// At least one *other* pod on the node must match the selector.
    Affinity,
    /// No other pod on the node may match the selector.
    AntiAffinity,
}

/// Node-scoped co-location rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodAffinityTerm {
    pub kind: AffinityKind,
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl PodAffinityTerm {
    /// An empty selector matches every pod.
    pub fn selects(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
    }
}

// ── PodInfo ───────────────────────────────────────────────────────────────────

/// A schedulable workload unit.
///
/// `name` is the pod's identity and is unique across the whole cluster;
/// [`ClusterSnapshot::to_node_infos`](crate::snapshot::ClusterSnapshot::to_node_infos)
/// rejects snapshots that violate this.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PodInfo {
    pub name: String,
    /// Requested CPU in millicores.
    pub cpu: i64,
    /// Requested memory in bytes.
    pub memory: i64,
    pub host_ports: Vec<HostPort>,
    pub tolerations: Vec<Toleration>,
    pub labels: BTreeMap<String, String>,
    pub affinity: Vec<PodAffinityTerm>,
}

impl PodInfo {
    pub fn new(name: impl Into<String>, cpu: i64, memory: i64) -> Self {
        Self {
            name: name.into(),
            cpu,
            memory,
            ..Default::default()
        }
    }

    /// Returns `true` if every hard taint in `taints` is tolerated.
    pub fn tolerates_all(&self, taints: &[Taint]) -> bool {
        taints
            .iter()
            .filter(|t| t.effect.is_hard())
            .all(|t| self.tolerations.iter().any(|tol| tol.tolerates(t)))
    }
}

// ── NodeInfo ──────────────────────────────────────────────────────────────────

/// A worker machine plus the pods currently assigned to it.
///
/// `available_*` is what the node offers to *all* workloads; the difference
/// `max_* - available_*` is usage the planner cannot move (system daemons,
/// unmanaged pods).  `pods_*` always equals the sum of the requests in `pods`
/// as long as pods are only added or removed through [`NodeInfo::add_pod`] and
/// [`NodeInfo::remove_pod`].
///
/// The trailing fields are per-constraint bookkeeping.  They are derived
/// state, rebuilt by [`ConstraintSet::init`](crate::constraints::ConstraintSet::init),
/// and ignored by `PartialEq`.
#[derive(Debug, Clone, Default)]
pub struct NodeInfo {
    pub name: String,
    pub max_cpu: i64,
    pub max_memory: i64,
    pub available_cpu: i64,
    pub available_memory: i64,
    pub labels: BTreeMap<String, String>,
    pub taints: Vec<Taint>,

    pub pods: Vec<PodInfo>,
    pub pods_cpu: i64,
    pub pods_memory: i64,

    // ── Constraint bookkeeping ────────────────────────────────────────────────
    pub ports: PortBook,
    /// Names of pods on this node that do not tolerate one of its hard taints.
    pub untolerated: Vec<String>,
}

impl NodeInfo {
    /// An empty node whose whole capacity is available.
    pub fn new(name: impl Into<String>, max_cpu: i64, max_memory: i64) -> Self {
        Self {
            name: name.into(),
            max_cpu,
            max_memory,
            available_cpu: max_cpu,
            available_memory: max_memory,
            ..Default::default()
        }
    }

    pub fn with_available(mut self, cpu: i64, memory: i64) -> Self {
        self.available_cpu = cpu;
        self.available_memory = memory;
        self
    }

    /// A fresh, empty node with the same capacity, labels and taints as
    /// `template`.  Used when a policy plans a new machine.
    pub fn from_template(name: impl Into<String>, template: &NodeInfo) -> Self {
        Self {
            labels: template.labels.clone(),
            taints: template.taints.clone(),
            ..NodeInfo::new(name, template.max_cpu, template.max_memory)
        }
    }

    pub fn add_pod(&mut self, pod: PodInfo) {
        self.pods_cpu += pod.cpu;
        self.pods_memory += pod.memory;
        self.pods.push(pod);
    }

    /// Removes the pod called `name`, returning it if it was present.
    pub fn remove_pod(&mut self, name: &str) -> Option<PodInfo> {
        let idx = self.pods.iter().position(|p| p.name == name)?;
        let pod = self.pods.swap_remove(idx);
        self.pods_cpu -= pod.cpu;
        self.pods_memory -= pod.memory;
        Some(pod)
    }

    /// Drops every pod and all derived bookkeeping.
    pub fn clear_pods(&mut self) -> Vec<PodInfo> {
        self.pods_cpu = 0;
        self.pods_memory = 0;
        self.ports.clear();
        self.untolerated.clear();
        std::mem::take(&mut self.pods)
    }

    pub fn has_pod(&self, name: &str) -> bool {
        self.pods.iter().any(|p| p.name == name)
    }

    /// Total CPU in use: non-movable usage plus assigned pods.
    pub fn used_cpu(&self) -> i64 {
        self.max_cpu - self.available_cpu + self.pods_cpu
    }

    pub fn used_memory(&self) -> i64 {
        self.max_memory - self.available_memory + self.pods_memory
    }

    /// Fraction of CPU capacity in use.  `0.0` for a zero-capacity node.
    pub fn cpu_utilization(&self) -> f64 {
        ratio(self.used_cpu(), self.max_cpu)
    }

    pub fn memory_utilization(&self) -> f64 {
        ratio(self.used_memory(), self.max_memory)
    }

    /// Fraction of CPU capacity still free for managed pods.
    pub fn free_cpu_ratio(&self) -> f64 {
        ratio(self.available_cpu - self.pods_cpu, self.max_cpu)
    }

    pub fn free_memory_ratio(&self) -> f64 {
        ratio(self.available_memory - self.pods_memory, self.max_memory)
    }

    /// The scarcer of the two free ratios; low values mean "nearly full".
    pub fn min_free_ratio(&self) -> f64 {
        self.free_cpu_ratio().min(self.free_memory_ratio())
    }

    pub fn max_free_ratio(&self) -> f64 {
        self.free_cpu_ratio().max(self.free_memory_ratio())
    }

    /// The busier of the two utilisation ratios.
    pub fn load(&self) -> f64 {
        self.cpu_utilization().max(self.memory_utilization())
    }
}

impl PartialEq for NodeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.max_cpu == other.max_cpu
            && self.max_memory == other.max_memory
            && self.available_cpu == other.available_cpu
            && self.available_memory == other.available_memory
            && self.labels == other.labels
            && self.taints == other.taints
            && self.pods_cpu == other.pods_cpu
            && self.pods_memory == other.pods_memory
            && self.pods.len() == other.pods.len()
            && self.pods.iter().all(|p| other.pods.contains(p))
    }
}

fn ratio(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

// ── MovementInfo ──────────────────────────────────────────────────────────────

/// A proposed single-pod move, carrying snapshots of both endpoints *before*
/// the move.  Constraint and preference evaluation of a move never mutates
/// these snapshots.
#[derive(Debug, Clone)]
pub struct MovementInfo {
    pub pod: PodInfo,
    pub old_node: NodeInfo,
    pub new_node: NodeInfo,
}

// ── Plan ──────────────────────────────────────────────────────────────────────

/// One pod changing owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub pod: String,
    pub old_node: String,
    pub new_node: String,
}

/// Capacity of a node the plan asks to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    pub name: String,
    /// Millicores.
    pub cpu: i64,
    /// Bytes.
    pub memory: i64,
}

impl From<&NodeInfo> for NodeTemplate {
    fn from(node: &NodeInfo) -> Self {
        Self {
            name: node.name.clone(),
            cpu: node.max_cpu,
            memory: node.max_memory,
        }
    }
}

/// The final result of one planning cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub movements: Vec<Movement>,
    pub nodes_to_create: Vec<NodeTemplate>,
    pub nodes_to_delete: Vec<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty() && self.nodes_to_create.is_empty() && self.nodes_to_delete.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
