/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hard placement rules.
//!
//! A node is *valid* when every active constraint accepts it.  Constraints
//! are evaluated per node and keep small incremental state on the node
//! itself (see the bookkeeping fields of [`NodeInfo`]), so adding or removing
//! a pod never needs a full recount.
//!
//! | Constraint        | Always on | Rejects a node when                                   |
//! |-------------------|-----------|-------------------------------------------------------|
//! | `Base`            | yes       | used CPU or memory exceeds capacity                   |
//! | `Ports`           | yes       | two pods bind the same host `(ip, port)`              |
//! | `TaintToleration` | yes       | a pod does not tolerate a `NoSchedule`/`NoExecute` taint |
//! | `PodAffinity`     | yes       | an affinity term is unmet or an anti-affinity term hits |
//! | `PodsCount`       | no        | more pods than `maxCount`                             |
//! | `ResourceRange`   | no        | utilisation leaves the configured percent band        |
//!
//! # Contract
//! Pods are moved only through [`ConstraintSet::place`] and
//! [`ConstraintSet::evict`], which update the node's totals *and* the
//! bookkeeping together.  After a node's pods are replaced wholesale,
//! [`ConstraintSet::init_node`] rebuilds the bookkeeping from scratch.

mod base;
mod pod_affinity;
mod pods_count;
mod ports;
mod resource_range;
mod taint_toleration;

pub use pods_count::PodsCount;
pub use resource_range::ResourceRange;

use tracing::{debug, warn};

use crate::config::ConstraintArgs;
use crate::model::{MovementInfo, NodeInfo, PodInfo};

// ── Constraint ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Base,
    Ports,
    TaintToleration,
    PodAffinity,
    PodsCount(PodsCount),
    ResourceRange(ResourceRange),
}

impl Constraint {
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Base => "base",
            Constraint::Ports => "ports",
            Constraint::TaintToleration => "taintToleration",
            Constraint::PodAffinity => "podAffinity",
            Constraint::PodsCount(_) => "podsCount",
            Constraint::ResourceRange(_) => "resourceRange",
        }
    }

    /// Rebuilds this constraint's bookkeeping from the node's current pods.
    fn init(&self, node: &mut NodeInfo) {
        match self {
            Constraint::Ports => ports::init(node),
            Constraint::TaintToleration => taint_toleration::init(node),
            _ => {}
        }
    }

    /// Called after `pod` was pushed onto `node.pods`.
    fn on_add(&self, node: &mut NodeInfo, pod: &PodInfo) {
        match self {
            Constraint::Ports => ports::on_add(node, pod),
            Constraint::TaintToleration => taint_toleration::on_add(node, pod),
            _ => {}
        }
    }

    /// Called after `pod` was taken out of `node.pods`.
    fn on_remove(&self, node: &mut NodeInfo, pod: &PodInfo) {
        match self {
            Constraint::Ports => ports::on_remove(node, pod),
            Constraint::TaintToleration => taint_toleration::on_remove(node, pod),
            _ => {}
        }
    }

    pub fn check(&self, node: &NodeInfo) -> bool {
        match self {
            Constraint::Base => base::check(node),
            Constraint::Ports => ports::check(node),
            Constraint::TaintToleration => taint_toleration::check(node),
            Constraint::PodAffinity => pod_affinity::check(node),
            Constraint::PodsCount(c) => c.check(node),
            Constraint::ResourceRange(c) => c.check(node),
        }
    }
}

// ── ConstraintSet ─────────────────────────────────────────────────────────────

/// The active constraints of one planning cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    items: Vec<Constraint>,
}

impl Default for ConstraintSet {
    /// Only the always-on constraints.
    fn default() -> Self {
        Self {
            items: vec![
                Constraint::Base,
                Constraint::Ports,
                Constraint::TaintToleration,
                Constraint::PodAffinity,
            ],
        }
    }
}

impl ConstraintSet {
    /// Builds the always-on constraints plus whichever optional ones are
    /// configured.  An inverted resource range is dropped with a warning.
    pub fn from_args(args: &ConstraintArgs) -> Self {
        let mut set = Self::default();

        if let Some(range) = args.resource_range {
            match ResourceRange::new(range) {
                Some(rr) => set.items.push(Constraint::ResourceRange(rr)),
                None => warn!(
                    min_cpu = range.min_cpu,
                    max_cpu = range.max_cpu,
                    min_memory = range.min_memory,
                    max_memory = range.max_memory,
                    "Ignoring resourceRange constraint: minimum above maximum"
                ),
            }
        }
        if let Some(count) = args.pods_count {
            set.items.push(Constraint::PodsCount(PodsCount::new(count.max_count)));
        }

        debug!(
            constraints = ?set.items.iter().map(Constraint::name).collect::<Vec<_>>(),
            "Constraint set ready"
        );
        set
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.items.push(constraint);
        self
    }

    pub fn items(&self) -> &[Constraint] {
        &self.items
    }

    pub fn init(&self, nodes: &mut [NodeInfo]) {
        for node in nodes {
            self.init_node(node);
        }
    }

    pub fn init_node(&self, node: &mut NodeInfo) {
        node.ports.clear();
        node.untolerated.clear();
        for c in &self.items {
            c.init(node);
        }
    }

    /// Assigns `pod` to `node` without checking validity.
    pub fn place(&self, node: &mut NodeInfo, pod: PodInfo) {
        node.add_pod(pod.clone());
        for c in &self.items {
            c.on_add(node, &pod);
        }
    }

    /// Removes the pod called `name` from `node`.
    pub fn evict(&self, node: &mut NodeInfo, name: &str) -> Option<PodInfo> {
        let pod = node.remove_pod(name)?;
        for c in &self.items {
            c.on_remove(node, &pod);
        }
        Some(pod)
    }

    /// Places `pod` only if the node stays valid; otherwise hands it back.
    pub fn try_place(&self, node: &mut NodeInfo, pod: PodInfo) -> Result<(), PodInfo> {
        let name = pod.name.clone();
        self.place(node, pod);
        if self.check(node) {
            return Ok(());
        }
        match self.evict(node, &name) {
            Some(pod) => Err(pod),
            None => Ok(()),
        }
    }

    pub fn check(&self, node: &NodeInfo) -> bool {
        self.items.iter().all(|c| c.check(node))
    }

    pub fn check_for_all(&self, nodes: &[NodeInfo]) -> bool {
        nodes.iter().all(|n| self.check(n))
    }

    /// Whether both endpoints would be valid after the move.  Works on copies;
    /// `mv` is left untouched.
    pub fn check_for_move(&self, mv: &MovementInfo) -> bool {
        let mut old_node = mv.old_node.clone();
        let mut new_node = mv.new_node.clone();
        self.place(&mut new_node, mv.pod.clone());
        self.evict(&mut old_node, &mv.pod.name);
        self.check(&old_node) && self.check(&new_node)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
