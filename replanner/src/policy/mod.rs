/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Node-count policies.
//!
//! A policy drives an [`Algorithm`] and decides whether the cluster may gain
//! or lose machines along the way.
//!
//! | Policy       | Adds nodes            | Removes nodes                    |
//! |--------------|-----------------------|----------------------------------|
//! | `Keep`       | never                 | never                            |
//! | `OnlyGrow`   | while infeasible      | never                            |
//! | `Shrink`     | while infeasible      | while the rest stays feasible    |
//!
//! Planned nodes are named `planned-node-<n>` and copy the capacity, labels
//! and taints of the first node in the cluster.

mod keep;
mod only_grow;
mod shrink;

pub use keep::KeepPolicy;
pub use only_grow::OnlyGrowPolicy;
pub use shrink::ShrinkPolicy;

use tracing::{debug, info, warn};

use crate::algorithm::Algorithm;
use crate::cancel::CancelSignal;
use crate::model::NodeInfo;

pub const PLANNED_NODE_PREFIX: &str = "planned-node-";

/// Result of a policy run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyOutcome {
    /// Final assignment, including planned nodes and excluding deleted ones.
    pub nodes: Vec<NodeInfo>,
    pub to_create: Vec<NodeInfo>,
    pub to_delete: Vec<NodeInfo>,
    pub feasible: bool,
}

pub trait NodePolicy: Send {
    fn run(
        &mut self,
        algorithm: &mut dyn Algorithm,
        nodes: &[NodeInfo],
        cancel: &CancelSignal,
    ) -> PolicyOutcome;

    fn name(&self) -> &'static str;
}

/// First `planned-node-<n>` name not already taken.
fn next_node_name(nodes: &[NodeInfo], counter: &mut usize) -> String {
    loop {
        *counter += 1;
        let name = format!("{PLANNED_NODE_PREFIX}{counter}");
        if !nodes.iter().any(|n| n.name == name) {
            return name;
        }
    }
}

/// Adds template nodes one at a time, re-running `algorithm` after each,
/// until the assignment is feasible, the cluster reaches `max_nodes`
/// (`0` = unbounded) or the cycle is cancelled.
fn grow(
    algorithm: &mut dyn Algorithm,
    mut nodes: Vec<NodeInfo>,
    max_nodes: usize,
    cancel: &CancelSignal,
) -> PolicyOutcome {
    let Some(template) = nodes.first().cloned() else {
        warn!("Cannot grow an empty cluster: no node to copy capacity from");
        return PolicyOutcome::default();
    };

    let mut created: Vec<String> = Vec::new();
    let mut counter = 0usize;
    let mut feasible = false;

    while !feasible {
        if cancel.is_cancelled() {
            debug!(created = created.len(), "Growth cancelled");
            break;
        }
        if max_nodes > 0 && nodes.len() >= max_nodes {
            warn!(max_nodes, "Node limit reached while still infeasible");
            break;
        }

        let name = next_node_name(&nodes, &mut counter);
        info!(node = %name, "Planning new node");
        nodes.push(NodeInfo::from_template(name.clone(), &template));
        created.push(name);

        let (next, ok) = algorithm.run(&nodes, Vec::new(), cancel);
        nodes = next;
        feasible = ok;
    }

    let to_create = nodes
        .iter()
        .filter(|n| created.contains(&n.name))
        .cloned()
        .collect();
    PolicyOutcome {
        nodes,
        to_create,
        to_delete: Vec::new(),
        feasible,
    }
}
