/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Shrink policy.
//!
//! After an initial feasible run, nodes are removed one by one:
//!
//! * with an [`Optimizer`], the consolidation pass decides which nodes go;
//! * otherwise each step removes the first empty node (or a random one if
//!   none is empty), hands its pods back to the algorithm as free pods, and
//!   keeps the removal only if the re-run is still feasible.
//!
//! An infeasible initial run grows the cluster instead.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use super::{grow, NodePolicy, PolicyOutcome};
use crate::algorithm::{Algorithm, Optimizer};
use crate::cancel::CancelSignal;
use crate::model::NodeInfo;

pub struct ShrinkPolicy {
    /// Growth bound when the initial run is infeasible.  `0` means unbounded.
    max_nodes: usize,
    optimizer: Option<Optimizer>,
    rng: StdRng,
}

impl ShrinkPolicy {
    pub fn new(max_nodes: usize, rng: StdRng) -> Self {
        Self {
            max_nodes,
            optimizer: None,
            rng,
        }
    }

    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    fn pick_victim(&mut self, nodes: &[NodeInfo]) -> usize {
        nodes
            .iter()
            .position(|n| n.pods.is_empty())
            .unwrap_or_else(|| self.rng.gen_range(0..nodes.len()))
    }

    fn remove_one_by_one(
        &mut self,
        algorithm: &mut dyn Algorithm,
        mut current: Vec<NodeInfo>,
        cancel: &CancelSignal,
    ) -> PolicyOutcome {
        let mut deleted = Vec::new();

        while current.len() > 1 && !cancel.is_cancelled() {
            let victim = self.pick_victim(&current);
            let mut remaining = current.clone();
            let removed = remaining.remove(victim);

            let (next, feasible) = algorithm.run(&remaining, removed.pods.clone(), cancel);
            if !feasible {
                debug!(node = %removed.name, pods = removed.pods.len(), "Cannot remove node");
                break;
            }
            info!(node = %removed.name, "Planning node removal");
            deleted.push(removed);
            current = next;
        }

        PolicyOutcome {
            nodes: current,
            to_create: Vec::new(),
            to_delete: deleted,
            feasible: true,
        }
    }
}

impl NodePolicy for ShrinkPolicy {
    fn run(
        &mut self,
        algorithm: &mut dyn Algorithm,
        nodes: &[NodeInfo],
        cancel: &CancelSignal,
    ) -> PolicyOutcome {
        let (current, feasible) = algorithm.run(nodes, Vec::new(), cancel);
        if !feasible {
            debug!("Initial assignment infeasible, growing instead of shrinking");
            return grow(algorithm, current, self.max_nodes, cancel);
        }
        if current.is_empty() {
            return PolicyOutcome {
                feasible,
                ..Default::default()
            };
        }

        let Some(optimizer) = self.optimizer.as_mut() else {
            return self.remove_one_by_one(algorithm, current, cancel);
        };

        let optimized = optimizer.optimize(&current, cancel);
        let kept: BTreeSet<&str> = optimized.iter().map(|n| n.name.as_str()).collect();
        let to_delete = current
            .iter()
            .filter(|n| !kept.contains(n.name.as_str()))
            .cloned()
            .collect();
        PolicyOutcome {
            nodes: optimized,
            to_create: Vec::new(),
            to_delete,
            feasible,
        }
    }

    fn name(&self) -> &'static str {
        "shrink"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
