/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Randomised local search.
//!
//! Every attempt:
//! 1. if free pods remain, offer a random one to a random node;
//! 2. pick a random pod on a random source node (or, with
//!    `steal_pod_chance` percent probability, on the busiest node) and a
//!    random destination;
//! 3. if the move keeps both nodes valid, or either node is already
//!    invalid, score the `[source, destination]` pair before and after;
//! 4. commit only strict improvements, then offer a free pod to the
//!    source node that was just relieved.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use super::{random_pod_index, Algorithm};
use crate::cancel::CancelSignal;
use crate::constraints::ConstraintSet;
use crate::model::{MovementInfo, NodeInfo, PodInfo};
use crate::preferences::PreferenceSet;

pub struct RandomAlgorithm {
    constraints: ConstraintSet,
    preferences: PreferenceSet,
    attempts: usize,
    steal_pod_chance: u32,
    rng: StdRng,
}

impl RandomAlgorithm {
    pub fn new(
        constraints: ConstraintSet,
        preferences: PreferenceSet,
        attempts: usize,
        rng: StdRng,
    ) -> Self {
        Self {
            constraints,
            preferences,
            attempts,
            steal_pod_chance: 0,
            rng,
        }
    }

    /// Percent chance, clamped to 100, of taking the moved pod from the
    /// busiest node.
    pub fn with_steal_pod_chance(mut self, percent: u32) -> Self {
        self.steal_pod_chance = percent.min(100);
        self
    }

    fn try_add_random_pod(&mut self, node: &mut NodeInfo, free: &mut Vec<PodInfo>) -> bool {
        if free.is_empty() {
            return false;
        }
        let idx = self.rng.gen_range(0..free.len());
        let pod = free.swap_remove(idx);
        match self.constraints.try_place(node, pod) {
            Ok(()) => true,
            Err(pod) => {
                free.push(pod);
                false
            }
        }
    }

    fn pick_source(&mut self, nodes: &[NodeInfo]) -> usize {
        if self.rng.gen_range(0..100) < self.steal_pod_chance {
            if let Some(i) = busiest(nodes) {
                return i;
            }
        }
        self.rng.gen_range(0..nodes.len())
    }

    /// Returns `true` if a move was committed.
    fn try_to_reschedule(&mut self, nodes: &mut [NodeInfo], free: &mut Vec<PodInfo>) -> bool {
        let src = self.pick_source(nodes);
        let dst = self.rng.gen_range(0..nodes.len());
        if src == dst {
            return false;
        }
        let Some(p) = random_pod_index(&mut self.rng, &nodes[src]) else {
            return false;
        };

        let mv = MovementInfo {
            pod: nodes[src].pods[p].clone(),
            old_node: nodes[src].clone(),
            new_node: nodes[dst].clone(),
        };
        let allowed = self.constraints.check_for_move(&mv)
            || !self.constraints.check(&nodes[src])
            || !self.constraints.check(&nodes[dst]);
        if !allowed {
            return false;
        }

        let (before, after) = self.preferences.apply_for_move(&mv);
        if after <= before {
            return false;
        }

        if let Some(pod) = self.constraints.evict(&mut nodes[src], &mv.pod.name) {
            self.constraints.place(&mut nodes[dst], pod);
        }
        self.try_add_random_pod(&mut nodes[src], free);
        true
    }
}

impl Algorithm for RandomAlgorithm {
    fn run(
        &mut self,
        nodes: &[NodeInfo],
        free_pods: Vec<PodInfo>,
        cancel: &CancelSignal,
    ) -> (Vec<NodeInfo>, bool) {
        if nodes.is_empty() {
            let feasible = free_pods.is_empty();
            return (Vec::new(), feasible);
        }

        let mut nodes = nodes.to_vec();
        self.constraints.init(&mut nodes);
        let mut free = free_pods;
        let mut moves = 0usize;
        let mut placed = 0usize;

        for attempt in 0..self.attempts {
            if cancel.is_cancelled() {
                debug!(attempt, "Random search cancelled");
                break;
            }
            if !free.is_empty() {
                let i = self.rng.gen_range(0..nodes.len());
                if self.try_add_random_pod(&mut nodes[i], &mut free) {
                    placed += 1;
                }
            }
            if self.try_to_reschedule(&mut nodes, &mut free) {
                moves += 1;
            }
        }

        let feasible = self.constraints.check_for_all(&nodes) && free.is_empty();
        debug!(
            attempts = self.attempts,
            moves,
            placed,
            unplaced = free.len(),
            feasible,
            "Random search finished"
        );
        (nodes, feasible)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

fn busiest(nodes: &[NodeInfo]) -> Option<usize> {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| !n.pods.is_empty())
        .max_by(|(_, a), (_, b)| a.load().total_cmp(&b.load()))
        .map(|(i, _)| i)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
