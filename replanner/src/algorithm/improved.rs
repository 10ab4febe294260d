/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Evict-and-reinsert search.
//!
//! Each round starts from the best assignment found so far, evicts a
//! bounded random sample of pods, and reinserts them together with any
//! still-free pods using *max-fit*: every pod goes to the valid node that
//! keeps the most free room afterwards.  A round is kept when every evicted
//! pod found a home, no more nodes are invalid than before, and it either
//! repairs a node, places more of the free pods or raises the preference
//! score.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use super::{random_pod_index, Algorithm};
use crate::cancel::CancelSignal;
use crate::constraints::ConstraintSet;
use crate::model::{NodeInfo, PodInfo};
use crate::preferences::PreferenceSet;

pub struct ImprovedAlgorithm {
    constraints: ConstraintSet,
    preferences: PreferenceSet,
    attempts: usize,
    evictions_per_round: usize,
    rng: StdRng,
}

impl ImprovedAlgorithm {
    pub fn new(
        constraints: ConstraintSet,
        preferences: PreferenceSet,
        attempts: usize,
        evictions_per_round: usize,
        rng: StdRng,
    ) -> Self {
        Self {
            constraints,
            preferences,
            attempts,
            evictions_per_round,
            rng,
        }
    }

    /// Up to `evictions_per_round` random draws; draws that hit an empty
    /// node are spent without evicting.
    fn evict_sample(&mut self, nodes: &mut [NodeInfo]) -> Vec<PodInfo> {
        let mut evicted = Vec::new();
        for _ in 0..self.evictions_per_round {
            let i = self.rng.gen_range(0..nodes.len());
            let Some(p) = random_pod_index(&mut self.rng, &nodes[i]) else {
                continue;
            };
            let name = nodes[i].pods[p].name.clone();
            if let Some(pod) = self.constraints.evict(&mut nodes[i], &name) {
                evicted.push(pod);
            }
        }
        evicted
    }

    fn invalid_nodes(&self, nodes: &[NodeInfo]) -> usize {
        nodes.iter().filter(|n| !self.constraints.check(n)).count()
    }

    /// Places each pod on the valid node with the largest free ratio
    /// afterwards.  Returns the pods that fit nowhere.
    fn max_fit(&self, nodes: &mut [NodeInfo], pods: Vec<PodInfo>) -> Vec<PodInfo> {
        let mut unplaced = Vec::new();
        for pod in pods {
            let mut target: Option<(usize, f64)> = None;
            for (i, node) in nodes.iter_mut().enumerate() {
                if self.constraints.try_place(node, pod.clone()).is_err() {
                    continue;
                }
                let room = node.max_free_ratio();
                self.constraints.evict(node, &pod.name);
                if target.map_or(true, |(_, best)| room > best) {
                    target = Some((i, room));
                }
            }
            match target {
                Some((i, _)) => self.constraints.place(&mut nodes[i], pod),
                None => unplaced.push(pod),
            }
        }
        unplaced
    }
}

impl Algorithm for ImprovedAlgorithm {
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

        let mut best = nodes.to_vec();
        self.constraints.init(&mut best);
        let mut best_score = self.preferences.apply(&best);
        let mut best_violations = self.invalid_nodes(&best);
        let mut free = free_pods;
        let mut accepted = 0usize;

        for round in 0..self.attempts {
            if cancel.is_cancelled() {
                debug!(round, "Improved search cancelled");
                break;
            }

            let mut trial = best.clone();
            let evicted = self.evict_sample(&mut trial);
            let evicted_names: BTreeSet<String> = evicted.iter().map(|p| p.name.clone()).collect();

            let mut pending = evicted;
            pending.extend(free.iter().cloned());
            let leftover = self.max_fit(&mut trial, pending);

            if leftover.iter().any(|p| evicted_names.contains(&p.name)) {
                continue;
            }
            let violations = self.invalid_nodes(&trial);
            if violations > best_violations {
                continue;
            }

            let score = self.preferences.apply(&trial);
            if violations < best_violations || leftover.len() < free.len() || score > best_score {
                best = trial;
                best_score = score;
                best_violations = violations;
                free = leftover;
                accepted += 1;
            }
        }

        let feasible = self.constraints.check_for_all(&best) && free.is_empty();
        debug!(
            rounds = self.attempts,
            accepted,
            score = best_score,
            unplaced = free.len(),
            feasible,
            "Improved search finished"
        );
        (best, feasible)
    }

    fn name(&self) -> &'static str {
        "improved"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::Preference;
    use rand::SeedableRng;

    fn search(pref: Preference, attempts: usize, evictions: usize) -> ImprovedAlgorithm {
        ImprovedAlgorithm::new(
            ConstraintSet::default(),
            PreferenceSet::weighted(vec![(pref, 1.0)]),
            attempts,
            evictions,
            StdRng::seed_from_u64(5),
        )
    }

    fn all_names(nodes: &[NodeInfo]) -> BTreeSet<String> {
        nodes
            .iter()
            .flat_map(|n| n.pods.iter().map(|p| p.name.clone()))
            .collect()
    }

    #[test]
    fn zero_attempts_leaves_nodes_unchanged() {
        let mut a = NodeInfo::new("a", 1000, 1000);
        a.add_pod(PodInfo::new("p", 100, 100));
        let input = vec![a, NodeInfo::new("b", 1000, 1000)];
        let (out, feasible) = search(Preference::Uniform, 0, 10).run(&input, vec![], &CancelSignal::never());
        assert_eq!(out, input);
        assert!(feasible);
    }

    #[test]
    fn max_fit_picks_roomiest_node() {
        let algo = search(Preference::Uniform, 0, 0);
        let mut busy = NodeInfo::new("busy", 1000, 1000);
        busy.add_pod(PodInfo::new("x", 600, 600));
        let mut nodes = vec![busy, NodeInfo::new("idle", 1000, 1000)];
        let left = algo.max_fit(&mut nodes, vec![PodInfo::new("p", 100, 100)]);
        assert!(left.is_empty());
        assert!(nodes[1].has_pod("p"));
    }

    #[test]
    fn max_fit_returns_pods_that_fit_nowhere() {
        let algo = search(Preference::Uniform, 0, 0);
        let mut nodes = vec![NodeInfo::new("a", 100, 100)];
        let left = algo.max_fit(&mut nodes, vec![PodInfo::new("big", 200, 1)]);
        assert_eq!(left.len(), 1);
        assert!(nodes[0].pods.is_empty());
    }

    #[test]
    fn free_pods_are_placed() {
        let input = vec![NodeInfo::new("a", 1000, 1000), NodeInfo::new("b", 1000, 1000)];
        let free: Vec<_> = (0..4).map(|i| PodInfo::new(format!("f{i}"), 400, 400)).collect();
        let (out, feasible) = search(Preference::Uniform, 5, 2).run(&input, free, &CancelSignal::never());
        assert!(feasible);
        assert_eq!(all_names(&out).len(), 4);
        assert_eq!(out[0].pods.len(), 2);
    }

    #[test]
    fn rounds_never_lose_pods() {
        let mut nodes = Vec::new();
        for n in 0..3 {
            let mut node = NodeInfo::new(format!("n{n}"), 1000, 1000);
            for p in 0..3 {
                node.add_pod(PodInfo::new(format!("n{n}-p{p}"), 250, 100 * (p + 1)));
            }
            nodes.push(node);
        }
        let before = all_names(&nodes);
        let (out, feasible) =
            search(Preference::MaximizeInequality, 50, 4).run(&nodes, vec![], &CancelSignal::never());
        assert!(feasible);
        assert_eq!(all_names(&out), before);
        assert!(ConstraintSet::default().check_for_all(&out));
    }

    #[test]
    fn overloaded_node_is_repaired_onto_spare_capacity() {
        let mut hot = NodeInfo::new("hot", 1000, 1000);
        for i in 0..3 {
            hot.add_pod(PodInfo::new(format!("p{i}"), 400, 400));
        }
        let input = vec![hot, NodeInfo::new("spare", 1000, 1000)];
        let (out, feasible) = search(Preference::Uniform, 40, 1).run(&input, vec![], &CancelSignal::never());
        assert!(feasible);
        assert!(ConstraintSet::default().check_for_all(&out));
        assert_eq!(all_names(&out).len(), 3);
    }

    #[test]
    fn score_never_decreases_without_new_placements() {
        let mut a = NodeInfo::new("a", 1000, 1000);
        for i in 0..4 {
            a.add_pod(PodInfo::new(format!("p{i}"), 200, 200));
        }
        let input = vec![a, NodeInfo::new("b", 1000, 1000)];
        let prefs = PreferenceSet::weighted(vec![(Preference::Uniform, 1.0)]);
        let before = prefs.apply(&input);
        let (out, _) = search(Preference::Uniform, 30, 2).run(&input, vec![], &CancelSignal::never());
        assert!(prefs.apply(&out) >= before);
    }
}
