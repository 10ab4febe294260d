/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! ILP consolidation.
//!
//! Repeatedly tries to drain the emptiest non-empty node one pod at a time:
//!
//! ```text
//!  fullest ◄──────────── sorted by min free ratio ────────────► emptiest
//!  [ .. | n(lo) .. n(last-1) | n(last) | empty empty .. ]
//!         └──── window ─────┘   source   └─ dropped ─┘
//! ```
//!
//! A random pod of the source node plus every pod already in the window is
//! re-assigned across the window by a 0/1 program.  If every one of them
//! fits, the rebuilt window passes the constraint set, and the source stays
//! valid without the pod, the pod leaves the source.  Nodes that end up
//! empty are dropped from the result, which keeps the survivors in their
//! input order.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::ilp::{BinaryProgram, BranchAndBound, IlpSolver, SolveOutcome};
use super::random_pod_index;
use crate::cancel::CancelSignal;
use crate::constraints::ConstraintSet;
use crate::model::{NodeInfo, PodInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerSettings {
    /// Solver budget for each drain attempt.
    pub time_limit: Duration,
    /// How many of the next-emptiest nodes receive the drained pod.
    pub max_nodes_per_cycle: usize,
    /// Consecutive failed attempts before giving up.
    pub max_fail_attempts: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(1),
            max_nodes_per_cycle: 5,
            max_fail_attempts: 3,
        }
    }
}

pub struct Optimizer {
    settings: OptimizerSettings,
    constraints: ConstraintSet,
    solver: Box<dyn IlpSolver>,
    rng: StdRng,
}

impl Optimizer {
    pub fn new(settings: OptimizerSettings, constraints: ConstraintSet, rng: StdRng) -> Self {
        Self {
            settings,
            constraints,
            solver: Box::new(BranchAndBound),
            rng,
        }
    }

    pub fn with_solver(mut self, solver: impl IlpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Returns a subset of `nodes`, in input order, carrying the same pods.
    pub fn optimize(&mut self, nodes: &[NodeInfo], cancel: &CancelSignal) -> Vec<NodeInfo> {
        let order: BTreeMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.as_str(), i))
            .collect();

        let mut work = nodes.to_vec();
        self.constraints.init(&mut work);
        let input_valid = self.constraints.check_for_all(&work);
        let mut failures = 0usize;
        let mut drained = 0usize;

        while work.len() > 1 && !cancel.is_cancelled() {
            work.sort_by(|a, b| a.min_free_ratio().total_cmp(&b.min_free_ratio()));
            let Some(last) = work.iter().rposition(|n| !n.pods.is_empty()) else {
                break;
            };
            work.truncate(last + 1);
            if last == 0 {
                break;
            }

            let lo = last.saturating_sub(self.settings.max_nodes_per_cycle);
            let (front, back) = work.split_at_mut(last);
            let source = &mut back[0];
            let Some(p) = random_pod_index(&mut self.rng, source) else {
                break;
            };
            let pod = source.pods[p].clone();

            // A partly drained source must stay valid, e.g. a usage floor or
            // an affinity partner left behind.  An emptied one is dropped.
            let mut remainder = source.clone();
            self.constraints.evict(&mut remainder, &pod.name);
            let source_ok = remainder.pods.is_empty() || self.constraints.check(&remainder);
            if !source_ok {
                debug!(pod = %pod.name, node = %source.name, "Source invalid without pod");
            }

            if source_ok && self.repack(&mut front[lo..], &pod) {
                *source = remainder;
                drained += 1;
                failures = 0;
            } else {
                failures += 1;
                debug!(pod = %pod.name, node = %source.name, failures, "Drain attempt failed");
                if failures >= self.settings.max_fail_attempts {
                    break;
                }
            }
        }

        // The last drain may have emptied its source.  An idle cluster is
        // returned whole.
        if work.iter().any(|n| !n.pods.is_empty()) {
            work.retain(|n| !n.pods.is_empty());
        }
        work.sort_by_key(|n| order.get(n.name.as_str()).copied().unwrap_or(usize::MAX));

        if input_valid && !self.constraints.check_for_all(&work) {
            warn!(drained, "Consolidation broke a constraint, keeping input placement");
            return nodes.to_vec();
        }

        info!(
            before = nodes.len(),
            after = work.len(),
            drained,
            "Optimizer finished"
        );
        work
    }

    /// Re-assigns `pod` plus every pod in `window` across `window`.
    fn repack(&mut self, window: &mut [NodeInfo], pod: &PodInfo) -> bool {
        let mut pods = vec![pod.clone()];
        pods.extend(window.iter().flat_map(|n| n.pods.iter().cloned()));

        let program = consolidation_program(window, &pods);
        let outcome = self.solver.solve(&program, self.settings.time_limit);
        let solution = match outcome {
            SolveOutcome::Optimal(s) | SolveOutcome::Feasible(s) => s,
            other => {
                debug!(outcome = ?other, pods = pods.len(), "No assignment found");
                return false;
            }
        };
        if solution.objective + 0.5 < pods.len() as f64 {
            debug!(
                placed = solution.objective,
                pods = pods.len(),
                "Window cannot absorb every pod"
            );
            return false;
        }

        let width = window.len();
        let mut trial = window.to_vec();
        for node in &mut trial {
            node.clear_pods();
        }
        for (col, _) in solution.values.iter().enumerate().filter(|(_, set)| **set) {
            trial[col % width].add_pod(pods[col / width].clone());
        }
        self.constraints.init(&mut trial);
        if !self.constraints.check_for_all(&trial) {
            debug!(pod = %pod.name, "Repacked window violates constraints");
            return false;
        }

        window.clone_from_slice(&trial);
        true
    }
}

/// Column `p * nodes + n` is "pod `p` on node `n`".  Maximise placed pods,
/// each pod at most once, within each node's available CPU and memory.
fn consolidation_program(nodes: &[NodeInfo], pods: &[PodInfo]) -> BinaryProgram {
    let width = nodes.len();
    let mut program = BinaryProgram::new(pods.len() * width);
    program.objective = vec![1.0; program.columns];
    program.cutoff = Some(pods.len() as f64);

    for p in 0..pods.len() {
        program.add_row(0.0, 1.0, (0..width).map(|n| (p * width + n, 1.0)).collect());
    }
    for (n, node) in nodes.iter().enumerate() {
        program.add_row(
            0.0,
            node.available_cpu as f64,
            pods.iter()
                .enumerate()
                .map(|(p, pod)| (p * width + n, pod.cpu as f64))
                .collect(),
        );
        program.add_row(
            0.0,
            node.available_memory as f64,
            pods.iter()
                .enumerate()
                .map(|(p, pod)| (p * width + n, pod.memory as f64))
                .collect(),
        );
    }
    program
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceRangeArgs;
    use crate::constraints::{Constraint, ResourceRange};
    use crate::model::{AffinityKind, HostPort, PodAffinityTerm};
    use rand::SeedableRng;

    fn optimizer() -> Optimizer {
        Optimizer::new(
            OptimizerSettings::default(),
            ConstraintSet::default(),
            StdRng::seed_from_u64(9),
        )
    }

    fn node_with(name: &str, pods: &[(&str, i64)]) -> NodeInfo {
        let mut n = NodeInfo::new(name, 1000, 1000);
        for (pod, size) in pods {
            n.add_pod(PodInfo::new(*pod, *size, *size));
        }
        n
    }

    fn names(nodes: &[NodeInfo]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    fn pod_total(nodes: &[NodeInfo]) -> usize {
        nodes.iter().map(|n| n.pods.len()).sum()
    }

    #[test]
    fn drains_lightly_loaded_node() {
        let input = vec![
            node_with("a", &[("a1", 300)]),
            node_with("b", &[("b1", 200)]),
            node_with("c", &[("c1", 400)]),
        ];
        let out = optimizer().optimize(&input, &CancelSignal::never());
        assert_eq!(out.len(), 1);
        assert_eq!(pod_total(&out), 3);
    }

    #[test]
    fn output_is_ordered_subset_of_input() {
        let input = vec![
            node_with("z", &[("z1", 700)]),
            node_with("m", &[("m1", 100)]),
            node_with("a", &[("a1", 800)]),
            node_with("k", &[("k1", 600)]),
        ];
        let out = optimizer().optimize(&input, &CancelSignal::never());
        let input_names = names(&input);
        let mut cursor = 0;
        for name in names(&out) {
            let pos = input_names[cursor..]
                .iter()
                .position(|n| *n == name)
                .expect("output node must come from input, in order");
            cursor += pos + 1;
        }
        assert_eq!(pod_total(&out), 4);
        assert!(out.len() < input.len());
    }

    #[test]
    fn empty_nodes_are_dropped() {
        let input = vec![
            node_with("a", &[("a1", 900)]),
            NodeInfo::new("idle", 1000, 1000),
            node_with("b", &[("b1", 900)]),
        ];
        let out = optimizer().optimize(&input, &CancelSignal::never());
        assert_eq!(names(&out), ["a", "b"]);
    }

    #[test]
    fn full_nodes_are_left_alone() {
        let input = vec![node_with("a", &[("a1", 900)]), node_with("b", &[("b1", 900)])];
        let out = optimizer().optimize(&input, &CancelSignal::never());
        assert_eq!(out, input);
    }

    #[test]
    fn idle_cluster_is_returned_whole() {
        let input = vec![NodeInfo::new("a", 10, 10), NodeInfo::new("b", 10, 10)];
        assert_eq!(optimizer().optimize(&input, &CancelSignal::never()), input);
    }

    #[test]
    fn single_node_is_returned_as_is() {
        let input = vec![node_with("solo", &[("p", 10)])];
        assert_eq!(optimizer().optimize(&input, &CancelSignal::never()), input);
    }

    #[test]
    fn constraint_violations_block_repack() {
        let port = HostPort {
            ip: String::new(),
            port: 8080,
        };
        let mut a = node_with("a", &[]);
        let mut pa = PodInfo::new("pa", 100, 100);
        pa.host_ports.push(port.clone());
        a.add_pod(pa);
        let mut b = node_with("b", &[]);
        let mut pb = PodInfo::new("pb", 100, 100);
        pb.host_ports.push(port);
        b.add_pod(pb);

        let input = vec![a, b];
        let out = optimizer().optimize(&input, &CancelSignal::never());
        assert_eq!(out.len(), 2, "pods sharing a host port cannot be co-located");
    }

    #[test]
    fn cancelled_optimizer_keeps_input() {
        let (handle, signal) = crate::cancel::channel();
        handle.cancel();
        let input = vec![node_with("a", &[("a1", 100)]), node_with("b", &[("b1", 100)])];
        assert_eq!(optimizer().optimize(&input, &signal), input);
    }

    fn with_usage_floor(min_cpu: i64) -> Optimizer {
        let band = ResourceRangeArgs {
            min_cpu,
            max_cpu: 100,
            min_memory: 0,
            max_memory: 100,
        };
        let constraints = ConstraintSet::default()
            .with(Constraint::ResourceRange(ResourceRange::new(band).unwrap()));
        Optimizer::new(OptimizerSettings::default(), constraints, StdRng::seed_from_u64(9))
    }

    #[test]
    fn drain_stops_before_source_drops_below_usage_floor() {
        let input = vec![
            node_with("w", &[("big", 600)]),
            node_with("s", &[("s1", 150), ("s2", 150), ("s3", 150)]),
        ];
        let mut opt = with_usage_floor(20);
        let out = opt.optimize(&input, &CancelSignal::never());

        assert!(opt.constraints.check_for_all(&out), "{out:?}");
        assert_eq!(names(&out), ["w", "s"]);
        assert_eq!(pod_total(&out), 4);
    }

    #[test]
    fn usage_floor_still_allows_emptying_the_source() {
        let input = vec![node_with("w", &[("big", 600)]), node_with("s", &[("s1", 150)])];
        let mut opt = with_usage_floor(20);
        let out = opt.optimize(&input, &CancelSignal::never());

        assert_eq!(names(&out), ["w"]);
        assert!(out[0].has_pod("s1"));
    }

    #[test]
    fn affinity_partner_is_never_drained_away() {
        let mut cache = PodInfo::new("x", 100, 100);
        cache.labels.insert("app".into(), "cache".into());
        let mut follower = PodInfo::new("y", 350, 350);
        follower.affinity.push(PodAffinityTerm {
            kind: AffinityKind::Affinity,
            match_labels: [("app".to_string(), "cache".to_string())].into(),
        });
        let mut s = NodeInfo::new("s", 1000, 1000);
        s.add_pod(cache);
        s.add_pod(follower);
        let input = vec![node_with("w", &[("big", 600)]), s];
        assert!(ConstraintSet::default().check_for_all(&input));

        for seed in 0..20 {
            let mut opt = Optimizer::new(
                OptimizerSettings::default(),
                ConstraintSet::default(),
                StdRng::seed_from_u64(seed),
            );
            let out = opt.optimize(&input, &CancelSignal::never());
            assert!(ConstraintSet::default().check_for_all(&out), "seed {seed}: {out:?}");
            assert_eq!(out, input, "seed {seed}");
        }
    }

    /// Never finds anything; exercises the failure counter.
    struct Stubborn(usize);

    impl IlpSolver for Stubborn {
        fn solve(&mut self, _: &BinaryProgram, _: Duration) -> SolveOutcome {
            self.0 += 1;
            SolveOutcome::TimeLimit
        }
    }

    #[test]
    fn gives_up_after_max_failures() {
        let input = vec![node_with("a", &[("a1", 100)]), node_with("b", &[("b1", 100)])];
        let mut opt = optimizer().with_solver(Stubborn(0));
        let out = opt.optimize(&input, &CancelSignal::never());
        assert_eq!(out, input);
    }

    #[test]
    fn program_has_one_column_per_pod_node_pair() {
        let nodes = [NodeInfo::new("a", 10, 10), NodeInfo::new("b", 10, 10)];
        let pods = [PodInfo::new("x", 1, 1), PodInfo::new("y", 2, 2), PodInfo::new("z", 3, 3)];
        let program = consolidation_program(&nodes, &pods);
        assert_eq!(program.columns, 6);
        assert_eq!(program.rows.len(), 3 + 2 * 2);
        assert_eq!(program.cutoff, Some(3.0));
    }
}
