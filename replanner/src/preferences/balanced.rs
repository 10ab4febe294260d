/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-node CPU/memory balance.
//!
//! For a node with utilisations `a` (cpu) and `b` (memory) the imbalance is
//! the variance of `{a, b}` divided by its maximum `0.25`, i.e. `(a - b)^2`.
//! The score is `100 * (1 - mean imbalance)`.

use super::MAX_SCORE;
use crate::model::NodeInfo;

/// Variance of two values in `[0, 1]` never exceeds this.
const MAX_PAIR_VARIANCE: f64 = 0.25;

pub(super) fn score(nodes: &[NodeInfo]) -> f64 {
    if nodes.is_empty() {
        return MAX_SCORE;
    }
    let total: f64 = nodes
        .iter()
        .map(|n| {
            let a = n.cpu_utilization().clamp(0.0, 1.0);
            let b = n.memory_utilization().clamp(0.0, 1.0);
            super::variance(&[a, b]) / MAX_PAIR_VARIANCE
        })
        .sum();
    MAX_SCORE * (1.0 - total / nodes.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PodInfo;

    fn loaded(cpu: i64, mem: i64) -> NodeInfo {
        let mut n = NodeInfo::new("n", 1000, 1000);
        n.add_pod(PodInfo::new("p", cpu, mem));
        n
    }

    #[test]
    fn matching_cpu_and_memory_is_perfect() {
        assert!((score(&[loaded(300, 300), loaded(800, 800)]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cpu_only_node_is_worst() {
        assert!(score(&[loaded(1000, 0)]).abs() < 1e-9);
    }

    #[test]
    fn imbalance_is_averaged_over_nodes() {
        let s = score(&[loaded(1000, 0), loaded(500, 500)]);
        assert!((s - 50.0).abs() < 1e-9, "{s}");
    }
}
