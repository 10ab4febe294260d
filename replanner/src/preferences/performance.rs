/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Spread of utilisation across nodes against a fixed ceiling.
//!
//! Unlike `Uniform`, the variance is measured against the absolute maximum
//! `0.25` rather than the maximum for the current total load, so a lightly
//! loaded cluster is never penalised heavily.

use super::MAX_SCORE;
use crate::model::NodeInfo;

const MAX_VARIANCE: f64 = 0.25;

pub(super) fn score(nodes: &[NodeInfo]) -> f64 {
    let cpu: Vec<f64> = nodes.iter().map(|n| n.cpu_utilization().clamp(0.0, 1.0)).collect();
    let mem: Vec<f64> = nodes
        .iter()
        .map(|n| n.memory_utilization().clamp(0.0, 1.0))
        .collect();
    let spread = (super::variance(&cpu) + super::variance(&mem)) / 2.0 / MAX_VARIANCE;
    MAX_SCORE * (1.0 - spread)
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
    fn identical_nodes_score_full() {
        assert!((score(&[loaded(400, 200), loaded(400, 200)]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn full_versus_idle_scores_zero() {
        assert!(score(&[loaded(1000, 1000), loaded(0, 0)]).abs() < 1e-9);
    }

    #[test]
    fn light_imbalance_is_penalised_less_than_uniform_would() {
        // cpu 0.2 / 0.0 → variance 0.01 → spread 0.04 on cpu, 0 on memory
        let s = score(&[loaded(200, 0), loaded(0, 0)]);
        assert!((s - 98.0).abs() < 1e-9, "{s}");
    }
}
