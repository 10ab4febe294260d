/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Uniform utilisation.
//!
//! For each resource the variance of per-node utilisation is normalised by
//! the largest variance reachable with the same total load: as many nodes as
//! possible completely full, one node holding the remainder, the rest idle.
//! The score is `100 - mean(normalised cpu, normalised memory)`.

use super::MAX_SCORE;
use crate::model::NodeInfo;

pub(super) fn score(nodes: &[NodeInfo]) -> f64 {
    let cpu: Vec<f64> = nodes.iter().map(|n| n.cpu_utilization().clamp(0.0, 1.0)).collect();
    let mem: Vec<f64> = nodes
        .iter()
        .map(|n| n.memory_utilization().clamp(0.0, 1.0))
        .collect();
    MAX_SCORE - (normalised_variance(&cpu) + normalised_variance(&mem)) / 2.0
}

/// Variance as a percentage of the maximum variance for the same sum.
/// `0` when no spread is possible at all.
fn normalised_variance(values: &[f64]) -> f64 {
    let max = max_variance(values);
    if max <= f64::EPSILON {
        return 0.0;
    }
    (super::variance(values) * MAX_SCORE / max).min(MAX_SCORE)
}

fn max_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mut remaining: f64 = values.iter().sum();
    let mean = remaining / n;

    let mut acc = 0.0;
    for _ in values {
        let slot = remaining.min(1.0);
        acc += (slot - mean).powi(2);
        remaining -= slot;
    }
    acc / n
}
