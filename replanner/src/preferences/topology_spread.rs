/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Even spread of pods across topology groups.
//!
//! For each topology key, nodes carrying that label are grouped by its value
//! and each group gets a density `pods / nodes`.  Densities are divided by
//! the densest group, so they fall in `[0, 1]`, and their variance is
//! compared against the ceiling `0.25`.  Nodes without the label are left
//! out of that key's groups.
//!
//! ```text
//! score = 100 * (1 - Σ_k  w_k * var_k / 0.25)      with Σ_k w_k = 1
//! ```

use std::collections::BTreeMap;

use super::MAX_SCORE;
use crate::model::NodeInfo;

const MAX_VARIANCE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct TopologyKey {
    pub label: String,
    pub weight: f64,
}

impl TopologyKey {
    pub fn new(label: impl Into<String>, weight: f64) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopologySpread {
    /// Weights normalised to sum to one.
    keys: Vec<TopologyKey>,
}

impl TopologySpread {
    /// Keys with a negative weight are dropped.  If the remaining weights sum
    /// to zero every key counts equally.
    pub fn new(keys: Vec<TopologyKey>) -> Self {
        let keys: Vec<_> = keys
            .into_iter()
            .filter(|k| k.weight.is_finite() && k.weight >= 0.0)
            .collect();
        let total: f64 = keys.iter().map(|k| k.weight).sum();
        let count = keys.len() as f64;
        let keys = keys
            .into_iter()
            .map(|k| {
                let weight = if total > 0.0 { k.weight / total } else { 1.0 / count };
                TopologyKey { weight, ..k }
            })
            .collect();
        Self { keys }
    }

    pub fn keys(&self) -> &[TopologyKey] {
        &self.keys
    }

    pub fn score(&self, nodes: &[NodeInfo]) -> f64 {
        let penalty: f64 = self
            .keys
            .iter()
            .map(|k| k.weight * key_variance(&k.label, nodes) / MAX_VARIANCE)
            .sum();
        MAX_SCORE * (1.0 - penalty)
    }
}

/// Variance of normalised group densities for one label.
fn key_variance(label: &str, nodes: &[NodeInfo]) -> f64 {
    // value → (nodes, pods)
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for node in nodes {
        if let Some(value) = node.labels.get(label) {
            let entry = groups.entry(value.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += node.pods.len();
        }
    }

    let densities: Vec<f64> = groups
        .values()
        .map(|&(size, pods)| pods as f64 / size as f64)
        .collect();
    let densest = densities.iter().copied().fold(0.0, f64::max);
    if densest == 0.0 {
        return 0.0;
    }
    let normalised: Vec<f64> = densities.iter().map(|d| d / densest).collect();
    super::variance(&normalised)
}
