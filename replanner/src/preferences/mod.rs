/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Soft objectives.
//!
//! Each preference maps a set of nodes to a score in `[0, 100]`, higher being
//! better.  A [`PreferenceSet`] combines the configured preferences as a
//! weighted mean, with weights normalised to sum to one.
//!
//! | Preference           | 100 means                                           |
//! |----------------------|-----------------------------------------------------|
//! | `Uniform`            | every node equally utilised                         |
//! | `MaximizeInequality` | load packed onto as few nodes as possible           |
//! | `Balanced`           | CPU and memory utilisation equal on each node       |
//! | `Performance`        | zero spread of utilisation across nodes             |
//! | `TopologySpread`     | pods spread evenly across every topology key's groups |
//!
//! Preferences read only the pod totals already kept on [`NodeInfo`], so they
//! need no per-pod bookkeeping of their own.

mod balanced;
mod performance;
mod topology_spread;
mod uniform;

pub use topology_spread::{TopologyKey, TopologySpread};

use tracing::{debug, warn};

use crate::config::PreferenceArgs;
use crate::model::{MovementInfo, NodeInfo};

// ── Constants ─────────────────────────────────────────────────────────────────

pub const MAX_SCORE: f64 = 100.0;

/// Below this total weight the set is treated as empty.
const MIN_TOTAL_WEIGHT: f64 = 0.1;

// ── Preference ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Preference {
    Uniform,
    MaximizeInequality,
    Balanced,
    Performance,
    TopologySpread(TopologySpread),
}

impl Preference {
    pub fn name(&self) -> &'static str {
        match self {
            Preference::Uniform => "uniform",
            Preference::MaximizeInequality => "maximizeInequality",
            Preference::Balanced => "balanced",
            Preference::Performance => "performance",
            Preference::TopologySpread(_) => "topologySpread",
        }
    }

    pub fn score(&self, nodes: &[NodeInfo]) -> f64 {
        let raw = match self {
            Preference::Uniform => uniform::score(nodes),
            Preference::MaximizeInequality => MAX_SCORE - uniform::score(nodes),
            Preference::Balanced => balanced::score(nodes),
            Preference::Performance => performance::score(nodes),
            Preference::TopologySpread(ts) => ts.score(nodes),
        };
        raw.clamp(0.0, MAX_SCORE)
    }
}

// ── PreferenceSet ─────────────────────────────────────────────────────────────

/// Weighted combination of preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceSet {
    /// `(preference, normalised weight)`; weights sum to one.
    items: Vec<(Preference, f64)>,
}

impl PreferenceSet {
    /// Builds the configured preferences.  Negative or non-finite weights are
    /// dropped with a warning.  If the remaining weights sum to less than
    /// `0.1` the set is empty and every score is `0`.
    pub fn from_args(args: &PreferenceArgs) -> Self {
        let mut raw: Vec<(Preference, f64)> = Vec::new();

        let singles = [
            (Preference::Uniform, args.uniform),
            (Preference::MaximizeInequality, args.maximize_inequality),
            (Preference::Balanced, args.balanced),
            (Preference::Performance, args.performance),
        ];
        for (pref, w) in singles {
            if let Some(w) = w {
                raw.push((pref, w.weight));
            }
        }
        if let Some(ts) = &args.topology_spread {
            let keys = ts
                .keys
                .iter()
                .map(|k| TopologyKey::new(k.name.clone(), k.weight))
                .collect();
            raw.push((Preference::TopologySpread(TopologySpread::new(keys)), ts.weight));
        }

        Self::weighted(raw)
    }

    /// Normalises arbitrary non-negative weights.
    pub fn weighted(raw: Vec<(Preference, f64)>) -> Self {
        let raw: Vec<_> = raw
            .into_iter()
            .filter(|(pref, w)| {
                let ok = w.is_finite() && *w >= 0.0;
                if !ok {
                    warn!(preference = pref.name(), weight = *w, "Ignoring preference with invalid weight");
                }
                ok
            })
            .collect();

        let total: f64 = raw.iter().map(|(_, w)| w).sum();
        if total < MIN_TOTAL_WEIGHT {
            if !raw.is_empty() {
                warn!(total, "Preference weights sum below {}, scoring disabled", MIN_TOTAL_WEIGHT);
            }
            return Self::default();
        }

        let items: Vec<_> = raw.into_iter().map(|(p, w)| (p, w / total)).collect();
        debug!(
            preferences = ?items.iter().map(|(p, w)| (p.name(), *w)).collect::<Vec<_>>(),
            "Preference set ready"
        );
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[(Preference, f64)] {
        &self.items
    }

    /// Weighted score of `nodes`, in `[0, 100]`.
    pub fn apply(&self, nodes: &[NodeInfo]) -> f64 {
        self.items
            .iter()
            .map(|(pref, w)| pref.score(nodes) * w)
            .sum::<f64>()
            .clamp(0.0, MAX_SCORE)
    }

    /// Scores the two-node neighbourhood `[old, new]` before and after the
    /// move.  Works on copies; `mv` is left untouched.
    pub fn apply_for_move(&self, mv: &MovementInfo) -> (f64, f64) {
        let before = [mv.old_node.clone(), mv.new_node.clone()];
        let old_score = self.apply(&before);

        let [mut old_node, mut new_node] = before;
        if let Some(pod) = old_node.remove_pod(&mv.pod.name) {
            new_node.add_pod(pod);
        }
        let new_score = self.apply(&[old_node, new_node]);

        (old_score, new_score)
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Population variance.  `0.0` for an empty slice.
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TopologyKeyArgs, TopologySpreadArgs, WeightArgs};
    use crate::model::PodInfo;

    fn node(name: &str, pods_cpu: i64, pods_mem: i64) -> NodeInfo {
        let mut n = NodeInfo::new(name, 1000, 1000);
        n.add_pod(PodInfo::new(format!("{name}-pod"), pods_cpu, pods_mem));
        n
    }

    #[test]
    fn weights_are_normalised() {
        let set = PreferenceSet::from_args(&PreferenceArgs {
            uniform: Some(WeightArgs { weight: 3.0 }),
            balanced: Some(WeightArgs { weight: 1.0 }),
            ..Default::default()
        });
        let weights: Vec<f64> = set.items().iter().map(|(_, w)| *w).collect();
        assert_eq!(weights, [0.75, 0.25]);
    }

    #[test]
    fn tiny_total_weight_disables_scoring() {
        let set = PreferenceSet::from_args(&PreferenceArgs {
            uniform: Some(WeightArgs { weight: 0.05 }),
            ..Default::default()
        });
        assert!(set.is_empty());
        assert_eq!(set.apply(&[node("a", 900, 100), node("b", 0, 0)]), 0.0);
    }

    #[test]
    fn negative_weight_is_dropped() {
        let set = PreferenceSet::from_args(&PreferenceArgs {
            uniform: Some(WeightArgs { weight: -1.0 }),
            balanced: Some(WeightArgs { weight: 1.0 }),
            ..Default::default()
        });
        assert_eq!(set.items().len(), 1);
        assert_eq!(set.items()[0].0, Preference::Balanced);
    }

    #[test]
    fn apply_stays_within_bounds() {
        let set = PreferenceSet::from_args(&PreferenceArgs {
            uniform: Some(WeightArgs { weight: 1.0 }),
            maximize_inequality: Some(WeightArgs { weight: 1.0 }),
            balanced: Some(WeightArgs { weight: 1.0 }),
            performance: Some(WeightArgs { weight: 1.0 }),
            topology_spread: Some(TopologySpreadArgs {
                weight: 1.0,
                keys: vec![TopologyKeyArgs {
                    name: "zone".into(),
                    weight: 1.0,
                }],
            }),
        });
        // Overcommitted node included on purpose.
        let nodes = [node("a", 1500, 10), node("b", 0, 0), node("c", 500, 999)];
        let score = set.apply(&nodes);
        assert!((0.0..=MAX_SCORE).contains(&score), "score {score}");
    }

    #[test]
    fn apply_for_move_prefers_spreading_under_uniform() {
        let set = PreferenceSet::weighted(vec![(Preference::Uniform, 1.0)]);
        let mut old_node = NodeInfo::new("old", 1000, 1000);
        old_node.add_pod(PodInfo::new("a", 250, 250));
        old_node.add_pod(PodInfo::new("b", 250, 250));
        let new_node = NodeInfo::new("new", 1000, 1000);
        let mv = MovementInfo {
            pod: PodInfo::new("b", 250, 250),
            old_node: old_node.clone(),
            new_node: new_node.clone(),
        };

        let (before, after) = set.apply_for_move(&mv);
        assert!(after > before, "{before} -> {after}");
        assert!((after - MAX_SCORE).abs() < 1e-9);
        assert_eq!(mv.old_node, old_node, "inputs must not change");
        assert_eq!(mv.new_node, new_node);
    }

    #[test]
    fn maximize_inequality_mirrors_uniform() {
        let nodes = [node("a", 700, 300), node("b", 100, 200)];
        let u = Preference::Uniform.score(&nodes);
        let m = Preference::MaximizeInequality.score(&nodes);
        assert!((u + m - MAX_SCORE).abs() < 1e-9);
    }

    #[test]
    fn variance_of_constant_values_is_zero() {
        assert_eq!(variance(&[0.3, 0.3, 0.3]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert!((variance(&[0.0, 1.0]) - 0.25).abs() < 1e-12);
    }
}
