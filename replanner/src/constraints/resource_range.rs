/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Utilisation band constraint.
//!
//! With capacity `max` and a band `[lo%, hi%]` the node's total usage must
//! satisfy `max * lo / 100 <= used <= max * hi / 100`, evaluated in integer
//! arithmetic for CPU and memory independently.

use crate::config::ResourceRangeArgs;
use crate::model::NodeInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRange {
    args: ResourceRangeArgs,
}

impl ResourceRange {
    /// `None` if either minimum exceeds its maximum.
    pub fn new(args: ResourceRangeArgs) -> Option<Self> {
        if args.min_cpu <= args.max_cpu && args.min_memory <= args.max_memory {
            Some(Self { args })
        } else {
            None
        }
    }

    pub fn check(&self, node: &NodeInfo) -> bool {
        within(node.used_cpu(), node.max_cpu, self.args.min_cpu, self.args.max_cpu)
            && within(
                node.used_memory(),
                node.max_memory,
                self.args.min_memory,
                self.args.max_memory,
            )
    }
}

fn within(used: i64, capacity: i64, lo_pct: i64, hi_pct: i64) -> bool {
    let lo = capacity.saturating_mul(lo_pct) / 100;
    let hi = capacity.saturating_mul(hi_pct) / 100;
    (lo..=hi).contains(&used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PodInfo;

    fn range(min_cpu: i64, max_cpu: i64, min_memory: i64, max_memory: i64) -> ResourceRangeArgs {
        ResourceRangeArgs {
            min_cpu,
            max_cpu,
            min_memory,
            max_memory,
        }
    }

    fn node_with(pod: PodInfo) -> NodeInfo {
        let mut node = NodeInfo::new("n", 500, 200).with_available(100, 100);
        node.add_pod(pod);
        node
    }

    #[test]
    fn pod_inside_band_passes() {
        let rr = ResourceRange::new(range(50, 100, 50, 100)).unwrap();
        assert!(rr.check(&node_with(PodInfo::new("p", 50, 10))));
    }

    #[test]
    fn pod_above_band_fails() {
        let rr = ResourceRange::new(range(50, 100, 50, 100)).unwrap();
        assert!(!rr.check(&node_with(PodInfo::new("p", 50, 190))));
    }

    #[test]
    fn usage_below_minimum_fails() {
        let rr = ResourceRange::new(range(95, 100, 0, 100)).unwrap();
        // used cpu = 400 + 50 = 450 < 475
        assert!(!rr.check(&node_with(PodInfo::new("p", 50, 10))));
    }

    #[test]
    fn ten_to_ninety_band_separates_light_and_heavy_memory() {
        let rr = ResourceRange::new(range(10, 90, 10, 90)).unwrap();
        // cpu 450/500, memory 110/200
        assert!(rr.check(&node_with(PodInfo::new("light", 50, 10))));
        // memory 290/200
        assert!(!rr.check(&node_with(PodInfo::new("heavy", 50, 190))));
    }

    #[test]
    fn inverted_band_is_rejected() {
        assert!(ResourceRange::new(range(60, 40, 0, 100)).is_none());
        assert!(ResourceRange::new(range(0, 100, 60, 40)).is_none());
        assert!(ResourceRange::new(range(40, 40, 40, 40)).is_some());
    }
}
