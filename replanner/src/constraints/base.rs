/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Capacity check: non-movable usage plus pod requests must fit.

use crate::model::NodeInfo;

pub(super) fn check(node: &NodeInfo) -> bool {
    node.used_cpu() <= node.max_cpu && node.used_memory() <= node.max_memory
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PodInfo;

    #[test]
    fn exact_fit_is_valid() {
        let mut node = NodeInfo::new("n", 500, 200).with_available(100, 100);
        node.add_pod(PodInfo::new("p", 100, 100));
        assert!(check(&node));
    }

    #[test]
    fn cpu_overflow_is_invalid() {
        let mut node = NodeInfo::new("n", 500, 200).with_available(100, 100);
        node.add_pod(PodInfo::new("p", 101, 1));
        assert!(!check(&node));
    }

    #[test]
    fn memory_overflow_is_invalid() {
        let mut node = NodeInfo::new("n", 500, 200).with_available(100, 100);
        node.add_pod(PodInfo::new("p", 1, 101));
        assert!(!check(&node));
    }
}
