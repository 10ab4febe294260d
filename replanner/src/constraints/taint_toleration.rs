/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Taint toleration: every pod must tolerate every hard taint on its node.

use crate::model::{NodeInfo, PodInfo};

pub(super) fn init(node: &mut NodeInfo) {
    node.untolerated = node
        .pods
        .iter()
        .filter(|p| !p.tolerates_all(&node.taints))
        .map(|p| p.name.clone())
        .collect();
}

pub(super) fn on_add(node: &mut NodeInfo, pod: &PodInfo) {
    if !pod.tolerates_all(&node.taints) {
        node.untolerated.push(pod.name.clone());
    }
}

pub(super) fn on_remove(node: &mut NodeInfo, pod: &PodInfo) {
    node.untolerated.retain(|name| name != &pod.name);
}

pub(super) fn check(node: &NodeInfo) -> bool {
    node.untolerated.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Taint, TaintEffect, Toleration, TolerationOperator};

    fn tainted_node() -> NodeInfo {
        let mut node = NodeInfo::new("n", 100, 100);
        node.taints.push(Taint {
            key: "gpu".into(),
            value: "true".into(),
            effect: TaintEffect::NoSchedule,
        });
        node
    }

    fn tolerant(name: &str) -> PodInfo {
        let mut pod = PodInfo::new(name, 1, 1);
        pod.tolerations.push(Toleration {
            key: "gpu".into(),
            operator: TolerationOperator::Exists,
            ..Default::default()
        });
        pod
    }

    #[test]
    fn tolerant_pod_is_accepted() {
        let mut node = tainted_node();
        let pod = tolerant("a");
        node.add_pod(pod.clone());
        on_add(&mut node, &pod);
        assert!(check(&node));
    }

    #[test]
    fn intolerant_pod_is_rejected_until_removed() {
        let mut node = tainted_node();
        let pod = PodInfo::new("plain", 1, 1);
        node.add_pod(pod.clone());
        on_add(&mut node, &pod);
        assert!(!check(&node));

        let pod = node.remove_pod("plain").unwrap();
        on_remove(&mut node, &pod);
        assert!(check(&node));
    }

    #[test]
    fn soft_taint_never_blocks() {
        let mut node = NodeInfo::new("n", 100, 100);
        node.taints.push(Taint {
            key: "spot".into(),
            value: String::new(),
            effect: TaintEffect::PreferNoSchedule,
        });
        node.add_pod(PodInfo::new("p", 1, 1));
        init(&mut node);
        assert!(check(&node));
    }
}
