/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Host-port exclusivity.  Port `0` means "no host binding" and is skipped.

use crate::model::{NodeInfo, PodInfo};

pub(super) fn init(node: &mut NodeInfo) {
    let pods = std::mem::take(&mut node.pods);
    for pod in &pods {
        on_add(node, pod);
    }
    node.pods = pods;
}

pub(super) fn on_add(node: &mut NodeInfo, pod: &PodInfo) {
    for hp in pod.host_ports.iter().filter(|hp| hp.port != 0) {
        node.ports.bind(hp);
    }
}

pub(super) fn on_remove(node: &mut NodeInfo, pod: &PodInfo) {
    for hp in pod.host_ports.iter().filter(|hp| hp.port != 0) {
        node.ports.release(hp);
    }
}

pub(super) fn check(node: &NodeInfo) -> bool {
    !node.ports.has_conflicts()
}
