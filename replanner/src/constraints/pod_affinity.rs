/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Node-scoped pod (anti-)affinity.
//!
//! For every pod on the node and each of its terms:
//! * `Affinity` needs at least one *other* pod on the node matching the
//!   selector;
//! * `AntiAffinity` forbids any other pod on the node matching it.
//!
//! Stateless: the check walks the node's pods, which stays cheap because
//! terms are rare.

use crate::model::{AffinityKind, NodeInfo};

pub(super) fn check(node: &NodeInfo) -> bool {
    node.pods.iter().enumerate().all(|(i, pod)| {
        pod.affinity.iter().all(|term| {
            let mut others = node
                .pods
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| other);
            let hit = others.any(|other| term.selects(&other.labels));
            match term.kind {
                AffinityKind::Affinity => hit,
                AffinityKind::AntiAffinity => !hit,
            }
        })
    })
}
