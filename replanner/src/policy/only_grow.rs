/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use super::{grow, NodePolicy, PolicyOutcome};
use crate::algorithm::Algorithm;
use crate::cancel::CancelSignal;
use crate::model::NodeInfo;

/// Adds nodes while the current ones cannot hold every pod.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlyGrowPolicy {
    /// `0` means unbounded.
    max_nodes: usize,
}

impl OnlyGrowPolicy {
    pub fn new(max_nodes: usize) -> Self {
        Self { max_nodes }
    }
}

impl NodePolicy for OnlyGrowPolicy {
    fn run(
        &mut self,
        algorithm: &mut dyn Algorithm,
        nodes: &[NodeInfo],
        cancel: &CancelSignal,
    ) -> PolicyOutcome {
        let (current, feasible) = algorithm.run(nodes, Vec::new(), cancel);
        if feasible {
            return PolicyOutcome {
                nodes: current,
                feasible,
                ..Default::default()
            };
        }
        grow(algorithm, current, self.max_nodes, cancel)
    }

    fn name(&self) -> &'static str {
        "only_grow"
    }
}
