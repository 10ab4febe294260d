/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use super::{NodePolicy, PolicyOutcome};
use crate::algorithm::Algorithm;
use crate::cancel::CancelSignal;
use crate::model::NodeInfo;

/// Rebalances the existing nodes and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepPolicy;

impl NodePolicy for KeepPolicy {
    fn run(
        &mut self,
        algorithm: &mut dyn Algorithm,
        nodes: &[NodeInfo],
        cancel: &CancelSignal,
    ) -> PolicyOutcome {
        let (nodes, feasible) = algorithm.run(nodes, Vec::new(), cancel);
        PolicyOutcome {
            nodes,
            feasible,
            ..Default::default()
        }
    }

    fn name(&self) -> &'static str {
        "keep"
    }
}
