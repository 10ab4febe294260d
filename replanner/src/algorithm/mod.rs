/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Placement search strategies.
//!
//! | Strategy              | Approach                                              |
//! |-----------------------|-------------------------------------------------------|
//! | [`RandomAlgorithm`]   | stochastic single-pod moves, kept only if they score better |
//! | [`ImprovedAlgorithm`] | evict a random sample, reinsert greedily by max free space |
//! | [`Optimizer`]         | ILP consolidation that drains the emptiest nodes      |
//!
//! The first two implement [`Algorithm`] and are driven by a node policy.
//! The optimizer is a post-pass used by the shrink policy.

mod ilp;
mod improved;
mod optimizer;
mod random;

pub use ilp::{BinaryProgram, BranchAndBound, IlpSolver, Row, Solution, SolveOutcome};
pub use improved::ImprovedAlgorithm;
pub use optimizer::{Optimizer, OptimizerSettings};
pub use random::RandomAlgorithm;

use rand::rngs::StdRng;
use rand::Rng;

use crate::cancel::CancelSignal;
use crate::model::{NodeInfo, PodInfo};

/// A placement search.
///
/// `run` never mutates `nodes`; it returns a new assignment plus whether that
/// assignment is *feasible*: every node valid and every free pod placed.
/// With zero attempts the returned nodes equal the input.
pub trait Algorithm: Send {
    fn run(
        &mut self,
        nodes: &[NodeInfo],
        free_pods: Vec<PodInfo>,
        cancel: &CancelSignal,
    ) -> (Vec<NodeInfo>, bool);

    fn name(&self) -> &'static str;
}

/// Index of a uniformly random pod on `node`, if it has any.
fn random_pod_index(rng: &mut StdRng, node: &NodeInfo) -> Option<usize> {
    if node.pods.is_empty() {
        None
    } else {
        Some(rng.gen_range(0..node.pods.len()))
    }
}
