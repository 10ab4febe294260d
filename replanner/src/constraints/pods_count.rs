/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use crate::model::NodeInfo;

/// Caps the number of pods per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodsCount {
    max_count: usize,
}

impl PodsCount {
    pub fn new(max_count: usize) -> Self {
        Self { max_count }
    }

    pub fn check(&self, node: &NodeInfo) -> bool {
        node.pods.len() <= self.max_count
    }
}
