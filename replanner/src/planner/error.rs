/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for planning cycles.
//!
//! * [`DiffViolation`] – why a finished assignment could not be turned into
//!   a plan (carries the offending pod).
//! * [`PlannerError`] – top-level failure returned from
//!   [`generate_plan`](super::generate_plan).
//!
//! Running out of time, a cancelled cycle, or an infeasible assignment are
//! *not* errors; they are reported on [`PlanOutcome`](super::PlanOutcome).

use thiserror::Error;

use crate::snapshot::SnapshotError;

// ── Diff violations ───────────────────────────────────────────────────────────

/// A pod-conservation breach detected while diffing two assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffViolation {
    /// A pod present before the cycle is missing afterwards.
    LostPod { pod: String, node: String },

    /// A pod appears afterwards that did not exist before.
    UnknownPod { pod: String, node: String },

    /// A pod is assigned to two nodes at once.
    DuplicatePod {
        pod: String,
        first: String,
        second: String,
    },
}

impl std::fmt::Display for DiffViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffViolation::LostPod { pod, node } => {
                write!(f, "pod '{}' was on '{}' but is no longer assigned", pod, node)
            }

            DiffViolation::UnknownPod { pod, node } => write!(
                f,
                "pod '{}' appeared on '{}' without being in the snapshot",
                pod, node
            ),

            DiffViolation::DuplicatePod { pod, first, second } => write!(
                f,
                "pod '{}' is assigned to both '{}' and '{}'",
                pod, first, second
            ),
        }
    }
}

// ── Top-level planner errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlannerError {
    /// The snapshot could not be converted into working nodes.
    #[error("invalid cluster snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The policy produced an assignment that does not conserve pods.
    #[error("plan rejected: {0}")]
    Diff(DiffViolation),

    /// The blocking worker running the cycle panicked or was aborted.
    #[error("planning worker failed: {0}")]
    WorkerFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_pod_and_nodes() {
        let e = PlannerError::Diff(DiffViolation::DuplicatePod {
            pod: "web".into(),
            first: "a".into(),
            second: "b".into(),
        });
        assert_eq!(
            e.to_string(),
            "plan rejected: pod 'web' is assigned to both 'a' and 'b'"
        );
    }

    #[test]
    fn snapshot_errors_convert() {
        let e: PlannerError = SnapshotError::DuplicateNode("n".into()).into();
        assert_eq!(
            e.to_string(),
            "invalid cluster snapshot: node 'n' appears more than once"
        );
    }
}
