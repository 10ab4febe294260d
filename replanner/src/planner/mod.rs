//! Planning cycles.
//!
//! [`generate_plan`] is one synchronous cycle:
//!
//! ```text
//! ClusterSnapshot ─► NodeInfo[] ─► policy(algorithm) ─► NodeInfo[]' ─► diff ─► Plan
//! ```
//!
//! [`spawn_planning_cycle`] runs the same cycle on a blocking worker and
//! reports its end on a phase-event channel, so a controller loop can keep
//! serving while the search runs.
//!
//! # Randomness
//! All random choices come from one seeded root generator.  Each component
//! gets its own generator forked from the root, so a fixed seed reproduces
//! the same plan.

pub mod error;

pub use error::{DiffViolation, PlannerError};

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::algorithm::{
    Algorithm, ImprovedAlgorithm, Optimizer, OptimizerSettings, RandomAlgorithm,
};
use crate::cancel::CancelSignal;
use crate::config::{AlgorithmArgs, AlgorithmKind, NodePolicyKind, PlannerSpec};
use crate::constraints::ConstraintSet;
use crate::model::{Movement, NodeInfo, NodeTemplate, Plan};
use crate::policy::{KeepPolicy, NodePolicy, OnlyGrowPolicy, ShrinkPolicy};
use crate::preferences::PreferenceSet;
use crate::snapshot::ClusterSnapshot;

// ── Outcome ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: Plan,
    /// Every node valid and every pod placed.
    pub feasible: bool,
    /// The cycle was cancelled; `plan` holds the best result found so far.
    pub cancelled: bool,
    pub score_before: f64,
    pub score_after: f64,
}

/// Signalled on the events channel when a cycle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    PlanningEnded,
    PhaseEndedWithError,
}

// ── Builders ──────────────────────────────────────────────────────────────────

pub fn build_algorithm(
    args: &AlgorithmArgs,
    constraints: ConstraintSet,
    preferences: PreferenceSet,
    rng: StdRng,
) -> Box<dyn Algorithm> {
    match args.kind {
        AlgorithmKind::Random => Box::new(
            RandomAlgorithm::new(constraints, preferences, args.attempts, rng)
                .with_steal_pod_chance(args.steal_pod_chance),
        ),
        AlgorithmKind::Improved => Box::new(ImprovedAlgorithm::new(
            constraints,
            preferences,
            args.attempts,
            args.evictions_per_round,
            rng,
        )),
    }
}

pub fn build_policy(
    args: &AlgorithmArgs,
    constraints: ConstraintSet,
    mut rng: StdRng,
) -> Box<dyn NodePolicy> {
    if args.use_optimizer && args.node_policy != NodePolicyKind::Shrink {
        warn!(policy = ?args.node_policy, "useOptimizer only applies to the shrink policy, ignoring");
    }

    match args.node_policy {
        NodePolicyKind::Keep => Box::new(KeepPolicy),
        NodePolicyKind::OnlyGrow => Box::new(OnlyGrowPolicy::new(args.max_nodes)),
        NodePolicyKind::Shrink => {
            let policy = ShrinkPolicy::new(args.max_nodes, fork(&mut rng));
            if !args.use_optimizer {
                return Box::new(policy);
            }
            let settings = OptimizerSettings {
                time_limit: args.optimizer_time_limit_per_cycle,
                max_nodes_per_cycle: args.optimizer_max_nodes_per_cycle,
                max_fail_attempts: args.optimizer_max_fail_attempts,
            };
            Box::new(policy.with_optimizer(Optimizer::new(settings, constraints, fork(&mut rng))))
        }
    }
}

fn fork(root: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(root.gen())
}

// ── Diff ──────────────────────────────────────────────────────────────────────

fn owners(nodes: &[NodeInfo]) -> Result<BTreeMap<&str, &str>, DiffViolation> {
    let mut map = BTreeMap::new();
    for node in nodes {
        for pod in &node.pods {
            if let Some(first) = map.insert(pod.name.as_str(), node.name.as_str()) {
                return Err(DiffViolation::DuplicatePod {
                    pod: pod.name.clone(),
                    first: first.to_string(),
                    second: node.name.clone(),
                });
            }
        }
    }
    Ok(map)
}

/// One movement per pod whose owning node changed, ordered by pod name.
pub fn calc_diff(before: &[NodeInfo], after: &[NodeInfo]) -> Result<Vec<Movement>, PlannerError> {
    let old = owners(before).map_err(PlannerError::Diff)?;
    let new = owners(after).map_err(PlannerError::Diff)?;

    if let Some((pod, node)) = new.iter().find(|(pod, _)| !old.contains_key(*pod)) {
        return Err(PlannerError::Diff(DiffViolation::UnknownPod {
            pod: pod.to_string(),
            node: node.to_string(),
        }));
    }

    let mut movements = Vec::new();
    for (pod, old_node) in &old {
        let Some(new_node) = new.get(pod) else {
            return Err(PlannerError::Diff(DiffViolation::LostPod {
                pod: pod.to_string(),
                node: old_node.to_string(),
            }));
        };
        if new_node != old_node {
            movements.push(Movement {
                pod: pod.to_string(),
                old_node: old_node.to_string(),
                new_node: new_node.to_string(),
            });
        }
    }
    Ok(movements)
}

// ── Planning cycle ────────────────────────────────────────────────────────────

/// Runs one planning cycle over a snapshot.
///
/// # Errors
/// Fails only for an invalid snapshot or a broken assignment.  Infeasible
/// and cancelled cycles still return a plan.
pub fn generate_plan(
    snapshot: &ClusterSnapshot,
    spec: &PlannerSpec,
    cancel: &CancelSignal,
) -> Result<PlanOutcome, PlannerError> {
    let nodes = snapshot.to_node_infos()?;
    plan_for_nodes(&nodes, spec, cancel)
}

/// Same as [`generate_plan`] for already-converted nodes.
pub fn plan_for_nodes(
    nodes: &[NodeInfo],
    spec: &PlannerSpec,
    cancel: &CancelSignal,
) -> Result<PlanOutcome, PlannerError> {
    let constraints = ConstraintSet::from_args(&spec.constraints);
    let preferences = PreferenceSet::from_args(&spec.preferences);

    let mut root = match spec.algorithm.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut algorithm = build_algorithm(
        &spec.algorithm,
        constraints.clone(),
        preferences.clone(),
        fork(&mut root),
    );
    let mut policy = build_policy(&spec.algorithm, constraints, fork(&mut root));

    info!(
        algorithm = algorithm.name(),
        policy = policy.name(),
        nodes = nodes.len(),
        pods = nodes.iter().map(|n| n.pods.len()).sum::<usize>(),
        "Planning cycle started"
    );

    let score_before = preferences.apply(nodes);
    let outcome = policy.run(algorithm.as_mut(), nodes, cancel);
    let score_after = preferences.apply(&outcome.nodes);
    let cancelled = cancel.is_cancelled();

    let movements = calc_diff(nodes, &outcome.nodes)?;
    for m in &movements {
        debug!(pod = %m.pod, from = %m.old_node, to = %m.new_node, "→ move");
    }

    let plan = Plan {
        movements,
        nodes_to_create: outcome.to_create.iter().map(NodeTemplate::from).collect(),
        nodes_to_delete: outcome.to_delete.iter().map(|n| n.name.clone()).collect(),
    };

    if outcome.feasible {
        info!(
            movements = plan.movements.len(),
            create = plan.nodes_to_create.len(),
            delete = plan.nodes_to_delete.len(),
            score_before,
            score_after,
            cancelled,
            "✓ plan ready"
        );
    } else {
        warn!(
            movements = plan.movements.len(),
            create = plan.nodes_to_create.len(),
            cancelled,
            "Plan is infeasible: some nodes stay invalid or pods unplaced"
        );
    }

    Ok(PlanOutcome {
        plan,
        feasible: outcome.feasible,
        cancelled,
        score_before,
        score_after,
    })
}

/// Runs [`generate_plan`] on a blocking worker and signals its end on
/// `events`.
pub fn spawn_planning_cycle(
    snapshot: ClusterSnapshot,
    spec: PlannerSpec,
    cancel: CancelSignal,
    events: mpsc::Sender<PhaseEvent>,
) -> JoinHandle<Result<PlanOutcome, PlannerError>> {
    tokio::spawn(async move {
        let result =
            match tokio::task::spawn_blocking(move || generate_plan(&snapshot, &spec, &cancel)).await
            {
                Ok(result) => result,
                Err(e) => Err(PlannerError::WorkerFailed(e.to_string())),
            };

        let event = match &result {
            Ok(_) => PhaseEvent::PlanningEnded,
            Err(e) => {
                warn!("Planning cycle failed: {}", e);
                PhaseEvent::PhaseEndedWithError
            }
        };
        if events.send(event).await.is_err() {
            debug!("Phase event receiver dropped");
        }
        result
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
