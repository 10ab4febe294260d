/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end planning cycles over YAML documents.

use replanner::cancel::CancelSignal;
use replanner::config::PlannerSpec;
use replanner::planner::{generate_plan, spawn_planning_cycle, PhaseEvent};
use replanner::snapshot::ClusterSnapshot;
use tokio::sync::mpsc;

const CLUSTER: &str = r#"
nodes:
  - name: worker-a
    capacity: { cpu: "1", memory: "1000" }
    labels: { zone: east }
    pods:
      - name: web-0
        requests: { cpu: 700m, memory: "700" }
  - name: worker-idle
    capacity: { cpu: "1", memory: "1000" }
    labels: { zone: east }
  - name: worker-b
    capacity: { cpu: "1", memory: "1000" }
    labels: { zone: west }
    pods:
      - name: web-1
        requests: { cpu: 700m, memory: "700" }
"#;

const OVERLOADED: &str = r#"
nodes:
  - name: only
    capacity: { cpu: "1", memory: "1000" }
    pods:
      - name: db-0
        requests: { cpu: 600m, memory: "600" }
      - name: db-1
        requests: { cpu: 600m, memory: "600" }
"#;

fn snapshot(yaml: &str) -> ClusterSnapshot {
    serde_yaml::from_str(yaml).unwrap()
}

fn spec(policy: &str) -> PlannerSpec {
    let yaml = format!(
        "preferences:\n  uniform: {{ weight: 1.0 }}\n\
         algorithm:\n  attempts: 200\n  nodePolicy: {policy}\n  seed: 11\n"
    );
    PlannerSpec::from_yaml_str(&yaml).unwrap()
}

#[test]
fn shrink_deletes_only_the_idle_node() {
    let outcome = generate_plan(&snapshot(CLUSTER), &spec("shrink"), &CancelSignal::never()).unwrap();

    assert!(outcome.feasible);
    assert_eq!(outcome.plan.nodes_to_delete, ["worker-idle"]);
    assert!(outcome.plan.nodes_to_create.is_empty());
    assert!(outcome.plan.movements.is_empty());
}

#[test]
fn only_grow_plans_a_new_node_and_moves_a_pod_onto_it() {
    let outcome =
        generate_plan(&snapshot(OVERLOADED), &spec("only_grow"), &CancelSignal::never()).unwrap();

    assert!(outcome.feasible);
    assert!(outcome.plan.nodes_to_delete.is_empty());
    assert_eq!(outcome.plan.nodes_to_create.len(), 1);
    let planned = &outcome.plan.nodes_to_create[0];
    assert_eq!((planned.cpu, planned.memory), (1000, 1000));

    assert_eq!(outcome.plan.movements.len(), 1);
    let movement = &outcome.plan.movements[0];
    assert_eq!(movement.old_node, "only");
    assert_eq!(movement.new_node, planned.name);
}

#[test]
fn keep_never_changes_the_node_set() {
    let outcome =
        generate_plan(&snapshot(OVERLOADED), &spec("keep"), &CancelSignal::never()).unwrap();

    assert!(!outcome.feasible);
    assert!(outcome.plan.nodes_to_create.is_empty());
    assert!(outcome.plan.nodes_to_delete.is_empty());
}

#[test]
fn scores_stay_in_range() {
    let outcome = generate_plan(&snapshot(CLUSTER), &spec("keep"), &CancelSignal::never()).unwrap();
    for score in [outcome.score_before, outcome.score_after] {
        assert!((0.0..=100.0).contains(&score), "score {score} out of range");
    }
}

#[test]
fn plan_serialises_with_camel_case_keys() {
    let outcome = generate_plan(&snapshot(CLUSTER), &spec("shrink"), &CancelSignal::never()).unwrap();
    let yaml = serde_yaml::to_string(&outcome.plan).unwrap();
    assert!(yaml.contains("nodesToDelete"));
    assert!(yaml.contains("worker-idle"));
}

#[tokio::test]
async fn spawned_cycle_reports_phase_end() {
    let (tx, mut rx) = mpsc::channel(1);
    let handle = spawn_planning_cycle(snapshot(CLUSTER), spec("shrink"), CancelSignal::never(), tx);

    assert_eq!(rx.recv().await, Some(PhaseEvent::PlanningEnded));
    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome.plan.nodes_to_delete, ["worker-idle"]);
}
