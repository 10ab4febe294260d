/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! cluster-gen – writes a synthetic cluster snapshot for the replanner.
//!
//! Every node gets the same capacity; every pod asks for a random multiple
//! of 100 in `[200, 500]` for both CPU (millicores) and memory (bytes).
//! Pods are then placed the way a simple scheduler would:
//!
//! | Strategy          | Picks the node with                  |
//! |-------------------|--------------------------------------|
//! | `min-free-space`  | the least room left (bin packing)    |
//! | `max-free-space`  | the most room left (spreading)       |
//!
//! Ties are broken at random.  A pod that fits nowhere is skipped.
//!
//! Usage:
//! ```text
//! cluster-gen --nodes 10 --pods 60 --strategy max-free-space --seed 0 > cluster.yaml
//! replanner --snapshot cluster.yaml --config planner.yaml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use replanner::quantity::Quantity;
use replanner::snapshot::{ClusterSnapshot, NodeSnapshot, PodSnapshot, ResourceList};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    MinFreeSpace,
    MaxFreeSpace,
}

#[derive(Debug, Parser)]
#[command(name = "cluster-gen", about = "Random cluster snapshot generator")]
struct Cli {
    /// Number of nodes.
    #[arg(short = 'n', long, default_value_t = 10)]
    nodes: usize,

    /// Number of pods.
    #[arg(short = 'm', long, default_value_t = 50)]
    pods: usize,

    /// Per-node CPU capacity in millicores.
    #[arg(long, default_value_t = 2000)]
    node_cpu: i64,

    /// Per-node memory capacity in bytes.
    #[arg(long, default_value_t = 2200)]
    node_memory: i64,

    /// How pods are initially placed.
    #[arg(short = 's', long, value_enum, default_value_t = Strategy::MaxFreeSpace)]
    strategy: Strategy,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write to this file instead of stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

// ── Generation ────────────────────────────────────────────────────────────────

/// Free room left on a node while pods are being placed.
#[derive(Debug, Clone, Copy)]
struct Room {
    cpu: i64,
    memory: i64,
}

impl Room {
    fn fits(&self, cpu: i64, memory: i64) -> bool {
        self.cpu >= cpu && self.memory >= memory
    }

    fn total(&self) -> i64 {
        self.cpu + self.memory
    }
}

fn random_request(rng: &mut StdRng) -> i64 {
    rng.gen_range(2..6) * 100
}

/// Index of the node `strategy` prefers for a `(cpu, memory)` pod.
fn choose_node(rooms: &[Room], cpu: i64, memory: i64, strategy: Strategy, rng: &mut StdRng) -> Option<usize> {
    let mut best: Option<i64> = None;
    let mut candidates = Vec::new();

    for (i, room) in rooms.iter().enumerate() {
        if !room.fits(cpu, memory) {
            continue;
        }
        let free = room.total();
        let better = match (best, strategy) {
            (None, _) => true,
            (Some(b), Strategy::MinFreeSpace) => free < b,
            (Some(b), Strategy::MaxFreeSpace) => free > b,
        };
        if better {
            best = Some(free);
            candidates.clear();
            candidates.push(i);
        } else if best == Some(free) {
            candidates.push(i);
        }
    }

    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

fn generate(cli: &Cli) -> ClusterSnapshot {
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let mut nodes: Vec<NodeSnapshot> = (0..cli.nodes)
        .map(|i| NodeSnapshot {
            name: format!("node-{i}"),
            capacity: ResourceList {
                cpu: Quantity::from_milli(cli.node_cpu),
                memory: Quantity::from_units(cli.node_memory),
            },
            ..Default::default()
        })
        .collect();
    let mut rooms: Vec<Room> = nodes
        .iter()
        .map(|_| Room {
            cpu: cli.node_cpu,
            memory: cli.node_memory,
        })
        .collect();

    let mut skipped = 0usize;
    for p in 0..cli.pods {
        let cpu = random_request(&mut rng);
        let memory = random_request(&mut rng);

        let Some(idx) = choose_node(&rooms, cpu, memory, cli.strategy, &mut rng) else {
            warn!(pod = p, cpu, memory, "Pod fits on no node, skipping");
            skipped += 1;
            continue;
        };
        rooms[idx].cpu -= cpu;
        rooms[idx].memory -= memory;
        nodes[idx].pods.push(PodSnapshot {
            name: format!("pod-{p}"),
            requests: ResourceList {
                cpu: Quantity::from_milli(cpu),
                memory: Quantity::from_units(memory),
            },
            ..Default::default()
        });
    }

    info!(
        nodes = cli.nodes,
        pods = cli.pods - skipped,
        skipped,
        strategy = ?cli.strategy,
        "Cluster generated"
    );
    ClusterSnapshot { nodes }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean YAML document.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let snapshot = generate(&cli);
    let yaml = serde_yaml::to_string(&snapshot).context("Cannot serialise snapshot")?;

    match &cli.output {
        Some(path) => std::fs::write(path, yaml)
            .with_context(|| format!("Cannot write snapshot file: {}", path.display()))?,
        None => print!("{yaml}"),
    }
    Ok(())
}
