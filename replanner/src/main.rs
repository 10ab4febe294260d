/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use replanner::cancel::{self, CancelHandle};
use replanner::config::PlannerSpec;
use replanner::metrics_queue::{MetricsQueue, Timestamped};
use replanner::planner::{spawn_planning_cycle, PhaseEvent, PlanOutcome};
use replanner::snapshot::ClusterSnapshot;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Replanner – computes a pod re-placement plan for a cluster snapshot.
///
/// Example:
///   replanner --snapshot demos/cluster.yaml --config demos/planner.yaml \
///             --seed 7 --deadline-ms 5000 --output plan.yaml
#[derive(Debug, Parser)]
#[command(
    name = "replanner",
    about = "Replanner – constraint/preference driven workload rescheduler",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML cluster snapshot.
    #[arg(short = 's', long = "snapshot")]
    snapshot: PathBuf,

    /// Path to the YAML planner configuration.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Seed for the random source (overrides the configuration).
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Cancel each cycle after this many milliseconds (0 = no deadline).
    #[arg(short = 'd', long = "deadline-ms", default_value_t = 0)]
    deadline_ms: u64,

    /// Where to write the plan YAML.  Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Number of planning cycles to run over the same snapshot.
    #[arg(long = "cycles", default_value_t = 1)]
    cycles: u32,

    /// Pause between cycles.
    #[arg(long = "interval-ms", default_value_t = 1000)]
    interval_ms: u64,
}

// ── Cycle metrics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CycleSample {
    at: Instant,
    elapsed: Duration,
    movements: usize,
    feasible: bool,
    score: f64,
}

impl Timestamped for CycleSample {
    fn timestamp(&self) -> Instant {
        self.at
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    // Logs go to stderr; stdout carries the plan.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        snapshot    = %cli.snapshot.display(),
        config      = ?cli.config,
        seed        = ?cli.seed,
        deadline_ms = cli.deadline_ms,
        cycles      = cli.cycles,
        "Replanner starting up..."
    );

    if let Err(e) = run(cli).await {
        error!("Planning failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Load inputs ───────────────────────────────────────────────────────────
    let snapshot = ClusterSnapshot::load_from_file(&cli.snapshot)?;
    let mut spec = match &cli.config {
        Some(path) => PlannerSpec::load_from_file(path)?,
        None => {
            warn!("No planner configuration provided, using default settings");
            PlannerSpec::default()
        }
    };
    if cli.seed.is_some() {
        spec.algorithm.seed = cli.seed;
    }

    // ── Planning cycles ───────────────────────────────────────────────────────
    let metrics = MetricsQueue::default();
    let mut last: Option<PlanOutcome> = None;

    for cycle in 0..cli.cycles.max(1) {
        if cycle > 0 {
            tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
        }

        let mut cycle_spec = spec.clone();
        cycle_spec.algorithm.seed = spec.algorithm.seed.map(|s| s.wrapping_add(u64::from(cycle)));

        let started = Instant::now();
        let outcome = run_cycle(snapshot.clone(), cycle_spec, cli.deadline_ms).await?;

        metrics.push(CycleSample {
            at: Instant::now(),
            elapsed: started.elapsed(),
            movements: outcome.plan.movements.len(),
            feasible: outcome.feasible,
            score: outcome.score_after,
        });
        metrics.shrink(Instant::now());
        last = Some(outcome);
    }

    log_summary(&metrics);

    // ── Emit plan ─────────────────────────────────────────────────────────────
    let Some(outcome) = last else {
        return Ok(());
    };
    let yaml = serde_yaml::to_string(&outcome.plan).context("Cannot serialise plan")?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, yaml)
                .with_context(|| format!("Cannot write plan file: {}", path.display()))?;
            info!(path = %path.display(), "Plan written");
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

async fn run_cycle(snapshot: ClusterSnapshot, spec: PlannerSpec, deadline_ms: u64) -> Result<PlanOutcome> {
    let (handle, signal) = cancel::channel();
    let watchdog = tokio::spawn(cancel_on_deadline_or_interrupt(handle, deadline_ms));

    let (events_tx, mut events_rx) = mpsc::channel(1);
    let worker = spawn_planning_cycle(snapshot, spec, signal, events_tx);

    match events_rx.recv().await {
        Some(PhaseEvent::PlanningEnded) => info!("Planning phase ended"),
        Some(PhaseEvent::PhaseEndedWithError) => warn!("Planning phase ended with error"),
        None => warn!("Planning worker exited without a phase event"),
    }

    let result = worker.await.context("Planning worker panicked")?;
    watchdog.abort();
    Ok(result?)
}

async fn cancel_on_deadline_or_interrupt(handle: CancelHandle, deadline_ms: u64) {
    let deadline = async {
        if deadline_ms == 0 {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(Duration::from_millis(deadline_ms)).await;
    };

    tokio::select! {
        _ = deadline => info!(deadline_ms, "Deadline reached, cancelling planning cycle"),
        _ = tokio::signal::ctrl_c() => warn!("Interrupted, cancelling planning cycle"),
    }
    handle.cancel();
}

fn log_summary(metrics: &MetricsQueue<CycleSample>) {
    let samples = metrics.lock();
    if samples.len() < 2 {
        return;
    }
    let feasible = samples.iter().filter(|s| s.feasible).count();
    let total: Duration = samples.iter().map(|s| s.elapsed).sum();
    let best = samples.iter().map(|s| s.score).fold(f64::MIN, f64::max);
    let movements: usize = samples.iter().map(|s| s.movements).sum();
    info!(
        cycles = samples.len(),
        feasible,
        movements,
        best_score = best,
        mean_ms = total.as_millis() as u64 / samples.len() as u64,
        "Cycle summary"
    );
}
