/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! 0/1 integer programming for the consolidation optimizer.
//!
//! The optimizer only needs binary variables, a linear objective to maximise
//! and two-sided linear rows.  [`IlpSolver`] is the seam; [`BranchAndBound`]
//! is the built-in depth-first solver.
//!
//! # Bounding
//! Rows whose coefficients are all `1` with an upper bound of `1` are
//! *set-packing* rows: at most one of their columns can be set.  Each column
//! is assigned to the first such row it appears in, and the optimistic bound
//! for the undecided suffix counts only the best remaining coefficient per
//! group.  For the optimizer's "each pod at most once" rows this turns the
//! bound into "pods not yet considered", which prunes aggressively.

use std::time::{Duration, Instant};

use tracing::trace;

// ── Problem ───────────────────────────────────────────────────────────────────

/// `lower <= Σ coef * x[col] <= upper`
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub lower: f64,
    pub upper: f64,
    pub coefficients: Vec<(usize, f64)>,
}

/// Maximise `Σ objective[j] * x[j]` over `x ∈ {0,1}^columns` subject to `rows`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryProgram {
    pub columns: usize,
    pub objective: Vec<f64>,
    pub rows: Vec<Row>,
    /// Stop as soon as an assignment reaches this objective; it is treated
    /// as a proven upper bound.
    pub cutoff: Option<f64>,
}

impl BinaryProgram {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            objective: vec![0.0; columns],
            rows: Vec::new(),
            cutoff: None,
        }
    }

    pub fn add_row(&mut self, lower: f64, upper: f64, coefficients: Vec<(usize, f64)>) {
        self.rows.push(Row {
            lower,
            upper,
            coefficients,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub objective: f64,
    pub values: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal(Solution),
    /// The time limit hit after an assignment was found.
    Feasible(Solution),
    /// The time limit hit before any assignment was found.
    TimeLimit,
    Infeasible,
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Optimal(s) | SolveOutcome::Feasible(s) => Some(s),
            SolveOutcome::TimeLimit | SolveOutcome::Infeasible => None,
        }
    }
}

pub trait IlpSolver: Send {
    fn solve(&mut self, program: &BinaryProgram, time_limit: Duration) -> SolveOutcome;
}

// ── BranchAndBound ────────────────────────────────────────────────────────────

/// Nodes explored between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBound;

impl IlpSolver for BranchAndBound {
    fn solve(&mut self, program: &BinaryProgram, time_limit: Duration) -> SolveOutcome {
        let mut search = Search::new(program, Instant::now() + time_limit);
        if !search.root_feasible() {
            return SolveOutcome::Infeasible;
        }
        search.descend(0, 0.0);

        trace!(
            explored = search.explored,
            timed_out = search.timed_out,
            best = ?search.best.as_ref().map(|s| s.objective),
            "branch and bound finished"
        );

        match (search.best, search.timed_out) {
            (Some(s), false) => SolveOutcome::Optimal(s),
            (Some(s), true) if search.reached_cutoff => SolveOutcome::Optimal(s),
            (Some(s), true) => SolveOutcome::Feasible(s),
            (None, true) => SolveOutcome::TimeLimit,
            (None, false) => SolveOutcome::Infeasible,
        }
    }
}

struct Search<'p> {
    program: &'p BinaryProgram,
    deadline: Instant,
    /// Rows touched by each column.
    column_rows: Vec<Vec<(usize, f64)>>,
    /// Optimistic objective of columns `j..`.
    suffix_bound: Vec<f64>,
    activity: Vec<f64>,
    /// Sum of positive / negative coefficients of undecided columns per row.
    remaining_pos: Vec<f64>,
    remaining_neg: Vec<f64>,
    values: Vec<bool>,
    best: Option<Solution>,
    explored: u64,
    timed_out: bool,
    reached_cutoff: bool,
}

impl<'p> Search<'p> {
    fn new(program: &'p BinaryProgram, deadline: Instant) -> Self {
        let n = program.columns;
        let mut column_rows = vec![Vec::new(); n];
        let mut remaining_pos = vec![0.0; program.rows.len()];
        let mut remaining_neg = vec![0.0; program.rows.len()];
        for (r, row) in program.rows.iter().enumerate() {
            for &(col, coef) in &row.coefficients {
                if col < n {
                    column_rows[col].push((r, coef));
                    if coef > 0.0 {
                        remaining_pos[r] += coef;
                    } else {
                        remaining_neg[r] += coef;
                    }
                }
            }
        }

        Self {
            program,
            deadline,
            suffix_bound: suffix_bound(program),
            column_rows,
            activity: vec![0.0; program.rows.len()],
            remaining_pos,
            remaining_neg,
            values: vec![false; n],
            best: None,
            explored: 0,
            timed_out: false,
            reached_cutoff: false,
        }
    }

    fn root_feasible(&self) -> bool {
        self.program.rows.iter().enumerate().all(|(r, row)| {
            self.remaining_neg[r] <= row.upper + EPS && self.remaining_pos[r] >= row.lower - EPS
        })
    }

    fn should_stop(&mut self) -> bool {
        if self.timed_out || self.reached_cutoff {
            return true;
        }
        self.explored += 1;
        if self.explored % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
        }
        self.timed_out
    }

    fn descend(&mut self, col: usize, objective: f64) {
        if self.should_stop() {
            return;
        }

        if col == self.program.columns {
            let better = self
                .best
                .as_ref()
                .map_or(true, |b| objective > b.objective + EPS);
            if better {
                self.best = Some(Solution {
                    objective,
                    values: self.values.clone(),
                });
                if let Some(cutoff) = self.program.cutoff {
                    self.reached_cutoff = objective >= cutoff - EPS;
                }
            }
            return;
        }

        if let Some(best) = &self.best {
            if objective + self.suffix_bound[col] <= best.objective + EPS {
                return;
            }
        }

        let coef = self.program.objective[col];
        let order = if coef >= 0.0 { [true, false] } else { [false, true] };

        self.release(col);
        for value in order {
            if self.assign(col, value) {
                let gain = if value { coef } else { 0.0 };
                self.descend(col + 1, objective + gain);
            }
            self.unassign(col, value);
            if self.timed_out || self.reached_cutoff {
                break;
            }
        }
        self.restore(col);
    }

    /// Moves `col` out of the undecided pool.
    fn release(&mut self, col: usize) {
        for &(r, coef) in &self.column_rows[col] {
            if coef > 0.0 {
                self.remaining_pos[r] -= coef;
            } else {
                self.remaining_neg[r] -= coef;
            }
        }
    }

    fn restore(&mut self, col: usize) {
        for &(r, coef) in &self.column_rows[col] {
            if coef > 0.0 {
                self.remaining_pos[r] += coef;
            } else {
                self.remaining_neg[r] += coef;
            }
        }
    }

    /// Fixes `col` and reports whether every touched row can still be met.
    fn assign(&mut self, col: usize, value: bool) -> bool {
        self.values[col] = value;
        let mut feasible = true;
        for &(r, coef) in &self.column_rows[col] {
            if value {
                self.activity[r] += coef;
            }
            let row = &self.program.rows[r];
            let lowest = self.activity[r] + self.remaining_neg[r];
            let highest = self.activity[r] + self.remaining_pos[r];
            if lowest > row.upper + EPS || highest < row.lower - EPS {
                feasible = false;
            }
        }
        feasible
    }

    fn unassign(&mut self, col: usize, value: bool) {
        if value {
            for &(r, coef) in &self.column_rows[col] {
                self.activity[r] -= coef;
            }
        }
        self.values[col] = false;
    }
}

/// `bound[j]` = optimistic objective of columns `j..`, counting one column
/// per set-packing group.
fn suffix_bound(program: &BinaryProgram) -> Vec<f64> {
    let n = program.columns;
    let mut group = vec![None; n];
    for (r, row) in program.rows.iter().enumerate() {
        let packing = row.upper <= 1.0 + EPS
            && !row.coefficients.is_empty()
            && row.coefficients.iter().all(|&(_, c)| (c - 1.0).abs() < EPS);
        if packing {
            for &(col, _) in &row.coefficients {
                if col < n && group[col].is_none() {
                    group[col] = Some(r);
                }
            }
        }
    }

    let mut bound = vec![0.0; n + 1];
    let mut group_best = vec![0.0_f64; program.rows.len()];
    for j in (0..n).rev() {
        let gain = program.objective[j].max(0.0);
        let extra = match group[j] {
            Some(r) if gain > group_best[r] => {
                let extra = gain - group_best[r];
                group_best[r] = gain;
                extra
            }
            Some(_) => 0.0,
            None => gain,
        };
        bound[j] = bound[j + 1] + extra;
    }
    bound
}

// ── Tests ─────────────────────────────────────────────────────────────────────
