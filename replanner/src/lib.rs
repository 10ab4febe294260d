/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Replanner – cluster workload rescheduler
//!
//! Reads a snapshot of nodes and their pods, searches for a better
//! placement under hard constraints and weighted preferences, and emits a
//! plan of pod movements plus nodes to create or delete.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── model           – NodeInfo / PodInfo working records, Plan output
//! ├── quantity        – resource quantity strings ("250m", "2Gi")
//! ├── cancel          – cooperative cancellation signal
//! ├── config/         – YAML planner configuration
//! ├── snapshot/       – cluster snapshot document → NodeInfo[]
//! ├── constraints/    – hard per-node rules (base, ports, taints, ...)
//! ├── preferences/    – weighted 0..100 cluster scores
//! ├── algorithm/      – random search, evict-and-reinsert, ILP optimizer
//! ├── policy/         – keep / shrink / only-grow node policies
//! ├── planner/        – one planning cycle and the assignment diff
//! └── metrics_queue   – bounded-age sample ring buffer
//! ```

pub mod algorithm;
pub mod cancel;
pub mod config;
pub mod constraints;
pub mod metrics_queue;
pub mod model;
pub mod planner;
pub mod policy;
pub mod preferences;
pub mod quantity;
pub mod snapshot;
