//! Planner configuration loading.
//!
//! One YAML document selects the constraints, the preference weights and the
//! search strategy for a planning cycle.  Every section and key is optional:
//!
//! ```yaml
//! constraints:
//!   resourceRange: { minCpu: 20, maxCpu: 80, minMemory: 10, maxMemory: 90 }
//!   podsCount: { maxCount: 110 }
//! preferences:
//!   uniform: { weight: 1.0 }
//!   balanced: { weight: 0.5 }
//!   topologySpread:
//!     weight: 1.0
//!     keys:
//!       - { name: "topology.kubernetes.io/zone", weight: 1.0 }
//! algorithm:
//!   name: improved            # random | improved
//!   attempts: 1000
//!   nodePolicy: shrink        # keep | shrink | only_grow
//!   useOptimizer: true
//! ```
//!
//! Unknown algorithm or policy names fall back to the defaults with a
//! warning rather than failing the load.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

// ── Defaults ──────────────────────────────────────────────────────────────────

const DEFAULT_ATTEMPTS: usize = 1000;
const DEFAULT_STEAL_POD_CHANCE: u32 = 10;
const DEFAULT_EVICTIONS_PER_ROUND: usize = 100;
const DEFAULT_OPTIMIZER_TIME_LIMIT_MS: u64 = 1000;
const DEFAULT_OPTIMIZER_MAX_NODES_PER_CYCLE: usize = 5;
const DEFAULT_OPTIMIZER_MAX_FAIL_ATTEMPTS: usize = 3;

// ── Constraint arguments ──────────────────────────────────────────────────────

/// Optional constraints.  Base, ports, taint-toleration and pod-affinity
/// checks are always active and take no arguments.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintArgs {
    pub resource_range: Option<ResourceRangeArgs>,
    pub pods_count: Option<PodsCountArgs>,
}

/// Target utilisation band, in whole percent of node capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRangeArgs {
    pub min_cpu: i64,
    pub max_cpu: i64,
    pub min_memory: i64,
    pub max_memory: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodsCountArgs {
    pub max_count: usize,
}

// ── Preference arguments ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceArgs {
    pub uniform: Option<WeightArgs>,
    pub maximize_inequality: Option<WeightArgs>,
    pub balanced: Option<WeightArgs>,
    pub performance: Option<WeightArgs>,
    pub topology_spread: Option<TopologySpreadArgs>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeightArgs {
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopologySpreadArgs {
    pub weight: f64,
    #[serde(default)]
    pub keys: Vec<TopologyKeyArgs>,
}

/// A node label whose values partition nodes into topology groups.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopologyKeyArgs {
    pub name: String,
    #[serde(default = "default_key_weight")]
    pub weight: f64,
}

fn default_key_weight() -> f64 {
    1.0
}

// ── Algorithm arguments ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmKind {
    #[default]
    Random,
    Improved,
}

impl AlgorithmKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "random" => Some(AlgorithmKind::Random),
            "improved" => Some(AlgorithmKind::Improved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodePolicyKind {
    #[default]
    Keep,
    Shrink,
    OnlyGrow,
}

impl NodePolicyKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "keep" => Some(NodePolicyKind::Keep),
            "shrink" => Some(NodePolicyKind::Shrink),
            "only_grow" => Some(NodePolicyKind::OnlyGrow),
            _ => None,
        }
    }
}

/// Search strategy, node policy and their tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmArgs {
    pub kind: AlgorithmKind,
    /// Search iterations (random) or rounds (improved).  Zero disables the
    /// search entirely.
    pub attempts: usize,
    /// Percent chance that a random move takes its pod from the busiest node.
    pub steal_pod_chance: u32,
    /// Random eviction draws per improved round.
    pub evictions_per_round: usize,
    pub node_policy: NodePolicyKind,
    /// Upper bound on cluster size while growing.  `0` means unbounded.
    pub max_nodes: usize,
    pub use_optimizer: bool,
    pub optimizer_time_limit_per_cycle: Duration,
    pub optimizer_max_nodes_per_cycle: usize,
    pub optimizer_max_fail_attempts: usize,
    /// Fixed RNG seed for reproducible plans.
    pub seed: Option<u64>,
}

impl Default for AlgorithmArgs {
    fn default() -> Self {
        Self {
            kind: AlgorithmKind::default(),
            attempts: DEFAULT_ATTEMPTS,
            steal_pod_chance: DEFAULT_STEAL_POD_CHANCE,
            evictions_per_round: DEFAULT_EVICTIONS_PER_ROUND,
            node_policy: NodePolicyKind::default(),
            max_nodes: 0,
            use_optimizer: false,
            optimizer_time_limit_per_cycle: Duration::from_millis(DEFAULT_OPTIMIZER_TIME_LIMIT_MS),
            optimizer_max_nodes_per_cycle: DEFAULT_OPTIMIZER_MAX_NODES_PER_CYCLE,
            optimizer_max_fail_attempts: DEFAULT_OPTIMIZER_MAX_FAIL_ATTEMPTS,
            seed: None,
        }
    }
}

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlannerFile {
    #[serde(default)]
    constraints: ConstraintArgs,
    #[serde(default)]
    preferences: PreferenceArgs,
    #[serde(default)]
    algorithm: AlgorithmEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlgorithmEntry {
    name: Option<String>,
    attempts: Option<usize>,
    steal_pod_chance: Option<u32>,
    evictions_per_round: Option<usize>,
    node_policy: Option<String>,
    max_nodes: Option<usize>,
    use_optimizer: Option<bool>,
    optimizer_time_limit_per_cycle: Option<u64>,
    optimizer_max_nodes_per_cycle: Option<usize>,
    optimizer_max_fail_attempts: Option<usize>,
    seed: Option<u64>,
}

impl AlgorithmEntry {
    fn into_args(self) -> AlgorithmArgs {
        let defaults = AlgorithmArgs::default();

        let kind = match self.name.as_deref() {
            None => defaults.kind,
            Some(name) => AlgorithmKind::parse(name).unwrap_or_else(|| {
                warn!(algorithm = name, "Unknown algorithm, falling back to 'random'");
                defaults.kind
            }),
        };
        let node_policy = match self.node_policy.as_deref() {
            None => defaults.node_policy,
            Some(name) => NodePolicyKind::parse(name).unwrap_or_else(|| {
                warn!(policy = name, "Unknown node policy, falling back to 'keep'");
                defaults.node_policy
            }),
        };

        let steal_pod_chance = match self.steal_pod_chance {
            Some(chance) if chance > 100 => {
                warn!(chance, "stealPodChance above 100%, clamping");
                100
            }
            Some(chance) => chance,
            None => defaults.steal_pod_chance,
        };

        let optimizer_max_fail_attempts = match self.optimizer_max_fail_attempts {
            Some(0) => {
                warn!("optimizerMaxFailAttempts must be at least 1, using default");
                defaults.optimizer_max_fail_attempts
            }
            Some(n) => n,
            None => defaults.optimizer_max_fail_attempts,
        };

        AlgorithmArgs {
            kind,
            attempts: self.attempts.unwrap_or(defaults.attempts),
            steal_pod_chance,
            evictions_per_round: self
                .evictions_per_round
                .unwrap_or(defaults.evictions_per_round),
            node_policy,
            max_nodes: self.max_nodes.unwrap_or(defaults.max_nodes),
            use_optimizer: self.use_optimizer.unwrap_or(defaults.use_optimizer),
            optimizer_time_limit_per_cycle: self
                .optimizer_time_limit_per_cycle
                .map(Duration::from_millis)
                .unwrap_or(defaults.optimizer_time_limit_per_cycle),
            optimizer_max_nodes_per_cycle: self
                .optimizer_max_nodes_per_cycle
                .unwrap_or(defaults.optimizer_max_nodes_per_cycle),
            optimizer_max_fail_attempts,
            seed: self.seed,
        }
    }
}

// ── PlannerSpec ───────────────────────────────────────────────────────────────

/// Everything a planning cycle needs besides the cluster snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerSpec {
    pub constraints: ConstraintArgs,
    pub preferences: PreferenceArgs,
    pub algorithm: AlgorithmArgs,
}

impl PlannerSpec {
    /// Parses `path` into a [`PlannerSpec`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading planner configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let spec = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            algorithm = ?spec.algorithm.kind,
            policy = ?spec.algorithm.node_policy,
            attempts = spec.algorithm.attempts,
            optimizer = spec.algorithm.use_optimizer,
            "Loaded planner configuration"
        );
        Ok(spec)
    }

    /// Parses a YAML document.  An empty document yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: PlannerFile = if content.trim().is_empty() {
            PlannerFile::default()
        } else {
            serde_yaml::from_str(content)?
        };

        debug!(
            constraints = ?file.constraints,
            preferences = ?file.preferences,
            "Parsed planner sections"
        );

        Ok(Self {
            constraints: file.constraints,
            preferences: file.preferences,
            algorithm: file.algorithm.into_args(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
constraints:
  resourceRange: { minCpu: 20, maxCpu: 80, minMemory: 10, maxMemory: 90 }
  podsCount: { maxCount: 30 }
preferences:
  uniform: { weight: 2.0 }
  topologySpread:
    weight: 1.0
    keys:
      - name: zone
        weight: 3.0
      - name: rack
algorithm:
  name: improved
  attempts: 50
  stealPodChance: 25
  evictionsPerRound: 7
  nodePolicy: only_grow
  maxNodes: 12
  useOptimizer: true
  optimizerTimeLimitPerCycle: 250
  optimizerMaxNodesPerCycle: 3
  optimizerMaxFailAttempts: 2
  seed: 42
"#;
        let f = yaml_tempfile(yaml);
        let spec = PlannerSpec::load_from_file(f.path()).unwrap();

        assert_eq!(
            spec.constraints.resource_range,
            Some(ResourceRangeArgs {
                min_cpu: 20,
                max_cpu: 80,
                min_memory: 10,
                max_memory: 90
            })
        );
        assert_eq!(spec.constraints.pods_count, Some(PodsCountArgs { max_count: 30 }));
        assert_eq!(spec.preferences.uniform, Some(WeightArgs { weight: 2.0 }));
        assert!(spec.preferences.balanced.is_none());

        let spread = spec.preferences.topology_spread.unwrap();
        assert_eq!(spread.keys.len(), 2);
        assert_eq!(spread.keys[0].weight, 3.0);
        assert_eq!(spread.keys[1].weight, 1.0, "key weight defaults to 1");

        let algo = spec.algorithm;
        assert_eq!(algo.kind, AlgorithmKind::Improved);
        assert_eq!(algo.attempts, 50);
        assert_eq!(algo.steal_pod_chance, 25);
        assert_eq!(algo.evictions_per_round, 7);
        assert_eq!(algo.node_policy, NodePolicyKind::OnlyGrow);
        assert_eq!(algo.max_nodes, 12);
        assert!(algo.use_optimizer);
        assert_eq!(algo.optimizer_time_limit_per_cycle, Duration::from_millis(250));
        assert_eq!(algo.optimizer_max_nodes_per_cycle, 3);
        assert_eq!(algo.optimizer_max_fail_attempts, 2);
        assert_eq!(algo.seed, Some(42));
    }

    #[test]
    fn empty_document_yields_defaults() {
        let spec = PlannerSpec::from_yaml_str("").unwrap();
        assert_eq!(spec, PlannerSpec::default());
        assert_eq!(spec.algorithm.attempts, DEFAULT_ATTEMPTS);
        assert_eq!(spec.algorithm.node_policy, NodePolicyKind::Keep);
    }

    #[test]
    fn unknown_names_fall_back_to_defaults() {
        let yaml = "algorithm:\n  name: quantum\n  nodePolicy: explode\n";
        let spec = PlannerSpec::from_yaml_str(yaml).unwrap();
        assert_eq!(spec.algorithm.kind, AlgorithmKind::Random);
        assert_eq!(spec.algorithm.node_policy, NodePolicyKind::Keep);
    }

    #[test]
    fn steal_chance_is_clamped_to_percent() {
        let spec = PlannerSpec::from_yaml_str("algorithm:\n  stealPodChance: 400\n").unwrap();
        assert_eq!(spec.algorithm.steal_pod_chance, 100);
    }

    #[test]
    fn zero_fail_attempts_uses_default() {
        let spec =
            PlannerSpec::from_yaml_str("algorithm:\n  optimizerMaxFailAttempts: 0\n").unwrap();
        assert_eq!(
            spec.algorithm.optimizer_max_fail_attempts,
            DEFAULT_OPTIMIZER_MAX_FAIL_ATTEMPTS
        );
    }

    #[test]
    fn missing_file_returns_error() {
        let result = PlannerSpec::load_from_file(Path::new("/nonexistent/path/planner.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(PlannerSpec::load_from_file(f.path()).is_err());
    }

    #[test]
    fn wrong_value_type_returns_error() {
        let f = yaml_tempfile("algorithm:\n  attempts: lots\n");
        assert!(PlannerSpec::load_from_file(f.path()).is_err());
    }
}
