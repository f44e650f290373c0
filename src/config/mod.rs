//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the `dcop` binary)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DcopError, Result};
use crate::graph::Cost;
use crate::problems::ProblemKind;
use crate::solver::Algorithm;

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Solver configuration
    #[serde(default)]
    pub solver: SolverConfig,

    /// Problem generation configuration
    #[serde(default)]
    pub problem: ProblemConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| DcopError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| DcopError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DCOP_MAX_ROUNDS") {
            if let Ok(val) = val.parse() {
                config.solver.max_rounds = val;
            }
        }
        if let Ok(val) = std::env::var("DCOP_SEED") {
            if let Ok(val) = val.parse() {
                config.problem.seed = val;
            }
        }
        if let Ok(val) = std::env::var("DCOP_AGENTS") {
            if let Ok(val) = val.parse() {
                config.problem.agents = val;
            }
        }
        if let Ok(val) = std::env::var("DCOP_DOMAIN_SIZE") {
            if let Ok(val) = val.parse() {
                config.problem.domain_size = val;
            }
        }

        config
    }

    /// Merge with another config (other takes precedence where it differs
    /// from the defaults)
    pub fn merge(self, other: Self) -> Self {
        let solver_default = SolverConfig::default();
        let problem_default = ProblemConfig::default();

        Self {
            solver: SolverConfig {
                max_rounds: if other.solver.max_rounds != solver_default.max_rounds {
                    other.solver.max_rounds
                } else {
                    self.solver.max_rounds
                },
                ..other.solver
            },
            problem: ProblemConfig {
                seed: if other.problem.seed != problem_default.seed {
                    other.problem.seed
                } else {
                    self.problem.seed
                },
                agents: if other.problem.agents != problem_default.agents {
                    other.problem.agents
                } else {
                    self.problem.agents
                },
                domain_size: if other.problem.domain_size != problem_default.domain_size {
                    other.problem.domain_size
                } else {
                    self.problem.domain_size
                },
                kind: if other.problem.kind != problem_default.kind {
                    other.problem.kind
                } else {
                    self.problem.kind
                },
                ..other.problem
            },
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Search algorithm
    pub algorithm: Algorithm,

    /// Round bound; exceeding it is a non-convergence error
    pub max_rounds: u64,

    /// Keep a per-round record of commits and global cost
    pub record_history: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Mgm,
            max_rounds: 10_000,
            record_history: true,
        }
    }
}

/// Problem generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    /// Problem family
    pub kind: ProblemKind,

    /// Agents (for meeting scheduling: participants)
    pub agents: usize,

    /// Domain size D (for meeting scheduling: time slots)
    pub domain_size: usize,

    /// Edge probability for random graphs; unset uses the kind's default
    pub density: Option<f64>,

    /// RNG seed
    pub seed: u64,

    /// Upper bound for uniform binary costs
    pub max_cost: Cost,

    /// Upper bound for uniform unary costs
    pub max_unary_cost: Cost,

    /// Number of meetings
    pub meetings: usize,

    /// Meetings each participant attends
    pub meetings_per_agent: usize,

    /// Minimum participants per meeting
    pub min_participants: usize,

    /// Upper bound for a participant's slot preference cost
    pub max_preference_cost: Cost,

    /// Restarts allowed while placing minimum participants
    pub max_assignment_attempts: usize,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            kind: ProblemKind::MeetingScheduling,
            agents: 10,
            domain_size: 5,
            density: None,
            seed: 0,
            max_cost: 100,
            max_unary_cost: 10,
            meetings: 8,
            meetings_per_agent: 2,
            min_participants: 2,
            max_preference_cost: 10,
            max_assignment_attempts: 1_000,
        }
    }
}
