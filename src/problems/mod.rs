//! Seeded problem generators.
//!
//! Every generator draws from a [`ChaCha8Rng`](rand_chacha::ChaCha8Rng)
//! seeded with [`ProblemConfig::seed`], so the same configuration always yields
//! the same graph and the same initial assignment.
//!
//! | Kind                    | Agents   | Values     | Binary cost              |
//! |-------------------------|----------|------------|--------------------------|
//! | `sparse_random_uniform` | agents   | `0..D`     | uniform `[0, max_cost]`  |
//! | `dense_random_uniform`  | agents   | `0..D`     | uniform `[0, max_cost]`  |
//! | `graph_coloring`        | agents   | colors     | must-differ              |
//! | `meeting_scheduling`    | meetings | time slots | must-differ              |

mod meeting;
mod random;

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub use meeting::{meeting_scheduling, MeetingScenario};
pub use random::{graph_coloring, random_uniform};

use crate::config::ProblemConfig;
use crate::error::{DcopError, Result};
use crate::graph::ConstraintGraph;

/// Problem family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Few random edges with uniform costs
    SparseRandomUniform,
    /// Many random edges with uniform costs
    DenseRandomUniform,
    /// Random edges, neighbors must pick different colors
    GraphColoring,
    /// Meetings sharing a participant must pick different slots
    #[default]
    MeetingScheduling,
}

impl ProblemKind {
    /// Edge probability used when the config leaves `density` unset.
    pub fn default_density(&self) -> f64 {
        match self {
            Self::SparseRandomUniform | Self::GraphColoring => 0.2,
            Self::DenseRandomUniform => 0.7,
            Self::MeetingScheduling => 0.0,
        }
    }

    /// Human-readable name, also used as the graph name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SparseRandomUniform => "Sparse Uniform",
            Self::DenseRandomUniform => "Dense Uniform",
            Self::GraphColoring => "Graph Coloring",
            Self::MeetingScheduling => "Meeting Scheduling",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProblemKind {
    type Err = DcopError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sparse_random_uniform" | "sparse" => Ok(Self::SparseRandomUniform),
            "dense_random_uniform" | "dense" => Ok(Self::DenseRandomUniform),
            "graph_coloring" | "coloring" => Ok(Self::GraphColoring),
            "meeting_scheduling" | "meetings" => Ok(Self::MeetingScheduling),
            _ => Err(DcopError::Config(format!("Unknown problem kind: {s}"))),
        }
    }
}

/// A generated instance
#[derive(Debug, Clone)]
pub struct Problem {
    /// The constraint graph with its initial assignment
    pub graph: ConstraintGraph,
    /// Participant placement, for meeting scheduling only
    pub scenario: Option<MeetingScenario>,
}

/// Generate the instance described by `config`.
pub fn generate(config: &ProblemConfig) -> Result<Problem> {
    match config.kind {
        ProblemKind::SparseRandomUniform => Ok(Problem {
            graph: random_uniform(config, false)?,
            scenario: None,
        }),
        ProblemKind::DenseRandomUniform => Ok(Problem {
            graph: random_uniform(config, true)?,
            scenario: None,
        }),
        ProblemKind::GraphColoring => Ok(Problem {
            graph: graph_coloring(config)?,
            scenario: None,
        }),
        ProblemKind::MeetingScheduling => {
            let (graph, scenario) = meeting_scheduling(config)?;
            Ok(Problem {
                graph,
                scenario: Some(scenario),
            })
        },
    }
}

fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

fn require_positive(value: usize, what: &str) -> Result<()> {
    if value == 0 {
        return Err(DcopError::Config(format!("{what} must be at least 1")));
    }
    Ok(())
}
