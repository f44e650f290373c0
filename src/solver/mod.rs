//! DCOP coordinator.
//!
//! [`Dcop`] owns the agents, the mailer, and the global clock, and drives the
//! round loop until one full round passes without a commit.
//!
//! ```rust,ignore
//! use dcop::{Dcop, SolverConfig};
//!
//! let mut dcop = Dcop::new(graph, SolverConfig::default())?;
//! let summary = dcop.execute()?;
//! println!("cost {} after {} rounds", summary.final_cost, summary.rounds);
//! ```

mod dcop;

use serde::{Deserialize, Serialize};

pub use dcop::Dcop;

use crate::graph::{AgentId, Cost};

/// Search algorithm driving the rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Maximum Gain Message
    #[default]
    Mgm,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Mgm => write!(f, "MGM"),
        }
    }
}

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Global clock value of the round
    pub round: u64,
    /// Agents that committed a new value, ascending
    pub commits: Vec<AgentId>,
    /// Global cost after the round's commits
    pub global_cost: Cost,
}

/// Outcome of one `execute()` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Rounds run, including the final quiet round
    pub rounds: u64,
    /// Commits across all rounds
    pub commits: usize,
    /// Global cost before the first round
    pub initial_cost: Cost,
    /// Global cost at the fixed point
    pub final_cost: Cost,
}
