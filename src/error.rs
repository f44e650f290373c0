//! DCOP solver error types.
//!
//! # Error Classes
//!
//! - **Configuration**: the problem or the explanation query is malformed and
//!   construction fails fast (`Config`, `OverlappingCategories`).
//! - **Invariant**: the graph violates its own construction guarantees at
//!   runtime (`MissingCost`). Never retried.
//! - **Protocol**: an agent or the mailer was driven out of phase (`Protocol`).
//! - **Convergence**: the round loop exceeded its bound (`NonConvergence`).
//! - **Sequencing**: a caller invoked explanation steps out of order.

use thiserror::Error;

use crate::graph::{AgentId, Value};

/// DCOP solver errors.
#[derive(Error, Debug)]
pub enum DcopError {
    /// Invalid problem, graph, or configuration input.
    #[error("Config error: {0}")]
    Config(String),

    /// An agent was placed in more than one explanation category.
    #[error("Agent {agent} appears in both category {first} and category {second}")]
    OverlappingCategories {
        /// Offending agent.
        agent: AgentId,
        /// First category the agent was found in.
        first: u8,
        /// Second category the agent was found in.
        second: u8,
    },

    /// Referenced agent does not exist in the graph.
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// Binary cost requested for a pair that the table does not cover.
    #[error("No cost for (A_{low}={low_value}, A_{high}={high_value})")]
    MissingCost {
        /// Smaller agent id of the queried pair.
        low: AgentId,
        /// Value of the smaller id.
        low_value: Value,
        /// Larger agent id of the queried pair.
        high: AgentId,
        /// Value of the larger id.
        high_value: Value,
    },

    /// Agent or mailer was driven out of protocol order.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The round loop did not reach a fixed point within the bound.
    #[error("No fixed point after {rounds} rounds")]
    NonConvergence {
        /// Rounds executed before giving up.
        rounds: u64,
    },

    /// Explanation steps invoked out of order.
    #[error("Sequencing error: {0}")]
    Sequencing(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for DCOP operations
pub type Result<T> = std::result::Result<T, DcopError>;

impl From<toml::de::Error> for DcopError {
    fn from(err: toml::de::Error) -> Self {
        DcopError::Config(err.to_string())
    }
}
