//! # DCOP - Distributed Constraint Optimization with MGM
//!
//! Simulates agents that cooperatively minimize a shared cost function over a
//! constraint graph using the Maximum Gain Message (MGM) protocol, then answers
//! contrastive "why not?" questions about the assignment they settle on.
//!
//! ## Features
//!
//! - **Constraint graphs**: 1-indexed agents, finite domains, unary costs, and
//!   one canonical cost table per edge shared by both endpoints
//! - **MGM rounds**: synchronous observe / compute / compare / decide with a
//!   strict-winner rule, so no two neighbors ever move in the same round
//! - **No-good explanations**: restrict domains by category, re-solve from the
//!   context, and report every changed constraint
//! - **Generators**: seeded random-uniform, graph-coloring, and
//!   meeting-scheduling instances
//!
//! ## Round Overview
//!
//! ```text
//!  Agent i                      Mailer                      Neighbor j
//!     |                            |                            |
//!     |---- ASSIGNMENT(value) ---->|---- ASSIGNMENT(value) ---->|
//!     |<--- ASSIGNMENT(value) -----|<--- ASSIGNMENT(value) -----|
//!     |                            |                            |
//!     |  compute lr                |                 compute lr |
//!     |                            |                            |
//!     |---- GAIN(lr) ------------->|---- GAIN(lr) ------------->|
//!     |<--- GAIN(lr) --------------|<--- GAIN(lr) --------------|
//!     |                            |                            |
//!     |  commit iff lr > 0 and lr strictly beats every neighbor |
//! ```
//!
//! The coordinator repeats rounds until one passes with no commit.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dcop::{ConstraintGraph, Dcop, SolverConfig, CONFLICT_PENALTY};
//!
//! let mut builder = ConstraintGraph::builder("triangle");
//! let a = builder.add_agent(2, vec![0, 1], 0);
//! let b = builder.add_agent(2, vec![0, 2], 0);
//! let c = builder.add_agent(2, vec![0, 3], 0);
//! builder.add_must_differ(a, b, CONFLICT_PENALTY)?;
//! builder.add_must_differ(b, c, CONFLICT_PENALTY)?;
//! builder.add_must_differ(c, a, CONFLICT_PENALTY)?;
//!
//! let mut dcop = Dcop::new(builder.build()?, SolverConfig::default())?;
//! let summary = dcop.execute()?;
//! println!("cost {} after {} rounds", summary.final_cost, summary.rounds);
//! ```
//!
//! ### Explaining an Assignment
//!
//! ```rust,ignore
//! use dcop::{ExplainMode, Explanation};
//!
//! // Keep A_1 where it is, force A_2 off its slot, leave the rest free.
//! let mut explanation = Explanation::from_sets(&mut dcop, [1], [2], [], [])?;
//! explanation.update_agents_before_generate_no_good()?;
//! explanation.generate_no_good()?;
//! println!("{}", explanation.explain(ExplainMode::Technical)?);
//! ```
//!
//! ## Modules
//!
//! - [`graph`]: Constraint graph, cost tables, and the global cost function
//! - [`protocol`]: MGM agent state machine, messages, and the mailer
//! - [`solver`]: Round-loop coordinator
//! - [`explain`]: Categories, no-good generation, and reports
//! - [`problems`]: Seeded instance generators
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod error;
pub mod explain;
pub mod graph;
pub mod problems;
pub mod protocol;
pub mod solver;

// Re-exports for convenience
pub use config::{Config, ProblemConfig, SolverConfig};
pub use error::{DcopError, Result};
pub use explain::{CategoryPartition, ExplainMode, Explanation, ExplanationReport};
pub use graph::{AgentId, Assignment, ConstraintGraph, Cost, Value, CONFLICT_PENALTY};
pub use problems::{generate, MeetingScenario, Problem, ProblemKind};
pub use protocol::{MgmAgent, Message, MessageType};
pub use solver::{Algorithm, Dcop, ExecutionSummary, RoundRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
