//! Constraint graph data model.
//!
//! A DCOP instance is an undirected graph of agents. Each agent picks one value
//! from its domain `0..D`; the instance cost is
//!
//! ```text
//! cost(x) = Σ unary_i(x_i) + Σ_{(i,j) ∈ E, i < j} binary_ij(x_i, x_j)
//! ```
//!
//! with every edge counted exactly once and every binary lookup keyed
//! smaller-id first. The graph is built once through
//! [`ConstraintGraph::builder`] and never changes afterwards; solvers and the
//! explanation layer only read it.
//!
//! # Example
//!
//! ```rust,ignore
//! use dcop::graph::{ConstraintGraph, CostTable, CONFLICT_PENALTY};
//!
//! let mut builder = ConstraintGraph::builder("pair");
//! let a = builder.add_agent(2, vec![0, 0], 0);
//! let b = builder.add_agent(2, vec![0, 0], 0);
//! builder.add_edge(a, b, |va, vb| if va == vb { CONFLICT_PENALTY } else { 0 })?;
//! let graph = builder.build()?;
//! ```

mod constraint_graph;
mod cost;

use std::collections::BTreeMap;

pub use constraint_graph::{AgentSpec, ConstraintGraph, ConstraintGraphBuilder};
pub use cost::{CostTable, CONFLICT_PENALTY};

/// Agent identifier, 1-indexed and contiguous.
pub type AgentId = u32;

/// Domain value.
pub type Value = usize;

/// Constraint cost. Signed so that cost deltas share the type.
pub type Cost = i64;

/// Meeting participant identifier.
pub type ParticipantId = u32;

/// Full assignment, ordered by agent id.
pub type Assignment = BTreeMap<AgentId, Value>;
