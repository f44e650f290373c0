//! Constraint graph: agents, domains, unary costs, and shared edge tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use super::cost::CostTable;
use super::{AgentId, Assignment, Cost, ParticipantId, Value};
use crate::error::{DcopError, Result};

/// Static description of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Agent id, 1-indexed.
    pub id: AgentId,
    /// Domain is `0..domain_size`.
    pub domain_size: usize,
    /// Unary cost per value.
    pub unary: Vec<Cost>,
    /// Starting value for the first solve.
    pub initial_value: Value,
    /// Meeting participants and their per-slot preference costs.
    /// Empty for problems that are not meeting scheduling.
    #[serde(default)]
    pub participants: BTreeMap<ParticipantId, Vec<Cost>>,
}

impl AgentSpec {
    /// Full domain in ascending order.
    pub fn domain(&self) -> Vec<Value> {
        (0..self.domain_size).collect()
    }

    /// Unary cost of `value`.
    pub fn unary_cost(&self, value: Value) -> Result<Cost> {
        self.unary.get(value).copied().ok_or_else(|| {
            DcopError::Config(format!("A_{} has no unary cost for value {value}", self.id))
        })
    }
}

/// Immutable constraint graph.
///
/// Node `i` holds agent `i + 1`; every edge weight is the cost table shared by
/// both endpoints.
#[derive(Debug, Clone)]
pub struct ConstraintGraph {
    name: String,
    graph: UnGraph<AgentSpec, Arc<CostTable>>,
}

impl ConstraintGraph {
    /// Start building a graph.
    pub fn builder(name: impl Into<String>) -> ConstraintGraphBuilder {
        ConstraintGraphBuilder {
            name: name.into(),
            agents: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Problem name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of agents.
    pub fn agent_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Agent specs in id order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentSpec> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Agent spec by id.
    pub fn agent(&self, id: AgentId) -> Result<&AgentSpec> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    /// Sorted neighbor ids of `id`.
    pub fn neighbors(&self, id: AgentId) -> Result<Vec<AgentId>> {
        let idx = self.index_of(id)?;
        let mut ids: Vec<AgentId> = self.graph.neighbors(idx).map(|n| self.graph[n].id).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Every edge table once, sorted by canonical `(low, high)`.
    pub fn edges(&self) -> Vec<&Arc<CostTable>> {
        let mut edges: Vec<&Arc<CostTable>> = self
            .graph
            .edge_indices()
            .map(|e| &self.graph[e])
            .collect();
        edges.sort_by_key(|table| table.endpoints());
        edges
    }

    /// Shared table of the edge between `a` and `b`.
    pub fn table(&self, a: AgentId, b: AgentId) -> Option<&Arc<CostTable>> {
        let ia = self.index_of(a).ok()?;
        let ib = self.index_of(b).ok()?;
        self.graph.find_edge(ia, ib).map(|e| &self.graph[e])
    }

    /// Unary cost of `agent` taking `value`.
    pub fn unary_cost(&self, agent: AgentId, value: Value) -> Result<Cost> {
        self.agent(agent)?.unary_cost(value)
    }

    /// Binary cost between two neighbors, canonical order applied internally.
    pub fn binary_cost(&self, a: AgentId, va: Value, b: AgentId, vb: Value) -> Result<Cost> {
        let table = self.table(a, b).ok_or(DcopError::MissingCost {
            low: a.min(b),
            low_value: if a < b { va } else { vb },
            high: a.max(b),
            high_value: if a < b { vb } else { va },
        })?;
        table.cost_between(a, va, b, vb)
    }

    /// Total cost: every unary term plus every edge exactly once.
    pub fn global_cost(&self, assignment: &Assignment) -> Result<Cost> {
        let value_of = |id: AgentId| {
            assignment
                .get(&id)
                .copied()
                .ok_or(DcopError::UnknownAgent(id))
        };

        let mut total = 0;
        for spec in self.agents() {
            total += spec.unary_cost(value_of(spec.id)?)?;
        }
        for table in self.edges() {
            let (low, high) = table.endpoints();
            total += table.get(value_of(low)?, value_of(high)?)?;
        }
        Ok(total)
    }

    /// Participants two meetings have in common, ascending.
    pub fn shared_participants(&self, a: AgentId, b: AgentId) -> Result<Vec<ParticipantId>> {
        let pa = &self.agent(a)?.participants;
        let pb = &self.agent(b)?.participants;
        Ok(pa.keys().filter(|p| pb.contains_key(*p)).copied().collect())
    }

    /// Assignment made of every agent's initial value.
    pub fn initial_assignment(&self) -> Assignment {
        self.agents().map(|a| (a.id, a.initial_value)).collect()
    }

    fn index_of(&self, id: AgentId) -> Result<NodeIndex> {
        if id == 0 || id as usize > self.graph.node_count() {
            return Err(DcopError::UnknownAgent(id));
        }
        Ok(NodeIndex::new(id as usize - 1))
    }
}

/// Incremental, validating builder for [`ConstraintGraph`].
#[derive(Debug)]
pub struct ConstraintGraphBuilder {
    name: String,
    agents: Vec<AgentSpec>,
    edges: Vec<CostTable>,
}

impl ConstraintGraphBuilder {
    /// Add an agent; ids are handed out contiguously from 1.
    pub fn add_agent(&mut self, domain_size: usize, unary: Vec<Cost>, initial_value: Value) -> AgentId {
        let id = self.agents.len() as AgentId + 1;
        self.agents.push(AgentSpec {
            id,
            domain_size,
            unary,
            initial_value,
            participants: BTreeMap::new(),
        });
        id
    }

    /// Add a meeting whose unary cost per slot is the sum of its
    /// participants' preferences.
    pub fn add_meeting(
        &mut self,
        domain_size: usize,
        participants: BTreeMap<ParticipantId, Vec<Cost>>,
        initial_value: Value,
    ) -> AgentId {
        let unary = (0..domain_size)
            .map(|slot| {
                participants
                    .values()
                    .map(|prefs| prefs.get(slot).copied().unwrap_or(0))
                    .sum::<Cost>()
            })
            .collect();
        let id = self.add_agent(domain_size, unary, initial_value);
        if let Some(spec) = self.agents.last_mut() {
            spec.participants = participants;
        }
        id
    }

    /// Connect `a` and `b`; `cost` receives `(value of a, value of b)`.
    pub fn add_edge<F>(&mut self, a: AgentId, b: AgentId, cost: F) -> Result<&mut Self>
    where
        F: Fn(Value, Value) -> Cost,
    {
        let a_size = self.domain_size(a)?;
        let b_size = self.domain_size(b)?;
        self.insert_table(CostTable::from_fn(a, a_size, b, b_size, cost))
    }

    /// Connect two agents with equal domains by a must-differ constraint.
    pub fn add_must_differ(&mut self, a: AgentId, b: AgentId, penalty: Cost) -> Result<&mut Self> {
        let size = self.domain_size(a)?;
        if self.domain_size(b)? != size {
            return Err(DcopError::Config(format!(
                "Must-differ edge A_{a} - A_{b} needs equal domains"
            )));
        }
        self.insert_table(CostTable::must_differ(a, b, size, penalty))
    }

    fn insert_table(&mut self, table: CostTable) -> Result<&mut Self> {
        let (low, high) = table.endpoints();
        if low == high {
            return Err(DcopError::Config(format!("Self-loop on A_{low}")));
        }
        if self.edges.iter().any(|t| t.endpoints() == (low, high)) {
            return Err(DcopError::Config(format!(
                "Duplicate edge A_{low} - A_{high}"
            )));
        }
        self.edges.push(table);
        Ok(self)
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<ConstraintGraph> {
        let mut graph = UnGraph::with_capacity(self.agents.len(), self.edges.len());

        for spec in self.agents {
            if spec.domain_size == 0 {
                return Err(DcopError::Config(format!("A_{} has an empty domain", spec.id)));
            }
            if spec.unary.len() != spec.domain_size {
                return Err(DcopError::Config(format!(
                    "A_{} has {} unary costs for a domain of {}",
                    spec.id,
                    spec.unary.len(),
                    spec.domain_size
                )));
            }
            if spec.initial_value >= spec.domain_size {
                return Err(DcopError::Config(format!(
                    "A_{} starts at {} outside domain 0..{}",
                    spec.id, spec.initial_value, spec.domain_size
                )));
            }
            if let Some((p, prefs)) = spec
                .participants
                .iter()
                .find(|(_, prefs)| prefs.len() != spec.domain_size)
            {
                return Err(DcopError::Config(format!(
                    "Participant {p} of A_{} has {} slot costs for a domain of {}",
                    spec.id,
                    prefs.len(),
                    spec.domain_size
                )));
            }
            graph.add_node(spec);
        }

        for table in self.edges {
            let (low, high) = table.endpoints();
            graph.add_edge(
                NodeIndex::new(low as usize - 1),
                NodeIndex::new(high as usize - 1),
                Arc::new(table),
            );
        }

        Ok(ConstraintGraph {
            name: self.name,
            graph,
        })
    }

    fn domain_size(&self, id: AgentId) -> Result<usize> {
        id.checked_sub(1)
            .and_then(|i| self.agents.get(i as usize))
            .map(|spec| spec.domain_size)
            .ok_or(DcopError::UnknownAgent(id))
    }
}
