//! MGM agent: one node of the constraint graph running the round protocol.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::message::{Message, MessageType};
use crate::error::{DcopError, Result};
use crate::graph::{AgentId, AgentSpec, ConstraintGraph, Cost, CostTable, Value};

/// Protocol phase of an agent within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Waiting for neighbors' committed values
    Observe,
    /// Computing the best local reduction
    Compute,
    /// Waiting for neighbors' local reductions
    Compare,
    /// Committing the proposal or holding the current value
    Decide,
}

impl AgentStatus {
    /// Status at the start of a solve.
    pub const INITIAL: Self = Self::Observe;

    /// Phase that follows `self`.
    pub fn next(self) -> Self {
        match self {
            Self::Observe => Self::Compute,
            Self::Compute => Self::Compare,
            Self::Compare => Self::Decide,
            Self::Decide => Self::Observe,
        }
    }
}

/// Per-round state, owned and mutated by its agent only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// Best local reduction found this round (0 = no proposal)
    pub lr: Cost,
    /// Value achieving `lr`
    pub lr_potential_asgmt: Value,
    /// Rounds completed by this agent
    pub local_clock: u64,
    /// Current phase
    pub status: AgentStatus,
}

impl RoundState {
    fn new(value: Value) -> Self {
        Self {
            lr: 0,
            lr_potential_asgmt: value,
            local_clock: 0,
            status: AgentStatus::INITIAL,
        }
    }
}

/// MGM participant.
#[derive(Debug, Clone)]
pub struct MgmAgent {
    id: AgentId,
    domain: Vec<Value>,
    value: Value,
    neighbors: Vec<AgentId>,
    constraints: BTreeMap<AgentId, Arc<CostTable>>,
    unary: Vec<Cost>,
    neighbor_values: BTreeMap<AgentId, Value>,
    neighbor_gains: BTreeMap<AgentId, Cost>,
    state: RoundState,
}

impl MgmAgent {
    /// Wire an agent from its spec; shares the graph's edge tables.
    pub fn from_spec(spec: &AgentSpec, graph: &ConstraintGraph) -> Result<Self> {
        let neighbors = graph.neighbors(spec.id)?;
        let mut constraints = BTreeMap::new();
        for &n in &neighbors {
            let table = graph.table(spec.id, n).ok_or(DcopError::MissingCost {
                low: spec.id.min(n),
                low_value: 0,
                high: spec.id.max(n),
                high_value: 0,
            })?;
            constraints.insert(n, Arc::clone(table));
        }

        Ok(Self {
            id: spec.id,
            domain: spec.domain(),
            value: spec.initial_value,
            neighbors,
            constraints,
            unary: spec.unary.clone(),
            neighbor_values: BTreeMap::new(),
            neighbor_gains: BTreeMap::new(),
            state: RoundState::new(spec.initial_value),
        })
    }

    /// Agent id
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current value
    pub fn value(&self) -> Value {
        self.value
    }

    /// Current (possibly restricted) domain
    pub fn domain(&self) -> &[Value] {
        &self.domain
    }

    /// Sorted neighbor ids
    pub fn neighbors(&self) -> &[AgentId] {
        &self.neighbors
    }

    /// Edge table shared with `neighbor`
    pub fn constraint(&self, neighbor: AgentId) -> Option<&Arc<CostTable>> {
        self.constraints.get(&neighbor)
    }

    /// Round state
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Current phase
    pub fn status(&self) -> AgentStatus {
        self.state.status
    }

    /// Neighbor values read in the last observe phase
    pub fn neighbor_values(&self) -> &BTreeMap<AgentId, Value> {
        &self.neighbor_values
    }

    /// Unary cost of `value`
    pub fn unary_cost(&self, value: Value) -> Result<Cost> {
        self.unary.get(value).copied().ok_or_else(|| {
            DcopError::Config(format!("A_{} has no unary cost for value {value}", self.id))
        })
    }

    /// ASSIGNMENT messages announcing the committed value.
    pub fn announce_value(&self, clock: u64) -> Vec<Message> {
        self.neighbors
            .iter()
            .map(|&n| Message::assignment(self.id, n, clock, self.value))
            .collect()
    }

    /// GAIN messages announcing this round's `lr`.
    pub fn announce_gain(&self, clock: u64) -> Vec<Message> {
        self.neighbors
            .iter()
            .map(|&n| Message::gain(self.id, n, clock, self.state.lr))
            .collect()
    }

    /// Observe: record every neighbor's committed value.
    pub fn observe(&mut self, inbox: &[Message]) -> Result<()> {
        self.ensure_phase(AgentStatus::Observe)?;
        self.neighbor_values.clear();
        for message in inbox.iter().filter(|m| m.msg_type == MessageType::Assignment) {
            let value = message.get_value().ok_or_else(|| {
                DcopError::Protocol(format!("ASSIGNMENT from A_{} has no value", message.sender))
            })?;
            self.neighbor_values.insert(message.sender, value);
        }
        self.require_all(self.neighbor_values.len(), "ASSIGNMENT")?;
        self.advance();
        Ok(())
    }

    /// Compute: scan the domain for the best unilateral move.
    pub fn compute(&mut self) -> Result<()> {
        self.ensure_phase(AgentStatus::Compute)?;

        let current = self.local_cost(self.value)?;
        let mut best_cost = current;
        let mut best_value = self.value;
        for &candidate in &self.domain {
            let cost = self.local_cost(candidate)?;
            if cost < best_cost {
                best_cost = cost;
                best_value = candidate;
            }
        }

        if best_cost < current {
            self.state.lr = current - best_cost;
            self.state.lr_potential_asgmt = best_value;
        } else {
            self.state.lr = 0;
            self.state.lr_potential_asgmt = self.value;
        }
        self.advance();
        Ok(())
    }

    /// Compare: record neighbors' gains. Returns whether this agent wins.
    pub fn compare(&mut self, inbox: &[Message]) -> Result<bool> {
        self.ensure_phase(AgentStatus::Compare)?;
        self.neighbor_gains.clear();
        for message in inbox.iter().filter(|m| m.msg_type == MessageType::Gain) {
            let lr = message.get_gain().ok_or_else(|| {
                DcopError::Protocol(format!("GAIN from A_{} has no lr", message.sender))
            })?;
            self.neighbor_gains.insert(message.sender, lr);
        }
        self.require_all(self.neighbor_gains.len(), "GAIN")?;
        self.advance();
        Ok(self.wins())
    }

    /// Commit the proposal if this agent won the round, else hold.
    /// Returns the new value on commit.
    pub fn commit_or_hold(&mut self) -> Result<Option<Value>> {
        self.ensure_phase(AgentStatus::Decide)?;
        let committed = if self.wins() {
            self.value = self.state.lr_potential_asgmt;
            Some(self.value)
        } else {
            None
        };
        self.state.local_clock += 1;
        self.advance();
        Ok(committed)
    }

    /// Cost of taking `value` against the last observed neighbor values.
    pub fn local_cost(&self, value: Value) -> Result<Cost> {
        let mut cost = self.unary_cost(value)?;
        for (&neighbor, &neighbor_value) in &self.neighbor_values {
            let table = self.constraints.get(&neighbor).ok_or(DcopError::MissingCost {
                low: self.id.min(neighbor),
                low_value: value,
                high: self.id.max(neighbor),
                high_value: neighbor_value,
            })?;
            cost += table.cost_between(self.id, value, neighbor, neighbor_value)?;
        }
        Ok(cost)
    }

    /// Cheapest in-domain value against fixed neighbor values; smallest value
    /// wins ties.
    pub fn best_value_against(&self, neighbor_values: &BTreeMap<AgentId, Value>) -> Result<Value> {
        let mut best: Option<(Cost, Value)> = None;
        for &candidate in &self.domain {
            let mut cost = self.unary_cost(candidate)?;
            for (&neighbor, table) in &self.constraints {
                let nv = neighbor_values
                    .get(&neighbor)
                    .copied()
                    .ok_or(DcopError::UnknownAgent(neighbor))?;
                cost += table.cost_between(self.id, candidate, neighbor, nv)?;
            }
            if best.map_or(true, |(c, _)| cost < c) {
                best = Some((cost, candidate));
            }
        }
        best.map(|(_, v)| v)
            .ok_or_else(|| DcopError::Config(format!("A_{} has an empty domain", self.id)))
    }

    /// Replace the domain with a restricted view.
    pub(crate) fn restrict_domain(&mut self, domain: Vec<Value>) {
        self.domain = domain;
    }

    /// Move to `value` outside the protocol (explanation repair only).
    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Reset round bookkeeping ahead of a fresh solve.
    pub(crate) fn reset_round_state(&mut self) {
        self.state = RoundState::new(self.value);
        self.neighbor_values.clear();
        self.neighbor_gains.clear();
    }

    fn wins(&self) -> bool {
        self.state.lr > 0 && self.neighbor_gains.values().all(|&lr| self.state.lr > lr)
    }

    fn ensure_phase(&self, status: AgentStatus) -> Result<()> {
        if self.state.status != status {
            return Err(DcopError::Protocol(format!(
                "A_{} cannot run {:?} while in {:?}",
                self.id, status, self.state.status
            )));
        }
        Ok(())
    }

    fn require_all(&self, received: usize, kind: &str) -> Result<()> {
        if received != self.neighbors.len() {
            return Err(DcopError::Protocol(format!(
                "A_{} received {received} {kind} messages from {} neighbors",
                self.id,
                self.neighbors.len()
            )));
        }
        Ok(())
    }

    fn advance(&mut self) {
        self.state.status = self.state.status.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CONFLICT_PENALTY;

    fn pair(unary_a: Vec<Cost>, unary_b: Vec<Cost>) -> ConstraintGraph {
        let mut builder = ConstraintGraph::builder("pair");
        let a = builder.add_agent(unary_a.len(), unary_a, 0);
        let b = builder.add_agent(unary_b.len(), unary_b, 0);
        builder
            .add_edge(a, b, |va, vb| if va == vb { CONFLICT_PENALTY } else { 0 })
            .unwrap();
        builder.build().unwrap()
    }

    fn agents(graph: &ConstraintGraph) -> Vec<MgmAgent> {
        graph
            .agents()
            .map(|spec| MgmAgent::from_spec(spec, graph).unwrap())
            .collect()
    }

    #[test]
    fn test_status_cycle() {
        let mut status = AgentStatus::INITIAL;
        for _ in 0..4 {
            status = status.next();
        }
        assert_eq!(status, AgentStatus::INITIAL);
        assert_eq!(AgentStatus::Observe.next(), AgentStatus::Compute);
    }

    #[test]
    fn test_wrong_phase_is_protocol_error() {
        let graph = pair(vec![0, 0], vec![0, 0]);
        let mut agent = agents(&graph).remove(0);
        assert!(matches!(agent.compute(), Err(DcopError::Protocol(_))));
        assert!(matches!(agent.commit_or_hold(), Err(DcopError::Protocol(_))));
    }

    #[test]
    fn test_missing_neighbor_value_rejected() {
        let graph = pair(vec![0, 0], vec![0, 0]);
        let mut agent = agents(&graph).remove(0);
        assert!(agent.observe(&[]).is_err());
    }

    #[test]
    fn test_compute_finds_best_reduction() {
        let graph = pair(vec![0, 1, 5], vec![0, 0]);
        let mut all = agents(&graph);
        let b = all.pop().unwrap();
        let mut a = all.pop().unwrap();

        a.observe(&b.announce_value(0)).unwrap();
        a.compute().unwrap();
        // at 0: conflict 100; at 1: unary 1; at 2: unary 5
        assert_eq!(a.state().lr, CONFLICT_PENALTY - 1);
        assert_eq!(a.state().lr_potential_asgmt, 1);
        assert_eq!(a.status(), AgentStatus::Compare);
    }

    #[test]
    fn test_strictly_larger_gain_commits() {
        let graph = pair(vec![0, 1], vec![0, 2]);
        let mut all = agents(&graph);
        let mut b = all.pop().unwrap();
        let mut a = all.pop().unwrap();

        let to_a = b.announce_value(0);
        let to_b = a.announce_value(0);
        a.observe(&to_a).unwrap();
        b.observe(&to_b).unwrap();
        a.compute().unwrap();
        b.compute().unwrap();

        let gain_to_a = b.announce_gain(0);
        let gain_to_b = a.announce_gain(0);
        assert!(a.compare(&gain_to_a).unwrap());
        assert!(!b.compare(&gain_to_b).unwrap());

        assert_eq!(a.commit_or_hold().unwrap(), Some(1));
        assert_eq!(b.commit_or_hold().unwrap(), None);
        assert_eq!(a.state().local_clock, 1);
        assert_eq!(a.status(), AgentStatus::Observe);
    }

    #[test]
    fn test_equal_gains_both_hold() {
        let graph = pair(vec![0, 0], vec![0, 0]);
        let mut all = agents(&graph);
        let mut b = all.pop().unwrap();
        let mut a = all.pop().unwrap();

        let (to_a, to_b) = (b.announce_value(0), a.announce_value(0));
        a.observe(&to_a).unwrap();
        b.observe(&to_b).unwrap();
        a.compute().unwrap();
        b.compute().unwrap();
        assert_eq!(a.state().lr, b.state().lr);

        let (gain_to_a, gain_to_b) = (b.announce_gain(0), a.announce_gain(0));
        assert!(!a.compare(&gain_to_a).unwrap());
        assert!(!b.compare(&gain_to_b).unwrap());
        assert_eq!(a.commit_or_hold().unwrap(), None);
        assert_eq!(b.commit_or_hold().unwrap(), None);
    }

    #[test]
    fn test_best_value_against_prefers_smallest_on_tie() {
        let graph = pair(vec![3, 0, 0], vec![0, 0, 0]);
        let a = agents(&graph).remove(0);
        let context = BTreeMap::from([(2, 2)]);
        assert_eq!(a.best_value_against(&context).unwrap(), 1);
    }

    #[test]
    fn test_reset_round_state() {
        let graph = pair(vec![0, 1], vec![0, 2]);
        let mut a = agents(&graph).remove(0);
        a.set_value(1);
        a.reset_round_state();
        assert_eq!(
            a.state(),
            &RoundState {
                lr: 0,
                lr_potential_asgmt: 1,
                local_clock: 0,
                status: AgentStatus::INITIAL,
            }
        );
    }
}
