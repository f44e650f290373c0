use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Algorithm, ExecutionSummary, RoundRecord};
use crate::config::SolverConfig;
use crate::error::{DcopError, Result};
use crate::graph::{AgentId, Assignment, ConstraintGraph, Cost};
use crate::protocol::{Mailer, MgmAgent};

/// Coordinator of one DCOP instance.
#[derive(Debug, Clone)]
pub struct Dcop {
    graph: Arc<ConstraintGraph>,
    agents: Vec<MgmAgent>,
    mailer: Mailer,
    global_clock: u64,
    config: SolverConfig,
    history: Vec<RoundRecord>,
    converged: bool,
}

impl Dcop {
    /// Wire agents and mailer over `graph`.
    pub fn new(graph: ConstraintGraph, config: SolverConfig) -> Result<Self> {
        let graph = Arc::new(graph);
        let agents = graph
            .agents()
            .map(|spec| MgmAgent::from_spec(spec, &graph))
            .collect::<Result<Vec<_>>>()?;
        let mailer = Mailer::new(&graph)?;

        debug!(
            name = graph.name(),
            agents = agents.len(),
            edges = graph.edge_count(),
            "dcop wired"
        );

        Ok(Self {
            graph,
            agents,
            mailer,
            global_clock: 0,
            config,
            history: Vec::new(),
            converged: false,
        })
    }

    /// The constraint graph
    pub fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    /// Agents in id order
    pub fn agents(&self) -> &[MgmAgent] {
        &self.agents
    }

    /// Agent by id
    pub fn agent(&self, id: AgentId) -> Result<&MgmAgent> {
        id.checked_sub(1)
            .and_then(|i| self.agents.get(i as usize))
            .ok_or(DcopError::UnknownAgent(id))
    }

    pub(crate) fn agent_mut(&mut self, id: AgentId) -> Result<&mut MgmAgent> {
        id.checked_sub(1)
            .and_then(|i| self.agents.get_mut(i as usize))
            .ok_or(DcopError::UnknownAgent(id))
    }

    /// Selected algorithm
    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    /// Global clock (rounds run since creation)
    pub fn global_clock(&self) -> u64 {
        self.global_clock
    }

    /// Rounds of the last `execute()` call, if recorded
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    /// Whether the last `execute()` reached a fixed point
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Current value of every agent
    pub fn assignment(&self) -> Assignment {
        self.agents.iter().map(|a| (a.id(), a.value())).collect()
    }

    /// Global cost of the current assignment
    pub fn global_cost(&self) -> Result<Cost> {
        self.graph.global_cost(&self.assignment())
    }

    /// Run rounds until one passes without a commit.
    pub fn execute(&mut self) -> Result<ExecutionSummary> {
        self.history.clear();
        self.converged = false;

        let initial_cost = self.global_cost()?;
        let mut rounds = 0;
        let mut commits = 0;

        loop {
            if rounds >= self.config.max_rounds {
                warn!(
                    name = self.graph.name(),
                    rounds, "no fixed point within the round bound"
                );
                return Err(DcopError::NonConvergence { rounds });
            }

            let record = match self.config.algorithm {
                Algorithm::Mgm => self.run_mgm_round()?,
            };
            rounds += 1;
            commits += record.commits.len();
            let quiet = record.commits.is_empty();
            if self.config.record_history {
                self.history.push(record);
            }
            if quiet {
                break;
            }
        }

        self.converged = true;
        let final_cost = self.global_cost()?;
        info!(
            name = self.graph.name(),
            rounds, commits, initial_cost, final_cost, "converged"
        );

        Ok(ExecutionSummary {
            rounds,
            commits,
            initial_cost,
            final_cost,
        })
    }

    /// Reset every agent's round state ahead of another solve.
    pub(crate) fn reset_round_state(&mut self) {
        for agent in &mut self.agents {
            agent.reset_round_state();
        }
        self.converged = false;
    }

    fn run_mgm_round(&mut self) -> Result<RoundRecord> {
        let clock = self.global_clock;
        self.mailer.open_round(clock);

        // observe + compute
        for agent in &self.agents {
            self.mailer.post_all(agent.announce_value(clock))?;
        }
        self.mailer.deliver();
        for agent in &mut self.agents {
            let inbox = self.mailer.take_inbox(agent.id());
            agent.observe(&inbox)?;
            agent.compute()?;
        }

        // compare
        for agent in &self.agents {
            self.mailer.post_all(agent.announce_gain(clock))?;
        }
        self.mailer.deliver();
        for agent in &mut self.agents {
            let inbox = self.mailer.take_inbox(agent.id());
            agent.compare(&inbox)?;
        }

        // commit-or-hold
        let mut commits = Vec::new();
        for agent in &mut self.agents {
            let lr = agent.state().lr;
            if let Some(value) = agent.commit_or_hold()? {
                debug!(round = clock, agent = agent.id(), value, lr, "commit");
                commits.push(agent.id());
            }
        }

        self.global_clock += 1;
        let global_cost = self.global_cost()?;
        debug!(round = clock, commits = commits.len(), global_cost, "round done");

        Ok(RoundRecord {
            round: clock,
            commits,
            global_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CONFLICT_PENALTY;

    fn cycle(unary_b: [Cost; 3], start: [usize; 3]) -> ConstraintGraph {
        let mut builder = ConstraintGraph::builder("cycle");
        let ids: Vec<AgentId> = (0..3)
            .map(|i| builder.add_agent(2, vec![0, unary_b[i]], start[i]))
            .collect();
        for (a, b) in [(ids[0], ids[1]), (ids[1], ids[2]), (ids[2], ids[0])] {
            builder
                .add_edge(a, b, |va, vb| if va == vb { CONFLICT_PENALTY } else { 0 })
                .unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_execute_converges_with_one_violated_edge() {
        let mut dcop = Dcop::new(cycle([1, 2, 3], [0, 0, 0]), SolverConfig::default()).unwrap();
        let summary = dcop.execute().unwrap();

        assert!(dcop.is_converged());
        assert_eq!(summary.initial_cost, 3 * CONFLICT_PENALTY);
        assert_eq!(summary.final_cost, CONFLICT_PENALTY + 1);
        assert_eq!(summary.rounds, 2);
        assert_eq!(dcop.assignment(), Assignment::from([(1, 1), (2, 0), (3, 0)]));
        assert_eq!(dcop.history()[0].commits, vec![1]);
        assert!(dcop.history()[1].commits.is_empty());
    }

    #[test]
    fn test_equal_gains_stall() {
        let mut dcop = Dcop::new(cycle([0, 0, 0], [0, 0, 0]), SolverConfig::default()).unwrap();
        let summary = dcop.execute().unwrap();
        assert_eq!(summary.rounds, 1);
        assert_eq!(summary.commits, 0);
        assert_eq!(summary.final_cost, 3 * CONFLICT_PENALTY);
    }

    #[test]
    fn test_round_bound_is_fatal() {
        let config = SolverConfig {
            max_rounds: 1,
            ..SolverConfig::default()
        };
        let mut dcop = Dcop::new(cycle([1, 2, 3], [0, 0, 0]), config).unwrap();
        assert!(matches!(
            dcop.execute(),
            Err(DcopError::NonConvergence { rounds: 1 })
        ));
        assert!(!dcop.is_converged());
    }

    #[test]
    fn test_execute_is_idempotent_at_fixed_point() {
        let mut dcop = Dcop::new(cycle([1, 2, 3], [0, 0, 0]), SolverConfig::default()).unwrap();
        dcop.execute().unwrap();
        let before = dcop.assignment();
        let summary = dcop.execute().unwrap();
        assert_eq!(summary.commits, 0);
        assert_eq!(dcop.assignment(), before);
        assert_eq!(dcop.global_clock(), 3);
    }

    #[test]
    fn test_agent_lookup() {
        let dcop = Dcop::new(cycle([1, 2, 3], [0, 0, 0]), SolverConfig::default()).unwrap();
        assert_eq!(dcop.agent(2).unwrap().id(), 2);
        assert!(dcop.agent(0).is_err());
        assert!(dcop.agent(4).is_err());
    }
}
