//! Contrastive explanation over a solved [`Dcop`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::category::{Category, CategoryPartition};
use super::report::{
    AgentChange, EdgeChange, ExplainMode, ExplanationReport, OverlapChange, ParticipantChange,
};
use crate::error::{DcopError, Result};
use crate::graph::{AgentId, Assignment, Cost, ParticipantId, Value};
use crate::solver::{Dcop, ExecutionSummary};

/// Where an explanation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationStage {
    /// Context captured, domains untouched
    Constructed,
    /// Domains restricted and round state reset
    Prepared,
    /// No-good solved and captured
    Generated,
}

/// Context vs. no-good comparison for one set of categories.
///
/// Lifecycle: [`Explanation::new`] captures the converged assignment as the
/// context, [`update_agents_before_generate_no_good`] restricts domains,
/// [`generate_no_good`] re-runs the solver, and [`explain`] reports the
/// differences. Steps out of order fail with [`DcopError::Sequencing`].
///
/// [`update_agents_before_generate_no_good`]: Explanation::update_agents_before_generate_no_good
/// [`generate_no_good`]: Explanation::generate_no_good
/// [`explain`]: Explanation::explain
#[derive(Debug)]
pub struct Explanation<'a> {
    dcop: &'a mut Dcop,
    categories: CategoryPartition,
    context: Assignment,
    context_global_cost: Cost,
    no_good: Option<Assignment>,
    no_good_global_cost: Option<Cost>,
    stage: ExplanationStage,
}

impl<'a> Explanation<'a> {
    /// Capture the context of a converged `dcop` and validate `categories`
    /// against it.
    pub fn new(dcop: &'a mut Dcop, categories: CategoryPartition) -> Result<Self> {
        if !dcop.is_converged() {
            return Err(DcopError::Sequencing(
                "explanation needs a converged solve".to_string(),
            ));
        }

        let context = dcop.assignment();
        for (id, category) in categories.listed() {
            let spec = dcop.graph().agent(id)?;
            if let Category::FixedTo(value) = category {
                if value >= spec.domain_size {
                    return Err(DcopError::Config(format!(
                        "A_{id} cannot be fixed to {value} outside domain 0..{}",
                        spec.domain_size
                    )));
                }
                if context.get(&id) == Some(&value) {
                    return Err(DcopError::Config(format!(
                        "A_{id} cannot be fixed to its context value {value}"
                    )));
                }
            }
        }

        let unlisted: Vec<AgentId> = context
            .keys()
            .copied()
            .filter(|&id| !categories.is_listed(id))
            .collect();
        if !unlisted.is_empty() {
            debug!(?unlisted, "unlisted agents are free");
        }

        let context_global_cost = dcop.global_cost()?;

        Ok(Self {
            dcop,
            categories,
            context,
            context_global_cost,
            no_good: None,
            no_good_global_cost: None,
            stage: ExplanationStage::Constructed,
        })
    }

    /// Build from the four category sets directly.
    pub fn from_sets(
        dcop: &'a mut Dcop,
        fixed_to_context: impl IntoIterator<Item = AgentId>,
        exclude_context: impl IntoIterator<Item = AgentId>,
        fixed_to: impl IntoIterator<Item = (AgentId, Value)>,
        free: impl IntoIterator<Item = AgentId>,
    ) -> Result<Self> {
        let categories =
            CategoryPartition::new(fixed_to_context, exclude_context, fixed_to, free)?;
        Self::new(dcop, categories)
    }

    /// The coordinator being explained
    pub fn dcop(&self) -> &Dcop {
        &*self.dcop
    }

    /// Category partition
    pub fn categories(&self) -> &CategoryPartition {
        &self.categories
    }

    /// Current stage
    pub fn stage(&self) -> ExplanationStage {
        self.stage
    }

    /// Assignment at construction time
    pub fn context(&self) -> &Assignment {
        &self.context
    }

    /// Global cost of the context
    pub fn context_global_cost(&self) -> Cost {
        self.context_global_cost
    }

    /// No-good assignment, once generated
    pub fn no_good(&self) -> Option<&Assignment> {
        self.no_good.as_ref()
    }

    /// Global cost of the no-good, once generated
    pub fn no_good_global_cost(&self) -> Option<Cost> {
        self.no_good_global_cost
    }

    /// Apply every agent's restricted domain and reset its round state.
    ///
    /// An agent whose current value falls outside its new domain first moves
    /// to the cheapest in-domain value against the context.
    pub fn update_agents_before_generate_no_good(&mut self) -> Result<()> {
        self.require(ExplanationStage::Constructed, "update agents")?;

        let domains = self
            .categories
            .restricted_domains(self.dcop.graph(), &self.context)?;

        for (id, domain) in domains {
            let agent = self.dcop.agent_mut(id)?;
            agent.restrict_domain(domain);
            if !agent.domain().contains(&agent.value()) {
                let repaired = agent.best_value_against(&self.context)?;
                debug!(agent = id, from = agent.value(), to = repaired, "value repaired");
                agent.set_value(repaired);
            }
        }
        self.dcop.reset_round_state();

        self.stage = ExplanationStage::Prepared;
        Ok(())
    }

    /// Re-run the solver under the restricted domains and capture the result.
    pub fn generate_no_good(&mut self) -> Result<ExecutionSummary> {
        self.require(ExplanationStage::Prepared, "generate the no-good")?;

        let summary = self.dcop.execute()?;
        let no_good_global_cost = self.dcop.global_cost()?;
        self.no_good = Some(self.dcop.assignment());
        self.no_good_global_cost = Some(no_good_global_cost);
        self.stage = ExplanationStage::Generated;

        info!(
            context_global_cost = self.context_global_cost,
            no_good_global_cost,
            rounds = summary.rounds,
            "no-good captured"
        );
        Ok(summary)
    }

    /// Compare context and no-good. Pure; repeated calls agree.
    pub fn explain(&self, mode: ExplainMode) -> Result<ExplanationReport> {
        let (Some(no_good), Some(no_good_global_cost)) =
            (self.no_good.as_ref(), self.no_good_global_cost)
        else {
            return Err(DcopError::Sequencing(
                "explain called before generate_no_good".to_string(),
            ));
        };
        let graph = self.dcop.graph();

        let mut edge_changes = Vec::new();
        for table in graph.edges() {
            let (low, high) = table.endpoints();
            let before = (value_in(&self.context, low)?, value_in(&self.context, high)?);
            let after = (value_in(no_good, low)?, value_in(no_good, high)?);
            if before == after {
                continue;
            }
            edge_changes.push(EdgeChange {
                low,
                high,
                before,
                after,
                cost_before: table.get(before.0, before.1)?,
                cost_after: table.get(after.0, after.1)?,
                shared_participants: graph.shared_participants(low, high)?,
                overlap: OverlapChange::classify(before, after),
            });
        }

        let mut agent_changes = Vec::new();
        for spec in graph.agents() {
            let value_before = value_in(&self.context, spec.id)?;
            let value_after = value_in(no_good, spec.id)?;
            if value_before == value_after {
                continue;
            }
            let participants = spec
                .participants
                .iter()
                .map(|(&participant, prefs)| {
                    Ok(ParticipantChange {
                        participant,
                        cost_before: slot_cost(prefs, participant, value_before)?,
                        cost_after: slot_cost(prefs, participant, value_after)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            agent_changes.push(AgentChange {
                agent: spec.id,
                value_before,
                value_after,
                unary_before: spec.unary_cost(value_before)?,
                unary_after: spec.unary_cost(value_after)?,
                participants,
            });
        }

        Ok(ExplanationReport {
            mode,
            meetings: graph.agents().any(|spec| !spec.participants.is_empty()),
            context: self.context.clone(),
            context_global_cost: self.context_global_cost,
            no_good: no_good.clone(),
            no_good_global_cost,
            edge_changes,
            agent_changes,
        })
    }

    fn require(&self, stage: ExplanationStage, action: &str) -> Result<()> {
        if self.stage != stage {
            return Err(DcopError::Sequencing(format!(
                "cannot {action} in stage {:?}",
                self.stage
            )));
        }
        Ok(())
    }
}

fn value_in(assignment: &Assignment, id: AgentId) -> Result<Value> {
    assignment
        .get(&id)
        .copied()
        .ok_or(DcopError::UnknownAgent(id))
}

fn slot_cost(prefs: &[Cost], participant: ParticipantId, slot: Value) -> Result<Cost> {
    prefs.get(slot).copied().ok_or_else(|| {
        DcopError::Config(format!("Participant {participant} has no cost for slot {slot}"))
    })
}
