//! Explanation report and its textual rendering.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::graph::{AgentId, Assignment, Cost, ParticipantId, Value};

/// How the report is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplainMode {
    /// Assignments, costs, and per-constraint before/after numbers
    #[default]
    Technical,
    /// Adds overlap stories and per-participant cost breakdowns
    Narrative,
}

/// Whether two neighbors shared a value (time slot) before and after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapChange {
    /// Different before, same after
    NewlyOverlapping,
    /// Same before, different after
    NoLongerOverlapping,
    /// Same before and after
    StillOverlapping,
    /// Different before and after
    NeverOverlapping,
}

impl OverlapChange {
    /// Classify from the pair's values in the context and in the no-good.
    pub fn classify(before: (Value, Value), after: (Value, Value)) -> Self {
        match (before.0 == before.1, after.0 == after.1) {
            (false, true) => Self::NewlyOverlapping,
            (true, false) => Self::NoLongerOverlapping,
            (true, true) => Self::StillOverlapping,
            (false, false) => Self::NeverOverlapping,
        }
    }

    fn story(&self, shared: &str) -> String {
        match self {
            Self::NoLongerOverlapping => format!(
                "Meetings overlapped before the change, but after the time slot change, they no \
                 longer overlap. Mutual participants ({shared}) can now attend both meetings."
            ),
            Self::NeverOverlapping => format!(
                "Meetings did not overlap before or after the change. Mutual participants \
                 ({shared}) could already attend both meetings."
            ),
            Self::StillOverlapping => format!(
                "Meetings overlapped before the change, and they still overlap after the time \
                 slot change. Mutual participants ({shared}) cannot attend both meetings."
            ),
            Self::NewlyOverlapping => format!(
                "Meetings did not overlap before the change, but after the time slot change, \
                 they now overlap. Mutual participants ({shared}) can no longer attend both \
                 meetings."
            ),
        }
    }
}

/// Direction of a meeting's total participant cost (lower is better)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionTrend {
    /// Satisfaction rose: total cost went down
    Increased,
    /// Satisfaction fell: total cost went up
    Reduced,
    /// Total cost unchanged
    Unchanged,
}

impl fmt::Display for SatisfactionTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increased => write!(f, "increased"),
            Self::Reduced => write!(f, "reduced"),
            Self::Unchanged => write!(f, "remained the same"),
        }
    }
}

/// A constraint edge whose endpoints' values changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeChange {
    /// Smaller endpoint id
    pub low: AgentId,
    /// Larger endpoint id
    pub high: AgentId,
    /// `(low value, high value)` in the context
    pub before: (Value, Value),
    /// `(low value, high value)` in the no-good
    pub after: (Value, Value),
    /// Binary cost in the context
    pub cost_before: Cost,
    /// Binary cost in the no-good
    pub cost_after: Cost,
    /// Participants both meetings share
    pub shared_participants: Vec<ParticipantId>,
    /// Overlap classification
    pub overlap: OverlapChange,
}

/// One participant's preference cost before and after
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantChange {
    /// Participant id
    pub participant: ParticipantId,
    /// Cost of the context slot
    pub cost_before: Cost,
    /// Cost of the no-good slot
    pub cost_after: Cost,
}

/// An agent whose own value changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentChange {
    /// Agent id
    pub agent: AgentId,
    /// Context value
    pub value_before: Value,
    /// No-good value
    pub value_after: Value,
    /// Unary cost in the context
    pub unary_before: Cost,
    /// Unary cost in the no-good
    pub unary_after: Cost,
    /// Per-participant breakdown (meeting scheduling only)
    pub participants: Vec<ParticipantChange>,
}

impl AgentChange {
    /// Satisfaction trend implied by the unary cost change.
    pub fn trend(&self) -> SatisfactionTrend {
        if self.unary_after < self.unary_before {
            SatisfactionTrend::Increased
        } else if self.unary_after > self.unary_before {
            SatisfactionTrend::Reduced
        } else {
            SatisfactionTrend::Unchanged
        }
    }
}

/// Contrastive explanation of a context against its no-good
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationReport {
    /// Rendering mode
    pub mode: ExplainMode,
    /// Agents are meetings (affects naming only)
    pub meetings: bool,
    /// Assignment being explained
    pub context: Assignment,
    /// Global cost of the context
    pub context_global_cost: Cost,
    /// Counterfactual assignment
    pub no_good: Assignment,
    /// Global cost of the no-good
    pub no_good_global_cost: Cost,
    /// Edges with a changed endpoint, canonical order
    pub edge_changes: Vec<EdgeChange>,
    /// Agents with a changed value, ascending
    pub agent_changes: Vec<AgentChange>,
}

impl ExplanationReport {
    /// Extra cost the no-good pays over the context.
    pub fn cost_delta(&self) -> Cost {
        self.no_good_global_cost - self.context_global_cost
    }

    /// Render as text in the report's mode.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    fn name(&self, id: AgentId) -> String {
        if self.meetings {
            format!("Meeting_{id}")
        } else {
            format!("A_{id}")
        }
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "Context assignments:")?;
        for (id, value) in &self.context {
            writeln!(out, "    {} - {value}", self.name(*id))?;
        }
        writeln!(out)?;
        writeln!(out, "Context global cost is: {}", self.context_global_cost)?;
        writeln!(out)?;
        writeln!(out, "Alternative assignments:")?;
        for (id, value) in &self.no_good {
            writeln!(out, "    {} - {value}", self.name(*id))?;
        }
        writeln!(out)?;
        writeln!(out, "Alternative global cost is: {}", self.no_good_global_cost)?;
        writeln!(out)?;
        writeln!(
            out,
            "Therefore, the exceed cost compared to the context is: {}",
            self.cost_delta()
        )?;
        writeln!(out)?;
        writeln!(out, "Implicit constraints differences:")?;
        writeln!(out)?;

        match self.mode {
            ExplainMode::Technical => self.write_technical(out),
            ExplainMode::Narrative => self.write_narrative(out),
        }
    }

    fn write_technical(&self, out: &mut String) -> fmt::Result {
        for edge in &self.edge_changes {
            writeln!(
                out,
                "    Constraint of {} and {}:",
                self.name(edge.low),
                self.name(edge.high)
            )?;
            writeln!(out, "        Former implicit constraint {}", edge.cost_before)?;
            writeln!(out, "        Current implicit constraint {}", edge.cost_after)?;
            writeln!(out)?;
        }
        for agent in &self.agent_changes {
            writeln!(out, "    Unary constraint of {}:", self.name(agent.agent))?;
            writeln!(out, "        Former unary constraint {}", agent.unary_before)?;
            writeln!(out, "        Current unary constraint {}", agent.unary_after)?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_narrative(&self, out: &mut String) -> fmt::Result {
        for edge in &self.edge_changes {
            let shared = edge
                .shared_participants
                .iter()
                .map(|p| format!("Participant {p}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                out,
                "    Influence of the time slot change on the relationship between {} and {}:",
                self.name(edge.low),
                self.name(edge.high)
            )?;
            writeln!(out, "        {}", edge.overlap.story(&shared))?;
            writeln!(
                out,
                "        Constraint cost changed from {} to {}.",
                edge.cost_before, edge.cost_after
            )?;
            writeln!(out)?;
        }

        for agent in &self.agent_changes {
            let name = self.name(agent.agent);
            writeln!(
                out,
                "    Influence of the time slot change on the satisfaction of participants in {name}:"
            )?;
            for p in &agent.participants {
                let impact = if p.cost_after < p.cost_before {
                    format!("reduced from {} to {}", p.cost_before, p.cost_after)
                } else if p.cost_after > p.cost_before {
                    format!("increased from {} to {}", p.cost_before, p.cost_after)
                } else {
                    format!("remained the same at {}", p.cost_before)
                };
                writeln!(out, "        Participant {}: Cost {impact}", p.participant)?;
            }
            if agent.unary_before == agent.unary_after {
                writeln!(
                    out,
                    "        Total cost of {name} remained the same at {}.",
                    agent.unary_before
                )?;
            } else {
                writeln!(
                    out,
                    "        Total cost of {name} changed from {} to {} (lower is better).",
                    agent.unary_before, agent.unary_after
                )?;
            }
            writeln!(
                out,
                "        The overall satisfaction trend for {name} is: {}.",
                agent.trend()
            )?;
            writeln!(out)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExplanationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
