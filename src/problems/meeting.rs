//! Meeting scheduling: meetings are agents, time slots are values.
//!
//! Participants attend `meetings_per_agent` meetings each; every meeting has at
//! least `min_participants`. A meeting's unary cost for a slot is the sum of its
//! participants' preference costs for that slot, and two meetings sharing a
//! participant may not take the same slot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{require_positive, seeded, ProblemKind};
use crate::config::ProblemConfig;
use crate::error::{DcopError, Result};
use crate::graph::{AgentId, ConstraintGraph, Cost, ParticipantId, CONFLICT_PENALTY};

/// Who attends which meeting, and what every participant prefers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingScenario {
    /// Number of participants
    pub participants: usize,
    /// Meetings each participant attends
    pub meetings_per_agent: usize,
    /// Minimum participants per meeting
    pub min_participants: usize,
    /// Number of time slots
    pub time_slots: usize,
    /// Participants of every meeting
    pub meeting_participants: BTreeMap<AgentId, BTreeSet<ParticipantId>>,
    /// Per-slot preference cost of every participant (lower is better)
    pub preferences: BTreeMap<ParticipantId, Vec<Cost>>,
}

impl MeetingScenario {
    /// Number of meetings
    pub fn meetings(&self) -> usize {
        self.meeting_participants.len()
    }

    /// Meetings `participant` attends, ascending.
    pub fn meetings_of(&self, participant: ParticipantId) -> Vec<AgentId> {
        self.meeting_participants
            .iter()
            .filter(|(_, members)| members.contains(&participant))
            .map(|(&meeting, _)| meeting)
            .collect()
    }
}

impl fmt::Display for MeetingScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario Details:")?;
        writeln!(f, "------------------")?;
        writeln!(
            f,
            "There are {} meetings to be scheduled, with a total of {} participants involved.",
            self.meetings(),
            self.participants
        )?;
        writeln!(
            f,
            "Each participant attends {} meetings.",
            self.meetings_per_agent
        )?;
        writeln!(
            f,
            "Each meeting must have at least {} participants.",
            self.min_participants
        )?;
        writeln!(f, "There are {} available time slots.", self.time_slots)?;
        writeln!(f)?;
        writeln!(f, "Meeting Participants:")?;
        for (meeting, members) in &self.meeting_participants {
            let list = members
                .iter()
                .map(|p| format!("Participant {p}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "  - Meeting {meeting}: {list}")?;
        }
        writeln!(f)?;
        writeln!(f, "Lower preference cost means higher satisfaction.")?;
        writeln!(f)?;
        writeln!(f, "Participant Preferences:")?;
        writeln!(f, "------------------------")?;
        for (participant, prefs) in &self.preferences {
            let list = prefs
                .iter()
                .enumerate()
                .map(|(slot, cost)| format!("Slot {slot}: {cost}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "  - Participant {participant}: {list}")?;
        }
        Ok(())
    }
}

/// Generate a meeting-scheduling instance.
///
/// `config.agents` is the number of participants, `config.meetings` the number
/// of meetings, and `config.domain_size` the number of time slots.
pub fn meeting_scheduling(config: &ProblemConfig) -> Result<(ConstraintGraph, MeetingScenario)> {
    let participants = config.agents;
    let meetings = config.meetings;
    let per_agent = config.meetings_per_agent;
    let minimum = config.min_participants;
    let slots = config.domain_size;

    require_positive(participants, "agents")?;
    require_positive(meetings, "meetings")?;
    require_positive(slots, "domain_size")?;
    if participants * per_agent < meetings * minimum {
        return Err(DcopError::Config(format!(
            "Not enough participants: {participants} x {per_agent} seats for {meetings} meetings \
             of at least {minimum}"
        )));
    }
    if per_agent > meetings {
        return Err(DcopError::Config(format!(
            "meetings_per_agent ({per_agent}) exceeds the number of meetings ({meetings})"
        )));
    }
    if minimum > participants {
        return Err(DcopError::Config(format!(
            "min_participants ({minimum}) exceeds the number of participants ({participants})"
        )));
    }
    if config.max_preference_cost < 0 {
        return Err(DcopError::Config(
            "max_preference_cost must be non-negative".to_string(),
        ));
    }

    let mut rng = seeded(config.seed);

    let mut placement = None;
    for attempt in 1..=config.max_assignment_attempts {
        if let Some(found) = Placement::minimum(&mut rng, participants, meetings, per_agent, minimum)
        {
            debug!(attempt, "minimum participants placed");
            placement = Some(found);
            break;
        }
    }
    let mut placement = placement.ok_or_else(|| {
        DcopError::Config(format!(
            "Could not place minimum participants in {} attempts",
            config.max_assignment_attempts
        ))
    })?;
    placement.top_up(&mut rng, participants, meetings, per_agent)?;

    let preferences: BTreeMap<ParticipantId, Vec<Cost>> = (1..=participants as ParticipantId)
        .map(|p| {
            let prefs = (0..slots)
                .map(|_| rng.gen_range(0..=config.max_preference_cost))
                .collect();
            (p, prefs)
        })
        .collect();

    let mut builder = ConstraintGraph::builder(ProblemKind::MeetingScheduling.display_name());
    for members in placement.meeting_participants.values() {
        let costs = members
            .iter()
            .filter_map(|p| preferences.get(p).map(|prefs| (*p, prefs.clone())))
            .collect();
        let initial = rng.gen_range(0..slots);
        builder.add_meeting(slots, costs, initial);
    }

    let roster: Vec<(AgentId, &BTreeSet<ParticipantId>)> = placement
        .meeting_participants
        .iter()
        .map(|(&m, members)| (m, members))
        .collect();
    for (i, (a, members_a)) in roster.iter().enumerate() {
        for (b, members_b) in &roster[i + 1..] {
            if !members_a.is_disjoint(members_b) {
                builder.add_must_differ(*a, *b, CONFLICT_PENALTY)?;
            }
        }
    }
    let graph = builder.build()?;

    debug!(
        meetings = graph.agent_count(),
        edges = graph.edge_count(),
        participants,
        "generated"
    );

    let scenario = MeetingScenario {
        participants,
        meetings_per_agent: per_agent,
        min_participants: minimum,
        time_slots: slots,
        meeting_participants: placement.meeting_participants,
        preferences,
    };
    Ok((graph, scenario))
}

#[derive(Debug, Default)]
struct Placement {
    meeting_participants: BTreeMap<AgentId, BTreeSet<ParticipantId>>,
    participant_meetings: BTreeMap<ParticipantId, BTreeSet<AgentId>>,
}

impl Placement {
    fn empty(participants: usize, meetings: usize) -> Self {
        Self {
            meeting_participants: (1..=meetings as AgentId)
                .map(|m| (m, BTreeSet::new()))
                .collect(),
            participant_meetings: (1..=participants as ParticipantId)
                .map(|p| (p, BTreeSet::new()))
                .collect(),
        }
    }

    /// Fill every meeting up to `minimum` participants, or `None` on a dead end.
    fn minimum(
        rng: &mut ChaCha8Rng,
        participants: usize,
        meetings: usize,
        per_agent: usize,
        minimum: usize,
    ) -> Option<Self> {
        let mut placement = Self::empty(participants, meetings);
        for meeting in 1..=meetings as AgentId {
            while placement.size(meeting) < minimum {
                let available: Vec<ParticipantId> = (1..=participants as ParticipantId)
                    .filter(|&p| placement.load(p) < per_agent && !placement.attends(p, meeting))
                    .collect();
                let &chosen = available.choose(rng)?;
                placement.add(chosen, meeting);
            }
        }
        Some(placement)
    }

    /// Add participants to meetings until each attends `per_agent`.
    fn top_up(
        &mut self,
        rng: &mut ChaCha8Rng,
        participants: usize,
        meetings: usize,
        per_agent: usize,
    ) -> Result<()> {
        for p in 1..=participants as ParticipantId {
            while self.load(p) < per_agent {
                let available: Vec<AgentId> = (1..=meetings as AgentId)
                    .filter(|&m| self.size(m) < participants && !self.attends(p, m))
                    .collect();
                let &chosen = available.choose(rng).ok_or_else(|| {
                    DcopError::Config(format!("No meeting left for participant {p}"))
                })?;
                self.add(p, chosen);
            }
        }
        Ok(())
    }

    fn size(&self, meeting: AgentId) -> usize {
        self.meeting_participants.get(&meeting).map_or(0, BTreeSet::len)
    }

    fn load(&self, participant: ParticipantId) -> usize {
        self.participant_meetings
            .get(&participant)
            .map_or(0, BTreeSet::len)
    }

    fn attends(&self, participant: ParticipantId, meeting: AgentId) -> bool {
        self.meeting_participants
            .get(&meeting)
            .is_some_and(|members| members.contains(&participant))
    }

    fn add(&mut self, participant: ParticipantId, meeting: AgentId) {
        self.meeting_participants
            .entry(meeting)
            .or_default()
            .insert(participant);
        self.participant_meetings
            .entry(participant)
            .or_default()
            .insert(meeting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProblemConfig {
        ProblemConfig {
            agents: 10,
            meetings: 8,
            meetings_per_agent: 2,
            min_participants: 2,
            domain_size: 5,
            seed: 11,
            ..ProblemConfig::default()
        }
    }

    #[test]
    fn test_participation_counts() {
        let cfg = config();
        let (_, scenario) = meeting_scheduling(&cfg).unwrap();
        assert_eq!(scenario.meetings(), 8);
        for members in scenario.meeting_participants.values() {
            assert!(members.len() >= cfg.min_participants);
        }
        for p in 1..=10 {
            assert_eq!(scenario.meetings_of(p).len(), cfg.meetings_per_agent);
        }
    }

    #[test]
    fn test_unary_is_sum_of_preferences() {
        let (graph, scenario) = meeting_scheduling(&config()).unwrap();
        for spec in graph.agents() {
            let members = &scenario.meeting_participants[&spec.id];
            assert_eq!(
                spec.participants.keys().copied().collect::<BTreeSet<_>>(),
                *members
            );
            for slot in 0..5 {
                let expected: Cost = members
                    .iter()
                    .map(|p| scenario.preferences[p][slot])
                    .sum();
                assert_eq!(spec.unary[slot], expected);
            }
        }
    }

    #[test]
    fn test_edges_follow_shared_participants() {
        let (graph, _) = meeting_scheduling(&config()).unwrap();
        for a in 1..=8 {
            for b in (a + 1)..=8 {
                let shared = !graph.shared_participants(a, b).unwrap().is_empty();
                assert_eq!(graph.table(a, b).is_some(), shared);
                if shared {
                    assert_eq!(graph.binary_cost(a, 3, b, 3).unwrap(), CONFLICT_PENALTY);
                    assert_eq!(graph.binary_cost(a, 3, b, 4).unwrap(), 0);
                }
            }
        }
    }

    #[test]
    fn test_infeasible_parameters_fail_fast() {
        let mut cfg = config();
        cfg.agents = 3;
        assert!(matches!(meeting_scheduling(&cfg), Err(DcopError::Config(_))));

        let mut cfg = config();
        cfg.meetings = 2;
        cfg.meetings_per_agent = 3;
        assert!(matches!(meeting_scheduling(&cfg), Err(DcopError::Config(_))));
    }

    #[test]
    fn test_scenario_description() {
        let (_, scenario) = meeting_scheduling(&config()).unwrap();
        let text = scenario.to_string();
        assert!(text.starts_with("Scenario Details:"));
        assert!(text.contains("There are 8 meetings to be scheduled"));
        assert!(text.contains("  - Meeting 1: Participant "));
        assert!(text.contains("  - Participant 10: Slot 0: "));
    }
}
