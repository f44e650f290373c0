//! End-to-end solve and explain tests.
//!
//! These tests drive the public API the way the CLI does: build or generate
//! an instance, solve it, then ask for a contrastive explanation.

use std::collections::BTreeMap;

use dcop::explain::{ExplanationStage, OverlapChange, SatisfactionTrend};
use dcop::{
    generate, Assignment, ConstraintGraph, Dcop, DcopError, ExplainMode, Explanation,
    ProblemConfig, ProblemKind, SolverConfig, CONFLICT_PENALTY,
};

fn must_differ_cycle() -> ConstraintGraph {
    let mut builder = ConstraintGraph::builder("3-cycle");
    let a = builder.add_agent(2, vec![0, 1], 0);
    let b = builder.add_agent(2, vec![0, 2], 0);
    let c = builder.add_agent(2, vec![0, 3], 0);
    builder.add_must_differ(a, b, CONFLICT_PENALTY).unwrap();
    builder.add_must_differ(b, c, CONFLICT_PENALTY).unwrap();
    builder.add_must_differ(c, a, CONFLICT_PENALTY).unwrap();
    builder.build().unwrap()
}

fn violated_edges(graph: &ConstraintGraph, assignment: &Assignment) -> usize {
    graph
        .edges()
        .iter()
        .filter(|table| {
            let (low, high) = table.endpoints();
            assignment[&low] == assignment[&high]
        })
        .count()
}

/// A triangle with two colors cannot be satisfied; MGM settles with one clash
#[test]
fn test_three_cycle_settles_with_one_violation() {
    let graph = must_differ_cycle();
    let mut dcop = Dcop::new(graph.clone(), SolverConfig::default()).unwrap();
    let summary = dcop.execute().unwrap();

    assert_eq!(violated_edges(&graph, &dcop.assignment()), 1);
    assert_eq!(summary.final_cost, CONFLICT_PENALTY + 1);

    // Same start, same result
    let mut again = Dcop::new(graph, SolverConfig::default()).unwrap();
    again.execute().unwrap();
    assert_eq!(again.assignment(), dcop.assignment());
    assert_eq!(again.history(), dcop.history());
}

/// Forcing the cheapest agent off its value costs more than the context
#[test]
fn test_three_cycle_explanation() {
    let mut dcop = Dcop::new(must_differ_cycle(), SolverConfig::default()).unwrap();
    dcop.execute().unwrap();
    let context = dcop.assignment();

    let mut explanation = Explanation::from_sets(&mut dcop, [], [1], [], [2, 3]).unwrap();
    assert_eq!(explanation.context(), &context);
    explanation.update_agents_before_generate_no_good().unwrap();
    explanation.generate_no_good().unwrap();
    assert_eq!(explanation.stage(), ExplanationStage::Generated);

    let no_good = explanation.no_good().unwrap().clone();
    assert_ne!(no_good[&1], context[&1]);

    let report = explanation.explain(ExplainMode::Technical).unwrap();
    let graph = explanation.dcop().graph();
    assert_eq!(
        report.no_good_global_cost,
        graph.global_cost(&no_good).unwrap()
    );
    assert_eq!(
        report.context_global_cost,
        graph.global_cost(&context).unwrap()
    );
    assert!(report.cost_delta() >= 0);

    // Every reported edge has a changed endpoint, and every changed edge is reported
    let changed: Vec<_> = graph
        .edges()
        .iter()
        .map(|t| t.endpoints())
        .filter(|(l, h)| context[l] != no_good[l] || context[h] != no_good[h])
        .collect();
    let reported: Vec<_> = report.edge_changes.iter().map(|e| (e.low, e.high)).collect();
    assert_eq!(reported, changed);

    let text = report.render();
    assert!(text.contains("Context assignments:"));
    assert!(text.contains("Alternative assignments:"));
    assert!(text.contains("A_1"));
}

/// Two meetings sharing a participant stop overlapping when one moves
#[test]
fn test_meeting_overlap_resolved() {
    let mut builder = ConstraintGraph::builder("two meetings");
    let a = builder.add_meeting(3, BTreeMap::from([(7, vec![100, 0, 100])]), 1);
    let b = builder.add_meeting(3, BTreeMap::from([(7, vec![100, 0, 50])]), 1);
    builder.add_edge(a, b, |x, y| if x == y { 10 } else { 0 }).unwrap();
    let mut dcop = Dcop::new(builder.build().unwrap(), SolverConfig::default()).unwrap();
    dcop.execute().unwrap();

    let mut explanation = Explanation::from_sets(&mut dcop, [a], [b], [], []).unwrap();
    explanation.update_agents_before_generate_no_good().unwrap();
    explanation.generate_no_good().unwrap();

    let report = explanation.explain(ExplainMode::Narrative).unwrap();
    assert_eq!(report.context, Assignment::from([(1, 1), (2, 1)]));
    assert_eq!(report.no_good, Assignment::from([(1, 1), (2, 2)]));
    assert_eq!(report.edge_changes.len(), 1);
    assert_eq!(
        report.edge_changes[0].overlap,
        OverlapChange::NoLongerOverlapping
    );
    assert_eq!(report.agent_changes[0].trend(), SatisfactionTrend::Reduced);

    let text = report.render();
    assert!(text.contains("Meeting_1 and Meeting_2"));
    assert!(text.contains("Mutual participants (Participant 7) can now attend both meetings."));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["edge_changes"][0]["overlap"], "no_longer_overlapping");
}

/// Generated meeting scheduling: exclude one meeting's slot and explain
#[test]
fn test_generated_meetings_explained() {
    let config = ProblemConfig {
        kind: ProblemKind::MeetingScheduling,
        agents: 10,
        meetings: 8,
        domain_size: 5,
        seed: 2024,
        ..ProblemConfig::default()
    };
    let problem = generate(&config).unwrap();
    let scenario = problem.scenario.unwrap();
    assert_eq!(scenario.meetings(), 8);

    let mut dcop = Dcop::new(problem.graph, SolverConfig::default()).unwrap();
    dcop.execute().unwrap();
    let context = dcop.assignment();

    let fixed: Vec<u32> = (3..=8).collect();
    let mut explanation = Explanation::from_sets(&mut dcop, fixed, [1], [], [2]).unwrap();
    explanation.update_agents_before_generate_no_good().unwrap();
    explanation.generate_no_good().unwrap();

    let no_good = explanation.no_good().unwrap();
    assert_ne!(no_good[&1], context[&1]);
    for id in 3..=8 {
        assert_eq!(no_good[&id], context[&id]);
    }

    let report = explanation.explain(ExplainMode::Narrative).unwrap();
    assert!(report.meetings);
    for change in &report.agent_changes {
        let total_before: i64 = change.participants.iter().map(|p| p.cost_before).sum();
        let total_after: i64 = change.participants.iter().map(|p| p.cost_after).sum();
        assert_eq!(total_before, change.unary_before);
        assert_eq!(total_after, change.unary_after);
    }
    assert_eq!(
        report,
        explanation.explain(ExplainMode::Narrative).unwrap()
    );
}

/// Explanation steps must run in order
#[test]
fn test_out_of_order_steps_rejected() {
    let mut dcop = Dcop::new(must_differ_cycle(), SolverConfig::default()).unwrap();
    assert!(matches!(
        Explanation::from_sets(&mut dcop, [1], [], [], []),
        Err(DcopError::Sequencing(_))
    ));

    dcop.execute().unwrap();
    let mut explanation = Explanation::from_sets(&mut dcop, [1], [], [], []).unwrap();
    assert!(matches!(
        explanation.explain(ExplainMode::Technical),
        Err(DcopError::Sequencing(_))
    ));
    assert!(matches!(
        explanation.generate_no_good(),
        Err(DcopError::Sequencing(_))
    ));
}
