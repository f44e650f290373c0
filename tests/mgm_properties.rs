//! Property tests for the MGM round loop over generated instances.

use dcop::{generate, ConstraintGraph, Dcop, ProblemConfig, ProblemKind, SolverConfig};
use proptest::prelude::*;

fn instance_strategy() -> impl Strategy<Value = ProblemConfig> {
    let kind = prop_oneof![
        Just(ProblemKind::SparseRandomUniform),
        Just(ProblemKind::DenseRandomUniform),
        Just(ProblemKind::GraphColoring),
        Just(ProblemKind::MeetingScheduling),
    ];
    (kind, any::<u64>(), 2usize..9, 2usize..5, prop::option::of(0.0f64..=1.0)).prop_map(
        |(kind, seed, agents, domain_size, density)| ProblemConfig {
            kind,
            seed,
            agents,
            domain_size,
            density,
            meetings: agents / 2 + 1,
            meetings_per_agent: 2,
            min_participants: 2,
            ..ProblemConfig::default()
        },
    )
}

fn solve(config: &ProblemConfig) -> (ConstraintGraph, Dcop) {
    let graph = generate(config)
        .unwrap_or_else(|e| panic!("generation failed for {config:?}: {e}"))
        .graph;
    let mut dcop = Dcop::new(graph.clone(), SolverConfig::default()).unwrap();
    dcop.execute()
        .unwrap_or_else(|e| panic!("no convergence for {config:?}: {e}"));
    (graph, dcop)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn global_cost_never_increases(config in instance_strategy()) {
        let (graph, dcop) = solve(&config);
        let mut previous = graph.global_cost(&graph.initial_assignment()).unwrap();
        for record in dcop.history() {
            prop_assert!(record.global_cost <= previous);
            previous = record.global_cost;
        }
        prop_assert_eq!(previous, dcop.global_cost().unwrap());
    }

    #[test]
    fn converges_with_a_quiet_final_round(config in instance_strategy()) {
        let (_, dcop) = solve(&config);
        prop_assert!(dcop.is_converged());
        let last = dcop.history().last().unwrap();
        prop_assert!(last.commits.is_empty());
        prop_assert!(dcop.history()[..dcop.history().len() - 1]
            .iter()
            .all(|r| !r.commits.is_empty()));
    }

    #[test]
    fn neighbors_never_commit_together(config in instance_strategy()) {
        let (graph, dcop) = solve(&config);
        for record in dcop.history() {
            for (i, &a) in record.commits.iter().enumerate() {
                for &b in &record.commits[i + 1..] {
                    prop_assert!(
                        graph.table(a, b).is_none(),
                        "A_{} and A_{} both committed in round {}",
                        a,
                        b,
                        record.round
                    );
                }
            }
        }
    }

    #[test]
    fn every_value_stays_in_domain(config in instance_strategy()) {
        let (graph, dcop) = solve(&config);
        for (id, value) in dcop.assignment() {
            prop_assert!(value < graph.agent(id).unwrap().domain_size);
        }
    }
}
