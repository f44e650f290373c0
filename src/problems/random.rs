//! Random-graph generators: uniform costs and graph coloring.

use rand::prelude::*;
use tracing::debug;

use super::{require_positive, seeded, ProblemKind};
use crate::config::ProblemConfig;
use crate::error::{DcopError, Result};
use crate::graph::{AgentId, ConstraintGraph, Cost, CONFLICT_PENALTY};

/// Random edges with uniform binary costs in `[0, max_cost]` and uniform
/// unary costs in `[0, max_unary_cost]`.
pub fn random_uniform(config: &ProblemConfig, dense: bool) -> Result<ConstraintGraph> {
    let kind = if dense {
        ProblemKind::DenseRandomUniform
    } else {
        ProblemKind::SparseRandomUniform
    };
    let density = checked_density(config, kind)?;
    if config.max_cost < 0 || config.max_unary_cost < 0 {
        return Err(DcopError::Config("Cost ceilings must be non-negative".to_string()));
    }

    let mut rng = seeded(config.seed);
    let d = config.domain_size;
    let mut builder = ConstraintGraph::builder(kind.display_name());
    for _ in 0..config.agents {
        let unary = (0..d).map(|_| rng.gen_range(0..=config.max_unary_cost)).collect();
        let initial = rng.gen_range(0..d);
        builder.add_agent(d, unary, initial);
    }

    for (a, b) in pairs(config.agents) {
        if rng.gen_bool(density) {
            let costs: Vec<Cost> = (0..d * d)
                .map(|_| rng.gen_range(0..=config.max_cost))
                .collect();
            builder.add_edge(a, b, |va, vb| costs[va * d + vb])?;
        }
    }

    let graph = builder.build()?;
    debug!(
        kind = %kind,
        agents = graph.agent_count(),
        edges = graph.edge_count(),
        "generated"
    );
    Ok(graph)
}

/// Random edges whose endpoints must take different colors.
pub fn graph_coloring(config: &ProblemConfig) -> Result<ConstraintGraph> {
    let kind = ProblemKind::GraphColoring;
    let density = checked_density(config, kind)?;

    let mut rng = seeded(config.seed);
    let d = config.domain_size;
    let mut builder = ConstraintGraph::builder(kind.display_name());
    for _ in 0..config.agents {
        let initial = rng.gen_range(0..d);
        builder.add_agent(d, vec![0; d], initial);
    }

    for (a, b) in pairs(config.agents) {
        if rng.gen_bool(density) {
            builder.add_must_differ(a, b, CONFLICT_PENALTY)?;
        }
    }

    let graph = builder.build()?;
    debug!(
        kind = %kind,
        agents = graph.agent_count(),
        edges = graph.edge_count(),
        "generated"
    );
    Ok(graph)
}

fn checked_density(config: &ProblemConfig, kind: ProblemKind) -> Result<f64> {
    require_positive(config.agents, "agents")?;
    require_positive(config.domain_size, "domain_size")?;
    let density = config.density.unwrap_or_else(|| kind.default_density());
    if !(0.0..=1.0).contains(&density) {
        return Err(DcopError::Config(format!(
            "density must be within [0, 1], got {density}"
        )));
    }
    Ok(density)
}

/// Every `(a, b)` with `1 <= a < b <= n`, in order.
fn pairs(n: usize) -> impl Iterator<Item = (AgentId, AgentId)> {
    let n = n as AgentId;
    (1..=n).flat_map(move |a| (a + 1..=n).map(move |b| (a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: ProblemKind, density: Option<f64>) -> ProblemConfig {
        ProblemConfig {
            kind,
            agents: 8,
            domain_size: 4,
            density,
            seed: 3,
            ..ProblemConfig::default()
        }
    }

    #[test]
    fn test_pairs() {
        assert_eq!(pairs(3).collect::<Vec<_>>(), vec![(1, 2), (1, 3), (2, 3)]);
        assert_eq!(pairs(1).count(), 0);
    }

    #[test]
    fn test_full_density_is_complete() {
        let graph = graph_coloring(&config(ProblemKind::GraphColoring, Some(1.0))).unwrap();
        assert_eq!(graph.edge_count(), 8 * 7 / 2);
        for spec in graph.agents() {
            assert!(spec.unary.iter().all(|&c| c == 0));
            assert!(spec.initial_value < 4);
        }
        assert_eq!(graph.binary_cost(1, 2, 5, 2).unwrap(), CONFLICT_PENALTY);
        assert_eq!(graph.binary_cost(1, 2, 5, 3).unwrap(), 0);
    }

    #[test]
    fn test_zero_density_has_no_edges() {
        let graph =
            random_uniform(&config(ProblemKind::SparseRandomUniform, Some(0.0)), false).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_uniform_costs_within_bounds() {
        let cfg = config(ProblemKind::DenseRandomUniform, Some(1.0));
        let graph = random_uniform(&cfg, true).unwrap();
        assert_eq!(graph.name(), "Dense Uniform");
        for spec in graph.agents() {
            assert!(spec
                .unary
                .iter()
                .all(|&c| (0..=cfg.max_unary_cost).contains(&c)));
        }
        for table in graph.edges() {
            for low in 0..4 {
                for high in 0..4 {
                    let c = table.get(low, high).unwrap();
                    assert!((0..=cfg.max_cost).contains(&c));
                }
            }
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut cfg = config(ProblemKind::GraphColoring, Some(1.5));
        assert!(graph_coloring(&cfg).is_err());
        cfg.density = None;
        cfg.agents = 0;
        assert!(graph_coloring(&cfg).is_err());
        cfg.agents = 3;
        cfg.max_cost = -1;
        assert!(random_uniform(&cfg, false).is_err());
    }
}
