//! Domain-restriction categories for the counterfactual solve.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DcopError, Result};
use crate::graph::{AgentId, Assignment, ConstraintGraph, Value};

/// How an agent's domain is restricted before the no-good solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Category 1: only the context value
    FixedToContext,
    /// Category 2: anything but the context value
    ExcludeContext,
    /// Category 3: only the supplied (non-context) value
    FixedTo(Value),
    /// Category 4: the full domain
    Free,
}

impl Category {
    /// Category number, 1 to 4.
    pub fn number(&self) -> u8 {
        match self {
            Category::FixedToContext => 1,
            Category::ExcludeContext => 2,
            Category::FixedTo(_) => 3,
            Category::Free => 4,
        }
    }

    /// Restricted domain for an agent whose full domain is `original` and
    /// whose context value is `context_value`.
    pub fn restrict_domain(&self, original: &[Value], context_value: Value) -> Vec<Value> {
        match *self {
            Category::FixedToContext => vec![context_value],
            Category::ExcludeContext => original
                .iter()
                .copied()
                .filter(|&v| v != context_value)
                .collect(),
            Category::FixedTo(value) => vec![value],
            Category::Free => original.to_vec(),
        }
    }
}

/// Disjoint assignment of agents to categories.
///
/// Agents not listed anywhere are treated as [`Category::Free`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPartition {
    categories: BTreeMap<AgentId, Category>,
}

impl CategoryPartition {
    /// Build from the four category sets. Fails if an id is listed in more
    /// than one category.
    pub fn new(
        fixed_to_context: impl IntoIterator<Item = AgentId>,
        exclude_context: impl IntoIterator<Item = AgentId>,
        fixed_to: impl IntoIterator<Item = (AgentId, Value)>,
        free: impl IntoIterator<Item = AgentId>,
    ) -> Result<Self> {
        let mut partition = Self::default();
        for id in fixed_to_context {
            partition.insert(id, Category::FixedToContext)?;
        }
        for id in exclude_context {
            partition.insert(id, Category::ExcludeContext)?;
        }
        for (id, value) in fixed_to {
            partition.insert(id, Category::FixedTo(value))?;
        }
        for id in free {
            partition.insert(id, Category::Free)?;
        }
        Ok(partition)
    }

    /// Place `id` in `category`. Re-listing an id in the same category is a
    /// no-op; listing it in a different one is an error.
    pub fn insert(&mut self, id: AgentId, category: Category) -> Result<()> {
        match self.categories.get(&id) {
            Some(existing) if *existing == category => Ok(()),
            Some(existing) => Err(DcopError::OverlappingCategories {
                agent: id,
                first: existing.number(),
                second: category.number(),
            }),
            None => {
                self.categories.insert(id, category);
                Ok(())
            },
        }
    }

    /// Category of `id`, defaulting to free.
    pub fn category_of(&self, id: AgentId) -> Category {
        self.categories.get(&id).copied().unwrap_or(Category::Free)
    }

    /// Whether `id` was listed explicitly.
    pub fn is_listed(&self, id: AgentId) -> bool {
        self.categories.contains_key(&id)
    }

    /// Explicitly listed agents, ascending.
    pub fn listed(&self) -> impl Iterator<Item = (AgentId, Category)> + '_ {
        self.categories.iter().map(|(&id, &c)| (id, c))
    }

    /// Restricted domain of every agent in `graph`, given the context.
    ///
    /// Pure: neither the graph nor the agents are touched, so the same
    /// inputs always give the same domains.
    pub fn restricted_domains(
        &self,
        graph: &ConstraintGraph,
        context: &Assignment,
    ) -> Result<BTreeMap<AgentId, Vec<Value>>> {
        let mut domains = BTreeMap::new();
        for spec in graph.agents() {
            let context_value = context
                .get(&spec.id)
                .copied()
                .ok_or(DcopError::UnknownAgent(spec.id))?;
            let category = self.category_of(spec.id);
            let domain = category.restrict_domain(&spec.domain(), context_value);
            if domain.is_empty() {
                return Err(DcopError::Config(format!(
                    "Category {} leaves A_{} with an empty domain",
                    category.number(),
                    spec.id
                )));
            }
            domains.insert(spec.id, domain);
        }
        Ok(domains)
    }
}
