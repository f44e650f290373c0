//! Binary cost tables keyed in canonical agent order.
//!
//! A table belongs to exactly one edge and is shared (via `Arc`) by both
//! endpoints. Values are stored as a dense row-major matrix indexed by
//! `(low-id value, high-id value)`, so the key order cannot be confused by
//! construction: callers either pass canonical values to [`CostTable::get`] or
//! let [`CostTable::cost_between`] reorder them.

use crate::error::{DcopError, Result};

use super::{AgentId, Cost, Value};

/// Cost penalty for equal values on a must-differ edge.
pub const CONFLICT_PENALTY: Cost = 100;

/// Dense binary cost matrix for one undirected edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostTable {
    low: AgentId,
    high: AgentId,
    low_size: usize,
    high_size: usize,
    costs: Vec<Cost>,
}

impl CostTable {
    /// Build a table by evaluating `cost` over every value pair.
    ///
    /// `cost` receives `(value of a, value of b)` in the argument order given
    /// here; the table itself is always stored smaller-id first.
    pub fn from_fn<F>(a: AgentId, a_size: usize, b: AgentId, b_size: usize, cost: F) -> Self
    where
        F: Fn(Value, Value) -> Cost,
    {
        let (low, low_size, high, high_size) = if a < b {
            (a, a_size, b, b_size)
        } else {
            (b, b_size, a, a_size)
        };

        let mut costs = Vec::with_capacity(low_size * high_size);
        for low_value in 0..low_size {
            for high_value in 0..high_size {
                let c = if a < b {
                    cost(low_value, high_value)
                } else {
                    cost(high_value, low_value)
                };
                costs.push(c);
            }
        }

        Self {
            low,
            high,
            low_size,
            high_size,
            costs,
        }
    }

    /// Must-differ table: `0` when values differ, `penalty` when equal.
    pub fn must_differ(a: AgentId, b: AgentId, domain_size: usize, penalty: Cost) -> Self {
        Self::from_fn(a, domain_size, b, domain_size, |va, vb| {
            if va == vb {
                penalty
            } else {
                0
            }
        })
    }

    /// Edge endpoints as `(smaller id, larger id)`.
    pub fn endpoints(&self) -> (AgentId, AgentId) {
        (self.low, self.high)
    }

    /// The endpoint opposite to `agent`, if `agent` is an endpoint.
    pub fn other(&self, agent: AgentId) -> Option<AgentId> {
        if agent == self.low {
            Some(self.high)
        } else if agent == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    /// Canonical lookup: the smaller id's value first.
    pub fn get(&self, low_value: Value, high_value: Value) -> Result<Cost> {
        if low_value >= self.low_size || high_value >= self.high_size {
            return Err(self.missing(low_value, high_value));
        }
        Ok(self.costs[low_value * self.high_size + high_value])
    }

    /// Lookup from the point of view of `agent` holding `value` against
    /// `other` holding `other_value`. Reorders into canonical key order.
    pub fn cost_between(
        &self,
        agent: AgentId,
        value: Value,
        other: AgentId,
        other_value: Value,
    ) -> Result<Cost> {
        if agent == self.low && other == self.high {
            self.get(value, other_value)
        } else if agent == self.high && other == self.low {
            self.get(other_value, value)
        } else {
            Err(DcopError::MissingCost {
                low: agent.min(other),
                low_value: if agent < other { value } else { other_value },
                high: agent.max(other),
                high_value: if agent < other { other_value } else { value },
            })
        }
    }

    fn missing(&self, low_value: Value, high_value: Value) -> DcopError {
        DcopError::MissingCost {
            low: self.low,
            low_value,
            high: self.high,
            high_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_independent_of_construction() {
        let forward = CostTable::from_fn(2, 3, 5, 2, |va, vb| (va * 10 + vb) as Cost);
        let reverse = CostTable::from_fn(5, 2, 2, 3, |vb, va| (va * 10 + vb) as Cost);
        assert_eq!(forward, reverse);
        assert_eq!(forward.endpoints(), (2, 5));
        assert_eq!(forward.get(2, 1).unwrap(), 21);
    }

    #[test]
    fn test_cost_between_reorders() {
        let table = CostTable::from_fn(1, 3, 4, 3, |v1, v4| (v1 * 10 + v4) as Cost);
        assert_eq!(table.cost_between(1, 2, 4, 0).unwrap(), 20);
        assert_eq!(table.cost_between(4, 0, 1, 2).unwrap(), 20);
    }

    #[test]
    fn test_out_of_range_is_missing_cost() {
        let table = CostTable::must_differ(1, 2, 2, CONFLICT_PENALTY);
        assert!(matches!(
            table.get(2, 0),
            Err(DcopError::MissingCost { low: 1, low_value: 2, .. })
        ));
    }

    #[test]
    fn test_foreign_agent_is_missing_cost() {
        let table = CostTable::must_differ(1, 2, 2, CONFLICT_PENALTY);
        assert!(table.cost_between(1, 0, 3, 0).is_err());
        assert_eq!(table.other(2), Some(1));
        assert_eq!(table.other(3), None);
    }

    #[test]
    fn test_must_differ() {
        let table = CostTable::must_differ(3, 1, 3, 7);
        assert_eq!(table.get(1, 1).unwrap(), 7);
        assert_eq!(table.get(0, 2).unwrap(), 0);
    }
}
