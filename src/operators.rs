use crate::cgp::GridShape;
use crate::types::OperatorId;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Contract for the external operator catalogue.
///
/// The core never inspects what an operator does to an image — only its
/// input arity, parameter shape, and which grid columns it may occupy.
pub trait OperatorSet: Send + Sync {
    /// All valid operator identifiers.
    fn operator_ids(&self) -> &[OperatorId];

    /// Number of node inputs the operator consumes.
    fn input_count(&self, id: OperatorId) -> usize;

    /// Bounds for each real-valued parameter of the operator.
    fn parameter_bounds(&self, id: OperatorId) -> &[RangeInclusive<f64>];

    /// Operators allowed in the given grid column.
    fn valid_operators_for_column(&self, column: usize) -> &[OperatorId];

    /// Called once when the set is bound to a grid, before any lookup.
    fn initialize(&mut self, shape: &GridShape) {
        let _ = shape;
    }
}

/// Static description of one operator.
#[derive(Debug, Clone)]
pub struct OperatorSpec {
    pub id: OperatorId,
    pub input_count: usize,
    pub parameter_bounds: Vec<RangeInclusive<f64>>,
}

impl OperatorSpec {
    pub fn new(id: OperatorId, input_count: usize, parameter_bounds: Vec<RangeInclusive<f64>>) -> Self {
        Self {
            id,
            input_count,
            parameter_bounds,
        }
    }
}

/// Table-driven [`OperatorSet`]: all lookups go through indexes built once
/// at construction/initialization time and treated as immutable afterwards.
pub struct LookupOperatorSet {
    ids: Vec<OperatorId>,
    specs: Vec<OperatorSpec>,
    index: HashMap<OperatorId, usize>,
    /// Explicit per-column restrictions; columns without an entry get the
    /// full set.
    column_overrides: HashMap<usize, Vec<OperatorId>>,
    /// Resolved per-column table, filled by `initialize`.
    columns: Vec<Vec<OperatorId>>,
}

impl LookupOperatorSet {
    pub fn new(specs: Vec<OperatorSpec>) -> Self {
        let ids: Vec<OperatorId> = specs.iter().map(|s| s.id).collect();
        let index = specs.iter().enumerate().map(|(i, s)| (s.id, i)).collect();
        Self {
            ids,
            specs,
            index,
            column_overrides: HashMap::new(),
            columns: Vec::new(),
        }
    }

    /// Restrict a column to a subset of operators.
    pub fn with_column_operators(mut self, column: usize, operators: Vec<OperatorId>) -> Self {
        self.column_overrides.insert(column, operators);
        self
    }

    fn spec(&self, id: OperatorId) -> &OperatorSpec {
        let idx = *self
            .index
            .get(&id)
            .unwrap_or_else(|| panic!("unknown operator id {id}"));
        &self.specs[idx]
    }
}

impl OperatorSet for LookupOperatorSet {
    fn operator_ids(&self) -> &[OperatorId] {
        &self.ids
    }

    fn input_count(&self, id: OperatorId) -> usize {
        self.spec(id).input_count
    }

    fn parameter_bounds(&self, id: OperatorId) -> &[RangeInclusive<f64>] {
        &self.spec(id).parameter_bounds
    }

    fn valid_operators_for_column(&self, column: usize) -> &[OperatorId] {
        self.columns.get(column).map_or(&self.ids, Vec::as_slice)
    }

    fn initialize(&mut self, shape: &GridShape) {
        self.columns = (0..shape.columns)
            .map(|c| {
                self.column_overrides
                    .get(&c)
                    .cloned()
                    .unwrap_or_else(|| self.ids.clone())
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> GridShape {
        GridShape {
            rows: 2,
            columns: 3,
            levels_back: 1,
            input_count: 1,
            output_count: 1,
        }
    }

    fn sample_set() -> LookupOperatorSet {
        LookupOperatorSet::new(vec![
            OperatorSpec::new(0, 1, vec![0.0..=1.0]),
            OperatorSpec::new(1, 2, vec![]),
            OperatorSpec::new(7, 1, vec![0.0..=255.0, -1.0..=1.0]),
        ])
    }

    #[test]
    fn test_lookup_by_id() {
        let set = sample_set();
        assert_eq!(set.operator_ids(), &[0, 1, 7]);
        assert_eq!(set.input_count(7), 1);
        assert_eq!(set.parameter_bounds(7).len(), 2);
        assert_eq!(set.input_count(1), 2);
    }

    #[test]
    fn test_column_overrides() {
        let mut set = sample_set().with_column_operators(1, vec![1]);
        set.initialize(&shape());
        assert_eq!(set.valid_operators_for_column(0), &[0, 1, 7]);
        assert_eq!(set.valid_operators_for_column(1), &[1]);
        assert_eq!(set.valid_operators_for_column(2), &[0, 1, 7]);
    }

    #[test]
    #[should_panic(expected = "unknown operator id")]
    fn test_unknown_id_panics() {
        sample_set().input_count(99);
    }
}
