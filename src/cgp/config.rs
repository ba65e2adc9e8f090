use crate::error::{EvoVisionError, Result};
use crate::operators::OperatorSet;
use crate::types::{NodeId, OperatorId};
use serde::{Deserialize, Serialize};

/// Shape of the CGP grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: usize,
    pub columns: usize,
    /// Maximum column distance a connection may reach backward.
    pub levels_back: usize,
    /// Number of program inputs.
    pub input_count: usize,
    /// Number of program outputs.
    pub output_count: usize,
}

impl GridShape {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(EvoVisionError::Configuration(
                "grid must have at least one row and one column".to_string(),
            ));
        }
        if self.levels_back == 0 {
            return Err(EvoVisionError::Configuration(
                "levels_back must be at least 1".to_string(),
            ));
        }
        if self.input_count == 0 || self.output_count == 0 {
            return Err(EvoVisionError::Configuration(
                "program must have at least one input and one output".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable CGP configuration: grid shape plus exactly one bound operator
/// set. Per-column valid-operator lists and the gene layout are derived once
/// at construction and cached.
///
/// Gene layout per computational node: `[operator_id, connection * max_arity,
/// parameter * parameter_count]`; output-selection genes sit at the tail of
/// the genome. Node ids: program inputs are `0..input_count`, the node at
/// (column, row) is `input_count + column * rows + row`.
pub struct CgpConfig {
    shape: GridShape,
    operators: Box<dyn OperatorSet>,
    column_operators: Vec<Vec<OperatorId>>,
    max_arity: usize,
    parameter_count: usize,
}

impl CgpConfig {
    pub fn new(shape: GridShape, mut operators: Box<dyn OperatorSet>) -> Result<Self> {
        shape.validate()?;
        operators.initialize(&shape);

        let ids = operators.operator_ids().to_vec();
        if ids.is_empty() {
            return Err(EvoVisionError::Configuration(
                "operator set is empty".to_string(),
            ));
        }
        let max_arity = ids
            .iter()
            .map(|&id| operators.input_count(id))
            .max()
            .unwrap_or(0);
        if max_arity == 0 {
            return Err(EvoVisionError::Configuration(
                "at least one operator must consume an input".to_string(),
            ));
        }
        let parameter_count = ids
            .iter()
            .map(|&id| operators.parameter_bounds(id).len())
            .max()
            .unwrap_or(0);

        let column_operators: Vec<Vec<OperatorId>> = (0..shape.columns)
            .map(|c| operators.valid_operators_for_column(c).to_vec())
            .collect();
        for (column, ops) in column_operators.iter().enumerate() {
            if ops.is_empty() {
                return Err(EvoVisionError::Configuration(format!(
                    "no valid operators for column {column}"
                )));
            }
        }

        Ok(Self {
            shape,
            operators,
            column_operators,
            max_arity,
            parameter_count,
        })
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn operators(&self) -> &dyn OperatorSet {
        self.operators.as_ref()
    }

    pub fn max_arity(&self) -> usize {
        self.max_arity
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Genes per computational node: operator id + connections + parameters.
    pub fn genes_per_node(&self) -> usize {
        1 + self.max_arity + self.parameter_count
    }

    pub fn genome_length(&self) -> usize {
        self.shape.rows * self.shape.columns * self.genes_per_node() + self.shape.output_count
    }

    /// Total addressable node ids: program inputs plus grid nodes.
    pub fn node_count(&self) -> usize {
        self.shape.input_count + self.shape.rows * self.shape.columns
    }

    pub fn is_program_input(&self, node: NodeId) -> bool {
        node < self.shape.input_count
    }

    pub fn node_id(&self, column: usize, row: usize) -> NodeId {
        self.shape.input_count + column * self.shape.rows + row
    }

    /// Column of a computational node; None for program inputs.
    pub fn column_of(&self, node: NodeId) -> Option<usize> {
        if self.is_program_input(node) {
            None
        } else {
            Some((node - self.shape.input_count) / self.shape.rows)
        }
    }

    /// Offset of a computational node's first gene.
    pub fn node_gene_offset(&self, node: NodeId) -> usize {
        debug_assert!(!self.is_program_input(node));
        (node - self.shape.input_count) * self.genes_per_node()
    }

    /// Offset of the first output-selection gene.
    pub fn output_gene_offset(&self) -> usize {
        self.shape.rows * self.shape.columns * self.genes_per_node()
    }

    /// Cached valid operators for a column.
    pub fn valid_operators(&self, column: usize) -> &[OperatorId] {
        &self.column_operators[column]
    }

    /// Whether `source` is a legal connection target for a node in `column`:
    /// a program input, or a node within the levels-back window.
    pub fn in_window(&self, column: usize, source: NodeId) -> bool {
        match self.column_of(source) {
            None => source < self.shape.input_count,
            Some(source_column) => {
                source_column < column && column - source_column <= self.shape.levels_back
            }
        }
    }

    /// All node ids a node in `column` may connect to.
    pub fn connection_sources(&self, column: usize) -> Vec<NodeId> {
        let mut sources: Vec<NodeId> = (0..self.shape.input_count).collect();
        let first_column = column.saturating_sub(self.shape.levels_back);
        for c in first_column..column {
            for r in 0..self.shape.rows {
                sources.push(self.node_id(c, r));
            }
        }
        sources
    }
}
