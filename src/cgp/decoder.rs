//! Genome decode: genotype + configuration -> executable graph structure.
//!
//! Decode is a pure function of its arguments — deterministic and
//! side-effect free, so it can be re-run for logging or visualisation
//! without affecting evolution. Only nodes reachable backward from a
//! selected output are decoded; everything else in the genome is carried
//! but never executed, which keeps genome length independent of phenotype
//! complexity.

use super::config::CgpConfig;
use crate::genome::Genotype;
use crate::types::NodeId;
use std::collections::{BTreeMap, BTreeSet};

/// Decoded program structure for one genotype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phenotype {
    /// Every node reachable from an output, program inputs included.
    pub active_nodes: BTreeSet<NodeId>,
    /// Active computational node -> consumed node ids, in gene order.
    /// Ordering matters for operators with non-commutative inputs.
    pub execution_tree: BTreeMap<NodeId, Vec<NodeId>>,
    /// Active computational nodes grouped by grid column.
    pub column_nodes: BTreeMap<usize, Vec<NodeId>>,
    /// Selected output node ids, in output-gene order.
    pub outputs: Vec<NodeId>,
}

/// Node ids selected by the output genes.
pub fn output_nodes(genotype: &Genotype, config: &CgpConfig) -> Vec<NodeId> {
    let offset = config.output_gene_offset();
    (0..config.shape().output_count)
        .map(|i| {
            let node = genotype.gene(offset + i) as NodeId;
            assert!(
                node < config.node_count(),
                "corrupt genome: output gene {i} selects nonexistent node {node}"
            );
            node
        })
        .collect()
}

/// Consumed node ids of one computational node, in gene order.
fn node_inputs(genotype: &Genotype, config: &CgpConfig, node: NodeId) -> Vec<NodeId> {
    let offset = config.node_gene_offset(node);
    let operator = genotype.gene(offset) as usize;
    let arity = config.operators().input_count(operator);
    let column = config
        .column_of(node)
        .expect("node_inputs called on a program input");

    (0..arity)
        .map(|k| {
            let source = genotype.gene(offset + 1 + k) as NodeId;
            assert!(
                config.in_window(column, source),
                "corrupt genome: node {node} (column {column}) references node {source} \
                 outside the levels-back window"
            );
            source
        })
        .collect()
}

/// Nodes reachable backward from the selected outputs.
///
/// With `exclude_program_inputs` set, pure input nodes are omitted — for
/// contexts that count only computational nodes.
pub fn active_nodes(
    genotype: &Genotype,
    config: &CgpConfig,
    exclude_program_inputs: bool,
) -> BTreeSet<NodeId> {
    let mut active = BTreeSet::new();
    let mut stack = output_nodes(genotype, config);

    while let Some(node) = stack.pop() {
        if config.is_program_input(node) {
            if !exclude_program_inputs {
                active.insert(node);
            }
            continue;
        }
        if !active.insert(node) {
            continue;
        }
        stack.extend(node_inputs(genotype, config, node));
    }
    active
}

/// Active computational node -> its consumed node ids, in gene order.
pub fn execution_tree(genotype: &Genotype, config: &CgpConfig) -> BTreeMap<NodeId, Vec<NodeId>> {
    active_nodes(genotype, config, true)
        .into_iter()
        .map(|node| (node, node_inputs(genotype, config, node)))
        .collect()
}

/// Active computational nodes grouped by column, for grid visualisation.
pub fn column_node_map(genotype: &Genotype, config: &CgpConfig) -> BTreeMap<usize, Vec<NodeId>> {
    let mut columns: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for node in active_nodes(genotype, config, true) {
        if let Some(column) = config.column_of(node) {
            columns.entry(column).or_default().push(node);
        }
    }
    columns
}

/// Full decode: active set, dependency tree, column map and outputs.
pub fn decode(genotype: &Genotype, config: &CgpConfig) -> Phenotype {
    Phenotype {
        active_nodes: active_nodes(genotype, config, false),
        execution_tree: execution_tree(genotype, config),
        column_nodes: column_node_map(genotype, config),
        outputs: output_nodes(genotype, config),
    }
}
