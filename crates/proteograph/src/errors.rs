use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::{EdgeId, NodeId};

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

// NOTE: Each of these means that a pass has broken one of the graph's invariants. They abort the current protein, but
// should never stop a whole batch
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum GraphError {
    #[diagnostic(help("every pass should leave the graph acyclic, so this is a bug in the passes run before"))]
    #[error("the graph of {accession} contains a cycle through the nodes {}", .nodes.iter().join(", "))]
    Cycle {
        accession: String,
        nodes: Vec<NodeId>,
    },

    #[diagnostic(help("digestion must run before any pass that creates parallel edges"))]
    #[error(
        "the parallel edges {} from node {from} to node {to} of {accession} disagree about being cleaved",
        .edges.iter().join(", ")
    )]
    CleavageMismatch {
        accession: String,
        from: NodeId,
        to: NodeId,
        edges: Vec<EdgeId>,
    },

    #[error(
        "the chain of nodes {} of {accession} can't be merged, since they have different values for {attribute:?}",
        .nodes.iter().join(", ")
    )]
    NonUniqueAttribute {
        accession: String,
        attribute: &'static str,
        nodes: Vec<NodeId>,
    },

    #[diagnostic(help("double-check for typos in the sequence, or add the residue to the mass table"))]
    #[error("node {node} of {accession} contains the residue {residue:?}, which is missing from the mass table")]
    UnknownResidue {
        accession: String,
        node: NodeId,
        residue: char,
    },

    #[error("the {sentinel} sentinel (node {node}) of {accession} has {problem}")]
    BrokenSentinel {
        accession: String,
        sentinel: &'static str,
        node: NodeId,
        problem: &'static str,
    },
}
