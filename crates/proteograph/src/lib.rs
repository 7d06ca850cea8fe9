//! Compiles a protein sequence and its annotated features into a DAG, where every path from the start sentinel to the
//! end sentinel spells out one proteoform or peptide

mod attributes;
mod builder;
mod collapse;
mod counting;
mod digestion;
pub mod entry;
pub mod errors;
mod features;
mod graph;
mod merge;
pub mod options;
mod parsers;
mod paths;
mod protein;
mod ptm;
pub mod statistics;
mod substitution;
mod weights;

// Standard Library Imports
use std::sync::Arc;

// External Crate Imports
use aminochem::Mass;
use derive_more::{Add, Display};
use serde::Serialize;

pub use aminochem::{MassKind, MassTable};
pub use attributes::Attr;
pub use counting::{Axis, Combinator, Distribution};
pub use entry::{Entry, RawFeature};
pub use errors::{GraphError, Result};
pub use options::{GraphOptions, StatisticsOptions};
pub use paths::{PathFilter, Paths, Peptide};
pub use statistics::Statistics;

// NOTE: Nodes and edges live in append-only arenas, so an `Id` is never reused for the lifetime of a `Graph`. Passes
// collect the `Id`s they mean to delete and remove them all at once, after they're done reading the graph
#[derive(Clone, Debug)]
pub struct Graph {
    accession: String,
    start: NodeId,
    end: NodeId,
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    digested: bool,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Node {
    residues: String,
    position: Option<u32>,
    accession: String,
    isoform_accession: Option<String>,
    isoform_position: Option<u32>,
    delta_mass: Option<Mass>,
    mass: Option<Masses>,
    mass_to_end: Option<Masses>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Edge {
    from: NodeId,
    to: NodeId,
    cleaved: Option<bool>,
    qualifiers: Option<Vec<Qualifier>>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Add)]
struct Masses {
    monoisotopic: Mass,
    average: Mass,
}

// ---------------------------------------------------------------------------------------------------------------------

type Id = usize;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
pub struct NodeId(Id);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
pub struct EdgeId(Id);

// ---------------------------------------------------------------------------------------------------------------------

/// An annotation that justifies an edge. `Feature`s are never copied once created, only shared between edges
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Feature {
    kind: FeatureKind,
    start: u32,
    end: u32,
    note: String,
    isoform_ref: Option<String>,
    id: Option<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum FeatureKind {
    VarSeq,
    InitMet,
    Signal,
    Propep,
    Peptide,
    Chain,
    Variant,
    Mutagen,
    Conflict,
    FixMod,
    VarMod,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Qualifier {
    Feature(Arc<Feature>),
    Or(OrGroup),
}

/// Alternative annotation histories, any one of which justifies the same edge
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct OrGroup(Vec<Vec<Qualifier>>);

// ---------------------------------------------------------------------------------------------------------------------

/// A finished graph for one protein, along with the statistics gathered while building it
#[derive(Clone, Debug)]
pub struct ProteinGraph {
    graph: Graph,
    statistics: Statistics,
}
