//! The per-protein record of what building a graph did, and of any path statistics that were asked for

// Standard Library Imports
use std::collections::BTreeMap;

// External Crate Imports
use itertools::Itertools;
use serde::{Serialize, Serializer};

// Local Crate Imports
use crate::{Combinator, Distribution, FeatureKind, features::FeatureCounts};

/// One flat row per protein, so that a whole run can be written to a single CSV file. Distributions are written as
/// `;`-separated counts, starting from zero
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct Statistics {
    pub accession: String,
    pub entry_name: String,
    pub isoforms: usize,
    pub init_met: usize,
    pub signal: usize,
    pub propep: usize,
    pub peptide: usize,
    pub chain: usize,
    pub variant: usize,
    pub mutagen: usize,
    pub conflict: usize,
    /// Features that couldn't be placed on the graph
    pub skipped_features: usize,
    pub replaced_residues: usize,
    pub fixed_modifications: usize,
    pub variable_modifications: usize,
    pub cleavages: usize,
    pub nodes: usize,
    pub edges: usize,
    pub path_count: Option<u128>,
    #[serde(serialize_with = "ser_distribution")]
    pub miscleavages: Option<Distribution>,
    #[serde(serialize_with = "ser_distribution")]
    pub hops: Option<Distribution>,
    #[serde(serialize_with = "ser_feature_distributions")]
    pub feature_distributions: BTreeMap<(FeatureKind, Combinator), Distribution>,
}

impl Statistics {
    pub(crate) fn record_features(&mut self, counts: &FeatureCounts) {
        self.isoforms = counts.isoforms;
        self.init_met = counts.applied(FeatureKind::InitMet);
        self.signal = counts.applied(FeatureKind::Signal);
        self.propep = counts.applied(FeatureKind::Propep);
        self.peptide = counts.applied(FeatureKind::Peptide);
        self.chain = counts.applied(FeatureKind::Chain);
        self.variant = counts.applied(FeatureKind::Variant);
        self.mutagen = counts.applied(FeatureKind::Mutagen);
        self.conflict = counts.applied(FeatureKind::Conflict);
        self.skipped_features = counts.skipped;
    }
}

fn joined(distribution: &[u128]) -> String {
    distribution.iter().join(";")
}

fn ser_distribution<S: Serializer>(value: &Option<Distribution>, ser: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(distribution) => ser.serialize_str(&joined(distribution)),
        None => ser.serialize_none(),
    }
}

// NOTE: The number of distributions depends on the run's options, so they share one column: `VARIANT(max)=1;2 ...`
fn ser_feature_distributions<S: Serializer>(
    value: &BTreeMap<(FeatureKind, Combinator), Distribution>,
    ser: S,
) -> Result<S::Ok, S::Error> {
    let column = value
        .iter()
        .map(|((kind, combinator), distribution)| {
            let combinator = match combinator {
                Combinator::Min => "min",
                Combinator::Max => "max",
            };
            format!("{kind}({combinator})={}", joined(distribution))
        })
        .join(" ");
    ser.serialize_str(&column)
}
