//! Which passes build a `ProteinGraph`, and how each of them is configured

// Standard Library Imports
use std::collections::BTreeSet;

// External Crate Imports
use aminochem::{Enzyme, ModificationRules, ReplacementRule};

// Local Crate Imports
use crate::{Combinator, FeatureKind};

/// Options shared by every protein in a run. Parsing rules can fail, so that happens once, before any protein is read
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GraphOptions {
    /// Feature kinds to execute. Unselected kinds are neither executed nor counted
    pub features: BTreeSet<FeatureKind>,
    /// Applied in order, so later rules see the residues written by earlier ones
    pub replacements: Vec<ReplacementRule>,
    /// Applied in order. Cleavages from every enzyme are summed
    pub digestion: Vec<Enzyme>,
    pub modifications: ModificationRules,
    pub collapse_edges: bool,
    pub merge_chains: bool,
    pub masses: bool,
    /// Implies `masses`
    pub suffix_masses: bool,
    pub statistics: StatisticsOptions,
}

/// Which of the (potentially expensive) path statistics to compute for every protein
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct StatisticsOptions {
    pub path_count: bool,
    pub miscleavages: bool,
    pub hops: bool,
    pub features: Vec<(FeatureKind, Combinator)>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            features: FeatureKind::EXECUTABLE.into(),
            replacements: Vec::new(),
            digestion: Vec::new(),
            modifications: ModificationRules::default(),
            collapse_edges: true,
            merge_chains: true,
            masses: false,
            suffix_masses: false,
            statistics: StatisticsOptions::default(),
        }
    }
}

impl StatisticsOptions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.path_count || self.miscleavages || self.hops) && self.features.is_empty()
    }
}
