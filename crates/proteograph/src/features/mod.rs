//! Feature executors: each one adds bypass edges (or new residue chains) for one annotated feature, always leaving the
//! existing paths in place

mod cleaved;
mod isoforms;

// Standard Library Imports
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

// External Crate Imports
use log::{debug, warn};

// Local Crate Imports
use crate::{
    Entry, Feature, FeatureKind, Graph, Node, NodeId,
    graph::with_feature,
    parsers::{Note, parse_note},
};

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub(crate) struct FeatureCounts {
    pub applied: BTreeMap<FeatureKind, usize>,
    pub isoforms: usize,
    pub skipped: usize,
}

impl FeatureCounts {
    pub fn applied(&self, kind: FeatureKind) -> usize {
        self.applied.get(&kind).copied().unwrap_or_default()
    }
}

impl Graph {
    /// Executes the selected features of `entry`, isoforms first, then every other kind in `FeatureKind` order
    pub(crate) fn execute_features(
        &mut self,
        entry: &Entry,
        selected: &BTreeSet<FeatureKind>,
    ) -> FeatureCounts {
        let mut counts = FeatureCounts::default();
        let mut features = Vec::new();
        for raw in &entry.features {
            let Ok(kind) = raw.kind.parse::<FeatureKind>() else {
                continue;
            };
            if !FeatureKind::EXECUTABLE.contains(&kind) || !selected.contains(&kind) {
                continue;
            }
            if let Some(feature) = Feature::from_raw(raw) {
                features.push(Arc::new(feature));
            } else {
                warn!("{}: skipping a {kind} feature, since one of its endpoints is unknown", self.accession);
                counts.skipped += 1;
            }
        }
        // NOTE: This sort is stable, so features of the same kind are executed in the order they were annotated
        features.sort_by_key(|f| f.kind);

        let (var_seqs, others) = features.split_at(features.partition_point(|f| f.kind == FeatureKind::VarSeq));

        if selected.contains(&FeatureKind::VarSeq) {
            counts.isoforms = self.build_isoforms(&entry.sequence, &entry.comments, var_seqs);
        }

        for feature in others {
            if self.execute_feature(feature) {
                *counts.applied.entry(feature.kind).or_default() += 1;
            } else {
                counts.skipped += 1;
            }
        }

        counts
    }
}

// Private Types =======================================================================================================

/// The first and last residue covered by a feature, within one isoform (or within the canonical sequence)
#[derive(Clone, Eq, PartialEq, Debug)]
struct Span {
    isoform: Option<String>,
    first: NodeId,
    last: NodeId,
}

// Private Methods =====================================================================================================

impl Graph {
    fn execute_feature(&mut self, feature: &Arc<Feature>) -> bool {
        let Some(spans) = self.resolve_spans(feature) else {
            return false;
        };

        match feature.kind {
            FeatureKind::InitMet => self.remove_initial_methionine(feature, &spans),
            FeatureKind::Signal => self.cleave_signal_peptide(feature, &spans),
            FeatureKind::Propep | FeatureKind::Peptide | FeatureKind::Chain => {
                self.excise_peptide(feature, &spans)
            }
            FeatureKind::Variant | FeatureKind::Mutagen | FeatureKind::Conflict => {
                self.apply_note(feature, &spans)
            }
            // NOTE: Isoforms are built before any other feature runs, and modifications are never read from entries
            FeatureKind::VarSeq | FeatureKind::FixMod | FeatureKind::VarMod => false,
        }
    }

    /// Finds the first and last residue covered by `feature` in every isoform containing both. Residues are matched by
    /// their canonical position, unless the feature refers to a specific isoform
    fn resolve_spans(&self, feature: &Feature) -> Option<Vec<Span>> {
        if feature.start > feature.end {
            warn!("{}: skipping {feature}, since its range is reversed", self.accession);
            return None;
        }

        let residues_at = |position| {
            let mut groups: BTreeMap<_, Vec<_>> = BTreeMap::new();
            let matching = self.nodes().filter(|&(id, node)| {
                !self.is_sentinel(id)
                    && match feature.isoform_ref() {
                        Some(isoform) => {
                            node.isoform_accession() == Some(isoform)
                                && node.isoform_position == Some(position)
                        }
                        None => node.position == Some(position),
                    }
            });
            for (id, node) in matching {
                groups.entry(node.isoform_accession()).or_default().push(id);
            }
            groups
        };

        let (firsts, lasts) = (residues_at(feature.start), residues_at(feature.end));
        if firsts.is_empty() || lasts.is_empty() {
            // NOTE: This is expected for features annotated on isoforms that were never built
            if feature.isoform_ref.is_some() {
                debug!("{}: skipping {feature}, since its isoform wasn't built", self.accession);
            } else {
                warn!("{}: skipping {feature}, since its range doesn't cover any residues", self.accession);
            }
            return None;
        }

        let mut spans = Vec::new();
        for (isoform, firsts) in &firsts {
            let Some(lasts) = lasts.get(isoform) else {
                continue;
            };
            if let ([first], [last]) = (firsts.as_slice(), lasts.as_slice()) {
                spans.push(Span {
                    isoform: isoform.map(str::to_owned),
                    first: *first,
                    last: *last,
                });
            } else {
                warn!(
                    "{}: ignoring {feature} in {}, since its endpoints are ambiguous",
                    self.accession,
                    isoform.unwrap_or("the canonical sequence")
                );
            }
        }

        if spans.is_empty() {
            warn!("{}: skipping {feature}, since no isoform contains both of its endpoints", self.accession);
            None
        } else {
            Some(spans)
        }
    }

    fn apply_note(&mut self, feature: &Arc<Feature>, spans: &[Span]) -> bool {
        match parse_note(&feature.note) {
            Some(Note::Missing) => {
                for span in spans {
                    self.bypass(feature, span);
                }
                true
            }
            Some(Note::Substitution(targets)) => {
                for span in spans {
                    self.substitute(feature, span, &targets);
                }
                true
            }
            None => {
                warn!(
                    "{}: skipping {feature}, since its note {:?} isn't a deletion or substitution",
                    self.accession, feature.note
                );
                false
            }
        }
    }

    /// Adds an edge from every predecessor of the span to every successor of the span, deleting the residues in it
    fn bypass(&mut self, feature: &Arc<Feature>, span: &Span) {
        let sources: Vec<_> = self
            .incoming(span.first)
            .iter()
            .map(|&e| (self[e].from, self[e].qualifiers.clone()))
            .collect();
        let targets: Vec<_> = self.successors(span.last).collect();

        for (from, qualifiers) in sources {
            let qualifiers = with_feature(qualifiers.as_deref(), feature);
            for &to in &targets {
                if from == self.start && to == self.end {
                    continue;
                }
                self.add_plain_edge(from, to, Some(qualifiers.clone()));
            }
        }
    }

    /// Replaces the residues in the span with new chains of residues, one per target sequence
    fn substitute(&mut self, feature: &Arc<Feature>, span: &Span, targets: &[String]) {
        let sources: Vec<_> = self
            .incoming(span.first)
            .iter()
            .map(|&e| (self[e].from, self[e].qualifiers.clone()))
            .collect();
        let sinks: Vec<_> = self
            .outgoing(span.last)
            .iter()
            .map(|&e| (self[e].to, self[e].qualifiers.clone()))
            .collect();

        for target in targets {
            let chain: Vec<_> = target
                .chars()
                .map(|residue| {
                    let node = Node::new(residue, &self.accession).with_isoform(span.isoform.as_deref(), None);
                    self.add_node(node)
                })
                .collect();
            for link in chain.windows(2) {
                self.add_plain_edge(link[0], link[1], None);
            }

            let (Some(&head), Some(&tail)) = (chain.first(), chain.last()) else {
                continue;
            };
            for (from, qualifiers) in &sources {
                let qualifiers = with_feature(qualifiers.as_deref(), feature);
                self.add_plain_edge(*from, head, Some(qualifiers));
            }
            for (to, qualifiers) in &sinks {
                self.add_plain_edge(tail, *to, qualifiers.clone());
            }
        }
    }
}

// Module Tests ========================================================================================================
