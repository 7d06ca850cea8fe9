//! Features that cut a protein into smaller products: initiator methionines, signal peptides, and mature chains

// Standard Library Imports
use std::sync::Arc;

// External Crate Imports
use log::warn;

// Local Crate Imports
use super::Span;
use crate::{Feature, Graph, NodeId, Qualifier};

impl Graph {
    /// Deletes the first residue, but only if it's a methionine
    pub(super) fn remove_initial_methionine(&mut self, feature: &Arc<Feature>, spans: &[Span]) -> bool {
        if feature.start != 1 {
            warn!("{}: skipping {feature}, since it doesn't start at the first residue", self.accession);
            return false;
        }

        let mut applied = false;
        for span in spans {
            if self[span.first].residues == "M" {
                self.bypass(feature, span);
                applied = true;
            } else {
                warn!(
                    "{}: ignoring {feature} in {}, since the first residue isn't a methionine",
                    self.accession,
                    span.isoform.as_deref().unwrap_or("the canonical sequence")
                );
            }
        }
        applied
    }

    /// Deletes the signal peptide, but also lets the signal peptide itself be a product. Signal peptides must start at
    /// the first residue of the sequence they're annotated on
    pub(super) fn cleave_signal_peptide(&mut self, feature: &Arc<Feature>, spans: &[Span]) -> bool {
        let mut applied = false;
        for span in spans {
            if self.is_chain_head(span.first) {
                self.bypass(feature, span);
                self.link_to_end(feature, span);
                applied = true;
            } else {
                warn!(
                    "{}: ignoring {feature} in {}, since it doesn't start at the first residue",
                    self.accession,
                    span.isoform.as_deref().unwrap_or("the canonical sequence")
                );
            }
        }
        applied
    }

    /// Lets the region covered by a propeptide, peptide, or chain be a product on its own
    pub(super) fn excise_peptide(&mut self, feature: &Arc<Feature>, spans: &[Span]) -> bool {
        for span in spans {
            // NOTE: Only the sequence's own terminal edges are left unduplicated. Edges that earlier features added
            // between the same nodes are duplicated, then collapsed into alternatives
            if !self.is_chain_head(span.first) {
                let qualifiers = vec![Qualifier::Feature(Arc::clone(feature))];
                self.add_plain_edge(self.start, span.first, Some(qualifiers));
            }
            self.link_to_end(feature, span);
        }
        true
    }

    fn link_to_end(&mut self, feature: &Arc<Feature>, span: &Span) {
        if !self.is_chain_tail(span.last) {
            let qualifiers = vec![Qualifier::Feature(Arc::clone(feature))];
            self.add_plain_edge(span.last, self.end, Some(qualifiers));
        }
    }

    /// Is `node` the first residue of the canonical sequence, or of the isoform it belongs to?
    fn is_chain_head(&self, node: NodeId) -> bool {
        let node = &self[node];
        let position = if node.isoform_accession.is_some() {
            node.isoform_position
        } else {
            node.position
        };
        position == Some(1)
    }

    // NOTE: Every edge into the end sentinel that a feature adds is qualified, so only the last residue of a sequence
    // has an unqualified one
    fn is_chain_tail(&self, node: NodeId) -> bool {
        self.outgoing(node)
            .iter()
            .map(|&edge| &self[edge])
            .any(|edge| edge.to == self.end && edge.qualifiers.is_none())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Axis, Combinator, FeatureKind, RawFeature};

    use super::super::tests::{build, entry, spelled_paths};

    #[test]
    fn initial_methionines() {
        let entry = entry("MAKPR", vec![RawFeature::new("INIT_MET", 1, 1, "Removed")]);
        let (graph, counts) = build(&entry);
        assert_eq!(spelled_paths(&graph), ["AKPR INIT_MET[1-1]", "MAKPR"]);
        assert_eq!(counts.applied(FeatureKind::InitMet), 1);
    }

    #[test]
    fn initial_non_methionines() {
        let entry = entry("SAKPR", vec![RawFeature::new("INIT_MET", 1, 1, "")]);
        let (graph, counts) = build(&entry);
        assert_eq!(spelled_paths(&graph), ["SAKPR"]);
        assert_eq!(counts.applied(FeatureKind::InitMet), 0);
        assert_eq!(counts.skipped, 1);

        let entry = super::super::tests::entry("MMKPR", vec![RawFeature::new("INIT_MET", 2, 2, "")]);
        let (graph, counts) = build(&entry);
        assert_eq!(spelled_paths(&graph), ["MMKPR"]);
        assert_eq!(counts.skipped, 1);
    }

    #[test]
    fn misplaced_signal_peptides() {
        let entry = entry("MKWACDE", vec![RawFeature::new("SIGNAL", 5, 7, "")]);
        let (graph, counts) = build(&entry);
        assert_eq!(spelled_paths(&graph), ["MKWACDE"]);
        assert_eq!(counts.applied(FeatureKind::Signal), 0);
        assert_eq!(counts.skipped, 1);
    }

    #[test]
    fn signal_peptides() {
        let entry = entry("MKWAC", vec![RawFeature::new("SIGNAL", 1, 3, "")]);
        let (graph, counts) = build(&entry);
        assert_eq!(
            spelled_paths(&graph),
            ["AC SIGNAL[1-3]", "MKW SIGNAL[1-3]", "MKWAC"]
        );
        assert_eq!(counts.applied(FeatureKind::Signal), 1);
    }

    #[test]
    fn chains_and_propeptides() {
        let entry = entry(
            "MKWACDE",
            vec![
                RawFeature::new("PROPEP", 1, 3, "Activation peptide"),
                RawFeature::new("CHAIN", 4, 7, "Mature protein"),
                RawFeature::new("PEPTIDE", 2, 5, "Bioactive peptide"),
            ],
        );
        let (graph, counts) = build(&entry);
        assert_eq!(
            spelled_paths(&graph),
            [
                "AC CHAIN[4-7],PEPTIDE[2-5]",
                "ACDE CHAIN[4-7]",
                "KW PEPTIDE[2-5],PROPEP[1-3]",
                "KWAC PEPTIDE[2-5],PEPTIDE[2-5]",
                "KWACDE PEPTIDE[2-5]",
                "MKW PROPEP[1-3]",
                "MKWAC PEPTIDE[2-5]",
                "MKWACDE",
            ]
        );
        assert_eq!(counts.applied(FeatureKind::Propep), 1);
        assert_eq!(counts.applied(FeatureKind::Peptide), 1);
        assert_eq!(counts.applied(FeatureKind::Chain), 1);
        // Edges that would duplicate an existing `start -> M` or `E -> end` edge aren't added
        assert_eq!(graph.edge_count(), 8 + 1 + 2 + 1);
    }

    #[test]
    fn chains_after_signal_peptides() {
        let entry = entry(
            "MKWACDEFGH",
            vec![
                RawFeature::new("SIGNAL", 1, 3, ""),
                RawFeature::new("CHAIN", 4, 10, "Mature protein"),
            ],
        );
        let (mut graph, counts) = build(&entry);
        assert_eq!(counts.applied(FeatureKind::Signal), 1);
        assert_eq!(counts.applied(FeatureKind::Chain), 1);
        // Both features justify a `start -> A` edge, so each gets its own
        assert_eq!(
            spelled_paths(&graph),
            [
                "ACDEFGH CHAIN[4-10]",
                "ACDEFGH SIGNAL[1-3]",
                "MKW SIGNAL[1-3]",
                "MKWACDEFGH",
            ]
        );

        assert_eq!(graph.collapse_parallel_edges(), Ok(1));
        assert_eq!(
            spelled_paths(&graph),
            ["ACDEFGH (SIGNAL[1-3]|CHAIN[4-10])", "MKW SIGNAL[1-3]", "MKWACDEFGH"]
        );
        let chains = |combinator| graph.distribution(Axis::Feature(FeatureKind::Chain, combinator));
        assert_eq!(chains(Combinator::Max), Ok(vec![2, 1]));
        assert_eq!(chains(Combinator::Min), Ok(vec![3]));
    }
}
