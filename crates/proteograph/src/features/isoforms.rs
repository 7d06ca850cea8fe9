//! Isoforms are spliced in as whole new chains between the sentinels, built from the canonical sequence and the VAR_SEQ
//! features that describe them

// Standard Library Imports
use std::sync::Arc;

// External Crate Imports
use log::warn;

// Local Crate Imports
use crate::{
    Feature, Graph, Node, Qualifier,
    parsers::{IsoformDeclaration, Note, parse_isoform_declarations, parse_note},
};

type Residue = (char, Option<u32>);

impl Graph {
    /// Builds every isoform declared in `comments`, returning the number that were built
    pub(super) fn build_isoforms(
        &mut self,
        sequence: &str,
        comments: &[String],
        var_seqs: &[Arc<Feature>],
    ) -> usize {
        let declarations = comments
            .iter()
            .flat_map(|comment| parse_isoform_declarations(comment));

        let mut built = 0;
        for declaration in declarations {
            if let Some((residues, features)) = self.isoform_sequence(sequence, &declaration, var_seqs) {
                self.splice_isoform(&declaration.accession, &residues, features);
                built += 1;
            }
        }
        built
    }

    fn isoform_sequence(
        &self,
        sequence: &str,
        declaration: &IsoformDeclaration,
        var_seqs: &[Arc<Feature>],
    ) -> Option<(Vec<Residue>, Vec<Arc<Feature>>)> {
        let isoform = &declaration.accession;
        let mut features = Vec::with_capacity(declaration.var_seq_ids.len());
        for id in &declaration.var_seq_ids {
            let Some(feature) = var_seqs.iter().find(|f| f.id() == Some(id)) else {
                warn!("{}: skipping isoform {isoform}, since {id} isn't annotated", self.accession);
                return None;
            };
            features.push(Arc::clone(feature));
        }
        features.sort_by_key(|f| f.start);

        let mut residues: Vec<Residue> = sequence.chars().zip((1..).map(Some)).collect();
        let mut next_start = u32::try_from(residues.len()).unwrap_or(u32::MAX) + 1;
        // NOTE: Working back-to-front means that splicing one region never shifts the positions of the next
        for feature in features.iter().rev() {
            let (start, end) = (feature.start, feature.end);
            if start == 0 || start > end || end >= next_start {
                warn!(
                    "{}: skipping isoform {isoform}, since {feature} is out of range or overlaps another VAR_SEQ",
                    self.accession
                );
                return None;
            }
            next_start = start;

            let range = (start - 1) as usize..end as usize;
            match parse_note(&feature.note) {
                Some(Note::Missing) => {
                    residues.drain(range);
                }
                Some(Note::Substitution(targets)) if targets.len() == 1 => {
                    let replacement = targets[0].chars().map(|residue| (residue, None));
                    residues.splice(range, replacement);
                }
                _ => {
                    warn!(
                        "{}: skipping isoform {isoform}, since the note of {feature} can't be applied",
                        self.accession
                    );
                    return None;
                }
            }
        }

        if residues.is_empty() {
            warn!("{}: skipping isoform {isoform}, since it has no residues", self.accession);
            return None;
        }
        Some((residues, features))
    }

    fn splice_isoform(&mut self, isoform: &str, residues: &[Residue], features: Vec<Arc<Feature>>) {
        let mut previous = self.start;
        let mut qualifiers = Some(features.into_iter().map(Qualifier::Feature).collect());
        for (&(residue, position), isoform_position) in residues.iter().zip(1..) {
            let mut node = Node::new(residue, &self.accession).with_isoform(Some(isoform), Some(isoform_position));
            node.position = position;
            let node = self.add_node(node);
            self.add_plain_edge(previous, node, qualifiers.take());
            previous = node;
        }
        self.add_plain_edge(previous, self.end, None);
    }
}
