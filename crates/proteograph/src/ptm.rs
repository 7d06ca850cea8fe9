//! Post-translational modifications, annotated as mass deltas on residues, or on empty nodes flanking a terminus

// Standard Library Imports
use std::{
    collections::{BTreeMap, btree_map::Entry},
    sync::Arc,
};

// External Crate Imports
use aminochem::{Mass, MassTable, ModificationCode, ModificationRules, Terminus};
use log::debug;
use rust_decimal::Decimal;

// Local Crate Imports
use crate::{EdgeId, Feature, FeatureKind, Graph, NodeId, Qualifier, graph::with_feature};

// Public API ==========================================================================================================

/// The number of sites that fixed and variable modifications were applied to
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub(crate) struct ModificationCounts {
    pub fixed: usize,
    pub variable: usize,
}

impl Graph {
    /// Applies fixed modifications in place and adds a modified copy of every site for each variable modification
    pub(crate) fn annotate_modifications(
        &mut self,
        rules: &ModificationRules,
        table: &MassTable,
    ) -> ModificationCounts {
        let fixed = rules.fixed().map(|(code, delta)| (code, Deltas::Fixed(delta)));
        let variable = rules.variable().map(|(code, deltas)| (code, Deltas::Variable(deltas)));
        let mut steps: Vec<_> = fixed.chain(variable).collect();
        // NOTE: Residue modifications find their sites through the sentinels' edges, so they must run before the
        // terminus modifications rewire those edges. The sort is stable, keeping codes in order within each stage
        steps.sort_by_key(|&(code, deltas)| (stage(code), matches!(deltas, Deltas::Variable(_))));

        let mut counts = ModificationCounts::default();
        for (code, deltas) in steps {
            let sites = self.apply_modification(code, deltas, table);
            match deltas {
                Deltas::Fixed(_) => counts.fixed += sites,
                Deltas::Variable(_) => counts.variable += sites,
            }
            debug!("{}: modification {code} applied to {sites} sites", self.accession);
        }
        counts
    }
}

// Private Types =======================================================================================================

#[derive(Copy, Clone, Debug)]
enum Deltas<'r> {
    Fixed(Decimal),
    Variable(&'r [Decimal]),
}

impl Deltas<'_> {
    fn iter(&self) -> impl Iterator<Item = (FeatureKind, Decimal)> + '_ {
        let (kind, deltas) = match self {
            Self::Fixed(delta) => (FeatureKind::FixMod, std::slice::from_ref(delta)),
            Self::Variable(deltas) => (FeatureKind::VarMod, *deltas),
        };
        deltas.iter().map(move |&delta| (kind, delta))
    }
}

const fn stage(code: ModificationCode) -> u8 {
    match code {
        ModificationCode::Residue(_)
        | ModificationCode::PeptideTerminalResidue(..)
        | ModificationCode::ProteinTerminalResidue(..) => 0,
        ModificationCode::ProteinTerminus(_) => 1,
        ModificationCode::PeptideTerminus(_) => 2,
    }
}

// Private Methods =====================================================================================================

impl Graph {
    fn apply_modification(&mut self, code: ModificationCode, deltas: Deltas<'_>, table: &MassTable) -> usize {
        let mut obsolete = Vec::new();
        let sites = match code {
            ModificationCode::Residue(residue) => {
                let sites: Vec<_> = self
                    .nodes()
                    .filter(|&(id, _)| !self.is_sentinel(id) && self.is_residue(id, residue))
                    .map(|(id, _)| id)
                    .collect();
                for &site in &sites {
                    self.modify_residue(site, code, deltas, table);
                }
                sites.len()
            }
            ModificationCode::PeptideTerminalResidue(terminus, residue) => {
                let mut sites: Vec<_> = match terminus {
                    Terminus::N => self.successors(self.start).collect(),
                    Terminus::C => self.predecessors(self.end).collect(),
                };
                sites.sort_unstable();
                sites.dedup();
                sites.retain(|&id| !self.is_sentinel(id) && self.is_residue(id, residue));
                sites
                    .into_iter()
                    .filter(|&site| self.modify_terminal_residue(site, terminus, code, deltas, table, &mut obsolete))
                    .count()
            }
            ModificationCode::ProteinTerminalResidue(terminus, residue) => {
                let mut sites = self.protein_terminal_residues(terminus);
                sites.retain(|&id| self.is_residue(id, residue));
                sites
                    .into_iter()
                    .filter(|&site| self.modify_terminal_residue(site, terminus, code, deltas, table, &mut obsolete))
                    .count()
            }
            ModificationCode::ProteinTerminus(terminus) => self
                .protein_terminal_residues(terminus)
                .into_iter()
                .filter(|&site| self.insert_terminus(site, terminus, code, deltas, table, &mut obsolete))
                .count(),
            ModificationCode::PeptideTerminus(terminus) => {
                self.extend_sentinel(terminus, code, deltas, table);
                1
            }
        };
        self.remove_edges(obsolete);
        sites
    }

    fn modify_residue(&mut self, node: NodeId, code: ModificationCode, deltas: Deltas<'_>, table: &MassTable) {
        if let Deltas::Fixed(delta) = deltas {
            let feature = self.modification_feature(node, FeatureKind::FixMod, code, delta);
            self.modify_in_place(node, table.delta(delta), &feature);
        } else {
            let (incoming, outgoing) = (self.incoming(node).to_vec(), self.outgoing(node).to_vec());
            for (kind, delta) in deltas.iter() {
                let feature = self.modification_feature(node, kind, code, delta);
                self.add_modified_copy(node, table.delta(delta), &feature, &incoming, &outgoing);
            }
        }
    }

    /// Modifies `node` only on the paths where it's adjacent to the `terminus` sentinel. Edges that a fixed
    /// modification moves onto a modified copy are pushed onto `obsolete`
    fn modify_terminal_residue(
        &mut self,
        node: NodeId,
        terminus: Terminus,
        code: ModificationCode,
        deltas: Deltas<'_>,
        table: &MassTable,
        obsolete: &mut Vec<EdgeId>,
    ) -> bool {
        let (incoming, outgoing) = (self.incoming(node).to_vec(), self.outgoing(node).to_vec());
        let (terminal, interior): (Vec<_>, Vec<_>) = match terminus {
            Terminus::N => incoming.iter().copied().partition(|&e| self[e].from == self.start),
            Terminus::C => outgoing.iter().copied().partition(|&e| self[e].to == self.end),
        };
        if terminal.is_empty() {
            return false;
        }

        // A fixed modification can only be applied in place if every path through `node` is terminal
        if let (Deltas::Fixed(delta), true) = (deltas, interior.is_empty()) {
            let feature = self.modification_feature(node, FeatureKind::FixMod, code, delta);
            self.modify_in_place(node, table.delta(delta), &feature);
            return true;
        }

        let (copied_incoming, copied_outgoing) = match terminus {
            Terminus::N => (terminal.as_slice(), outgoing.as_slice()),
            Terminus::C => (incoming.as_slice(), terminal.as_slice()),
        };
        for (kind, delta) in deltas.iter() {
            let feature = self.modification_feature(node, kind, code, delta);
            self.add_modified_copy(node, table.delta(delta), &feature, copied_incoming, copied_outgoing);
        }
        if let Deltas::Fixed(_) = deltas {
            obsolete.extend(terminal);
        }
        true
    }

    /// Puts an empty node carrying the modification between `node` and the `terminus` sentinel
    fn insert_terminus(
        &mut self,
        node: NodeId,
        terminus: Terminus,
        code: ModificationCode,
        deltas: Deltas<'_>,
        table: &MassTable,
        obsolete: &mut Vec<EdgeId>,
    ) -> bool {
        let terminal: Vec<_> = match terminus {
            Terminus::N => self.incoming(node).iter().copied().filter(|&e| self[e].from == self.start).collect(),
            Terminus::C => self.outgoing(node).iter().copied().filter(|&e| self[e].to == self.end).collect(),
        };
        if terminal.is_empty() {
            return false;
        }

        for (kind, delta) in deltas.iter() {
            let feature = self.modification_feature(node, kind, code, delta);
            let marker = self[node].derive("", Some(table.delta(delta)));
            let marker = self.add_node(marker);
            match terminus {
                Terminus::N => {
                    self.add_modified_copy_edges(&terminal, marker, Some(&feature), Terminus::N);
                    self.add_plain_edge(marker, node, None);
                }
                Terminus::C => {
                    let qualifiers = vec![Qualifier::Feature(feature)];
                    self.add_plain_edge(node, marker, Some(qualifiers));
                    self.add_modified_copy_edges(&terminal, marker, None, Terminus::C);
                }
            }
        }
        if let Deltas::Fixed(_) = deltas {
            obsolete.extend(terminal);
        }
        true
    }

    /// Replaces a sentinel with a new one, leaving the old sentinel as an empty node that carries the modification
    fn extend_sentinel(&mut self, terminus: Terminus, code: ModificationCode, deltas: Deltas<'_>, table: &MassTable) {
        let old = match terminus {
            Terminus::N => self.start,
            Terminus::C => self.end,
        };
        let new = self[old].derive("", None);
        let new = self.add_node(new);
        match terminus {
            Terminus::N => {
                self.add_plain_edge(new, old, None);
                self.set_start(new);
            }
            Terminus::C => {
                self.add_plain_edge(old, new, None);
                self.set_end(new);
            }
        }
        self.modify_residue(old, code, deltas, table);
    }

    fn modify_in_place(&mut self, node: NodeId, delta: Mass, feature: &Arc<Feature>) {
        self.node_mut(node).add_delta(delta);
        for edge in self.incoming(node).to_vec() {
            let qualifiers = self.edge_mut(edge).qualifiers.get_or_insert_with(Vec::new);
            qualifiers.push(Qualifier::Feature(Arc::clone(feature)));
        }
    }

    /// Adds a copy of `node` with `delta` added to its delta mass, mirroring the `incoming` edges (with `feature`
    /// appended to their qualifiers) and the `outgoing` edges onto it
    fn add_modified_copy(
        &mut self,
        node: NodeId,
        delta: Mass,
        feature: &Arc<Feature>,
        incoming: &[EdgeId],
        outgoing: &[EdgeId],
    ) -> NodeId {
        let original = &self[node];
        let delta = original.delta_mass.unwrap_or_default() + delta;
        let copy = original.derive(original.residues.clone(), Some(delta));
        let copy = self.add_node(copy);
        self.add_modified_copy_edges(incoming, copy, Some(feature), Terminus::N);
        self.add_modified_copy_edges(outgoing, copy, None, Terminus::C);
        copy
    }

    /// Mirrors `edges` so that they point into `node` (`Terminus::N`) or out of it (`Terminus::C`)
    fn add_modified_copy_edges(
        &mut self,
        edges: &[EdgeId],
        node: NodeId,
        feature: Option<&Arc<Feature>>,
        side: Terminus,
    ) {
        for &edge in edges {
            let edge = &self[edge];
            let qualifiers = match feature {
                Some(feature) => Some(with_feature(edge.qualifiers(), feature)),
                None => edge.qualifiers.clone(),
            };
            let (from, to) = match side {
                Terminus::N => (edge.from, node),
                Terminus::C => (node, edge.to),
            };
            let cleaved = edge.cleaved;
            self.add_edge(from, to, cleaved, qualifiers);
        }
    }

    /// The residues with the smallest (or largest) position in the canonical sequence and in each isoform
    fn protein_terminal_residues(&self, terminus: Terminus) -> Vec<NodeId> {
        let mut extremes: BTreeMap<Option<&str>, (u32, Vec<NodeId>)> = BTreeMap::new();
        for (id, node) in self.nodes() {
            if self.is_sentinel(id) || node.residues.is_empty() {
                continue;
            }
            let position = if node.isoform_accession.is_some() {
                node.isoform_position
            } else {
                node.position
            };
            let Some(position) = position else {
                continue;
            };

            match extremes.entry(node.isoform_accession()) {
                Entry::Vacant(entry) => {
                    entry.insert((position, vec![id]));
                }
                Entry::Occupied(mut entry) => {
                    let (extreme, ids) = entry.get_mut();
                    let beyond = match terminus {
                        Terminus::N => position < *extreme,
                        Terminus::C => position > *extreme,
                    };
                    if beyond {
                        *extreme = position;
                        *ids = vec![id];
                    } else if position == *extreme {
                        ids.push(id);
                    }
                }
            }
        }
        extremes.into_values().flat_map(|(_, ids)| ids).collect()
    }

    fn is_residue(&self, id: NodeId, residue: char) -> bool {
        self[id].residues.chars().eq([residue])
    }

    fn modification_feature(
        &self,
        node: NodeId,
        kind: FeatureKind,
        code: ModificationCode,
        delta: Decimal,
    ) -> Arc<Feature> {
        let position = self[node].position.unwrap_or_default();
        Arc::new(Feature::new(kind, position, position, format!("{code}:{delta}")))
    }
}

// Module Tests ========================================================================================================
