// External Crate Imports
use aminochem::Enzyme;
use log::debug;

// Local Crate Imports
use crate::{Edge, Graph};

impl Graph {
    /// Marks every edge the `enzyme` cleaves, adding a `start -> target` edge and a `source -> end` edge for each, so
    /// that each cleavage can either happen or be missed. Returns the number of edges cleaved
    pub fn digest(&mut self, enzyme: Enzyme) -> usize {
        if enzyme == Enzyme::Skip {
            return 0;
        }

        if !self.digested {
            for edge in self.edges.iter_mut().flatten() {
                edge.cleaved.get_or_insert(false);
            }
            self.mark_digested();
        }

        let sites: Vec<_> = self
            .edges()
            .filter(|(_, edge)| edge.cleaved != Some(true) && self.is_cleavage_site(enzyme, edge))
            .map(|(id, _)| id)
            .collect();

        for &site in &sites {
            let edge = self.edge_mut(site);
            edge.cleaved = Some(true);
            let (from, to, qualifiers) = (edge.from, edge.to, edge.qualifiers.clone());

            self.add_edge(self.start, to, Some(false), qualifiers);
            self.add_edge(from, self.end, Some(false), None);
        }

        debug!("{}: {enzyme} cleaved {} edges", self.accession, sites.len());
        sites.len()
    }

    fn is_cleavage_site(&self, enzyme: Enzyme, edge: &Edge) -> bool {
        // NOTE: Cleaving next to a sentinel would only add a duplicate of an edge that's already there
        if edge.from == self.start || edge.to == self.end {
            return false;
        }

        let (before, after) = (&self[edge.from].residues, &self[edge.to].residues);
        let cleaves_after = |residues: &[char]| {
            before.ends_with(residues) && !after.starts_with('P')
        };
        match enzyme {
            Enzyme::Skip => false,
            Enzyme::Trypsin => cleaves_after(&['K', 'R']),
            Enzyme::GluC => cleaves_after(&['D', 'E']),
            Enzyme::Full => true,
        }
    }
}
