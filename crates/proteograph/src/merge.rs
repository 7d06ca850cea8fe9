// Standard Library Imports
use std::ops::Add;

// External Crate Imports
use itertools::Itertools;

// Local Crate Imports
use crate::{Edge, EdgeId, Graph, GraphError, NodeId, Qualifier, Result};

impl Graph {
    /// Contracts every chain of nodes joined by unbranching, uncleaved edges into a single node. This never changes
    /// which paths exist, only how many nodes they pass through. Returns the number of chains contracted
    pub(crate) fn merge_chains(&mut self) -> Result<usize> {
        let chains = self.chains();
        for chain in &chains {
            self.contract(chain)?;
        }
        self.remove_nodes(chains.iter().flatten().copied());
        Ok(chains.len())
    }
}

impl Graph {
    /// The only edge leaving `node`, if the node at the end of it could be merged into `node`
    fn joinable_successor(&self, node: NodeId) -> Option<(EdgeId, NodeId)> {
        let &[edge] = self.outgoing(node) else {
            return None;
        };
        let Edge { to, cleaved, .. } = self[edge];
        let joinable = !self.is_sentinel(node)
            && cleaved != Some(true)
            && !self.is_sentinel(to)
            && self.incoming(to).len() == 1;
        joinable.then_some((edge, to))
    }

    fn chains(&self) -> Vec<Vec<NodeId>> {
        let continues_chain = |node| match self.incoming(node) {
            &[edge] => self.joinable_successor(self[edge].from).is_some(),
            _ => false,
        };

        self.nodes()
            .map(|(id, _)| id)
            .filter(|&id| self.joinable_successor(id).is_some() && !continues_chain(id))
            .map(|head| {
                let mut chain = vec![head];
                let mut tail = head;
                while let Some((_, next)) = self.joinable_successor(tail) {
                    chain.push(next);
                    tail = next;
                }
                chain
            })
            .collect()
    }

    /// Adds a node replacing `chain`, but leaves removing the old nodes to the caller
    fn contract(&mut self, chain: &[NodeId]) -> Result<NodeId> {
        let (head, tail) = (chain[0], chain[chain.len() - 1]);
        let non_unique = |attribute| GraphError::NonUniqueAttribute {
            accession: self.accession.clone(),
            attribute,
            nodes: chain.to_vec(),
        };
        if !chain.iter().map(|&id| &self[id].accession).all_equal() {
            return Err(non_unique("accession"));
        }
        if !chain.iter().map(|&id| &self[id].isoform_accession).all_equal() {
            return Err(non_unique("isoform_accession"));
        }

        let residues: String = chain.iter().map(|&id| self[id].residues.as_str()).collect();
        let delta = chain.iter().filter_map(|&id| self[id].delta_mass).reduce(Add::add);
        let mass = chain
            .iter()
            .map(|&id| self[id].mass)
            .reduce(|total, mass| Some(total? + mass?))
            .flatten();
        let mut merged = self[head].derive(residues, delta);
        merged.mass = mass;
        merged.mass_to_end = self[head].mass_to_end;
        let merged = self.add_node(merged);

        let interior: Vec<Qualifier> = chain[..chain.len() - 1]
            .iter()
            .flat_map(|&id| self.outgoing(id))
            .filter_map(|&edge| self[edge].qualifiers())
            .flatten()
            .cloned()
            .collect();
        let incoming: Vec<_> = self.incoming(head).iter().map(|&e| self[e].clone()).collect();
        let outgoing: Vec<_> = self.outgoing(tail).iter().map(|&e| self[e].clone()).collect();

        for edge in incoming {
            self.add_edge(edge.from, merged, edge.cleaved, edge.qualifiers);
        }
        for edge in outgoing {
            let qualifiers = if interior.is_empty() {
                edge.qualifiers
            } else {
                Some(interior.iter().cloned().chain(edge.qualifiers.into_iter().flatten()).collect())
            };
            self.add_edge(merged, edge.to, edge.cleaved, qualifiers);
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aminochem::{Enzyme, Mass};
    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    use crate::{Feature, FeatureKind, PathFilter};

    use super::*;

    fn peptides(graph: &Graph) -> Vec<String> {
        let mut peptides: Vec<_> = graph
            .paths(&PathFilter::default())
            .map(|p| {
                let qualifiers = p.edges().iter().filter_map(|&e| graph[e].qualifiers()).flatten().join(",");
                format!("{}:{} {qualifiers}", p.residues(), p.miscleavages())
            })
            .collect();
        peptides.sort();
        peptides
    }

    #[test]
    fn canonical_chain() {
        let mut graph = Graph::canonical("P00001", "MAKPR");
        assert_eq!(graph.merge_chains(), Ok(1));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let merged = graph.successors(graph.start()).next().unwrap();
        assert_eq!(graph[merged].residues(), "MAKPR");
        assert_eq!(graph[merged].position(), Some(1));
        assert_eq!(graph.successors(merged).collect::<Vec<_>>(), [graph.end()]);
    }

    #[test]
    fn digested_chains() {
        let mut graph = Graph::canonical("P00001", "MAKWRPGRC");
        graph.digest(Enzyme::Trypsin);
        let before = peptides(&graph);

        // `MAK` and `WRPGR` are merged, but `C` is already alone
        assert_eq!(graph.merge_chains(), Ok(2));
        assert_eq!(peptides(&graph), before);
        let residues: Vec<_> = graph.nodes().map(|(_, n)| n.residues().to_owned()).collect();
        assert_eq!(residues, ["", "C", "", "MAK", "WRPGR"]);

        // Merging is idempotent
        assert_eq!(graph.merge_chains(), Ok(0));
        assert_eq!(peptides(&graph), before);
    }

    #[test]
    fn interior_qualifiers_move_outwards() {
        let variant = Arc::new(Feature::new(FeatureKind::Variant, 2, 2, "A -> C"));
        let mut graph = Graph::canonical("P00001", "AC");
        let a = graph.successors(graph.start()).next().unwrap();
        let interior = graph.outgoing(a)[0];
        graph.edge_mut(interior).qualifiers = Some(vec![Qualifier::Feature(variant)]);
        let before = peptides(&graph);

        assert_eq!(graph.merge_chains(), Ok(1));
        assert_eq!(peptides(&graph), before);
        assert_eq!(before, ["AC:0 VARIANT[2-2]"]);
        let merged = graph.successors(graph.start()).next().unwrap();
        assert!(graph[graph.incoming(merged)[0]].qualifiers().is_none());
        assert!(graph[graph.outgoing(merged)[0]].qualifiers().is_some());
    }

    #[test]
    fn summed_masses() {
        let mut graph = Graph::canonical("P00001", "AMK");
        let m = graph.nodes().find(|(_, n)| n.residues() == "M").unwrap().0;
        graph.node_mut(m).add_delta(Mass::new(dec!(15.994915)));
        graph.node_mut(m).add_delta(Mass::new(dec!(0.005085)));

        assert_eq!(graph.merge_chains(), Ok(1));
        let merged = graph.successors(graph.start()).next().unwrap();
        assert_eq!(graph[merged].delta_mass(), Some(Mass::new(dec!(16))));
    }

    #[test]
    fn non_unique_attributes() {
        let mut graph = Graph::canonical("P00001", "AC");
        let c = graph.predecessors(graph.end()).next().unwrap();
        graph.node_mut(c).accession = "P00002".to_owned();

        let error = graph.merge_chains().unwrap_err();
        assert_snapshot!(
            error,
            @r#"the chain of nodes 1, 2 of P00001 can't be merged, since they have different values for "accession""#
        );
    }
}
