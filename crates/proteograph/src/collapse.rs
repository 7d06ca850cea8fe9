// Standard Library Imports
use std::collections::BTreeMap;

// Local Crate Imports
use crate::{Graph, GraphError, NodeId, OrGroup, Qualifier, Result};

impl Graph {
    /// Replaces every set of parallel edges with a single edge. If the edges were annotated differently, the surviving
    /// edge carries an `OrGroup` of their distinct qualifier lists. Returns the number of edges removed
    pub(crate) fn collapse_parallel_edges(&mut self) -> Result<usize> {
        let mut obsolete = Vec::new();
        let nodes: Vec<_> = self.nodes().map(|(id, _)| id).collect();
        for node in nodes {
            let mut targets: BTreeMap<NodeId, Vec<_>> = BTreeMap::new();
            for &edge in self.outgoing(node) {
                targets.entry(self[edge].to).or_default().push(edge);
            }

            for (target, edges) in targets {
                let Some((&survivor, duplicates)) = edges.split_first() else {
                    continue;
                };
                if duplicates.is_empty() {
                    continue;
                }

                let cleaved = self[survivor].cleaved;
                if duplicates.iter().any(|&e| self[e].cleaved != cleaved) {
                    return Err(GraphError::CleavageMismatch {
                        accession: self.accession.clone(),
                        from: node,
                        to: target,
                        edges: edges.clone(),
                    });
                }

                let mut distinct: Vec<Vec<Qualifier>> = Vec::new();
                for &edge in &edges {
                    let qualifiers = self[edge].qualifiers.clone().unwrap_or_default();
                    if !distinct.contains(&qualifiers) {
                        distinct.push(qualifiers);
                    }
                }
                if distinct.len() > 1 {
                    self.edge_mut(survivor).qualifiers = Some(vec![Qualifier::Or(OrGroup(distinct))]);
                }
                obsolete.extend_from_slice(duplicates);
            }
        }

        let removed = obsolete.len();
        self.remove_edges(obsolete);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use insta::assert_snapshot;

    use crate::{Feature, FeatureKind};

    use super::*;

    fn qualified(feature: &Arc<Feature>) -> Option<Vec<Qualifier>> {
        Some(vec![Qualifier::Feature(Arc::clone(feature))])
    }

    fn only_qualifiers(graph: &Graph, from: NodeId) -> String {
        let edges = graph.outgoing(from);
        assert_eq!(edges.len(), 1);
        graph[edges[0]]
            .attr("qualifiers")
            .map(|q| q.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn distinct_qualifiers_become_alternatives() {
        let variant = Arc::new(Feature::new(FeatureKind::Variant, 1, 1, "Missing"));
        let conflict = Arc::new(Feature::new(FeatureKind::Conflict, 1, 1, "Missing"));

        let mut graph = Graph::canonical("P00001", "A");
        let (start, end) = (graph.start(), graph.end());
        graph.add_edge(start, end, None, qualified(&variant));
        graph.add_edge(start, end, None, qualified(&conflict));
        graph.add_edge(start, end, None, qualified(&variant));

        assert_eq!(graph.collapse_parallel_edges(), Ok(2));
        assert_eq!(graph.edge_count(), 3);
        let edge = graph.outgoing(start).iter().map(|&e| &graph[e]).find(|e| e.to() == end);
        let qualifiers = edge.unwrap().qualifiers().unwrap();
        assert!(matches!(qualifiers, [Qualifier::Or(group)] if group.alternatives().len() == 2));
        assert_snapshot!(qualifiers[0], @"(VARIANT[1-1]|CONFLICT[1-1])");
    }

    #[test]
    fn identical_qualifiers_are_deduplicated() {
        let variant = Arc::new(Feature::new(FeatureKind::Variant, 2, 2, "Missing"));
        // Features are compared structurally, not by identity
        let copy = Arc::new(Feature::new(FeatureKind::Variant, 2, 2, "Missing"));

        let mut graph = Graph::canonical("P00001", "AC");
        let a = graph.successors(graph.start()).next().unwrap();
        let end = graph.end();
        graph.add_edge(a, end, None, qualified(&variant));
        graph.add_edge(a, end, None, qualified(&copy));

        assert_eq!(graph.collapse_parallel_edges(), Ok(1));
        let edges: Vec<_> = graph.outgoing(a).iter().map(|&e| graph[e].clone()).collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].qualifiers(), qualified(&variant).as_deref());
    }

    #[test]
    fn unannotated_edges_are_an_alternative() {
        let conflict = Arc::new(Feature::new(FeatureKind::Conflict, 1, 1, "A -> G"));

        let mut graph = Graph::canonical("P00001", "A");
        let start = graph.start();
        let a = graph.successors(start).next().unwrap();
        graph.add_edge(start, a, None, qualified(&conflict));

        assert_eq!(graph.collapse_parallel_edges(), Ok(1));
        assert_snapshot!(only_qualifiers(&graph, start), @"(|CONFLICT[1-1])");
    }

    #[test]
    fn plain_duplicates() {
        let mut graph = Graph::canonical("P00001", "AK");
        let (start, end) = (graph.start(), graph.end());
        let k = graph.predecessors(end).next().unwrap();
        graph.add_edge(k, end, None, None);
        graph.add_edge(k, end, None, None);
        // Edges out of the same node, but into different targets, are left alone
        graph.add_edge(start, k, None, None);

        assert_eq!(graph.collapse_parallel_edges(), Ok(2));
        assert_eq!(graph.collapse_parallel_edges(), Ok(0));
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(only_qualifiers(&graph, k), "");
    }

    #[test]
    fn mismatched_cleavages() {
        let mut graph = Graph::canonical("P00001", "AK");
        let a = graph.successors(graph.start()).next().unwrap();
        let k = graph.predecessors(graph.end()).next().unwrap();
        graph.add_edge(a, k, Some(true), None);

        let error = graph.collapse_parallel_edges().unwrap_err();
        assert_snapshot!(
            error,
            @"the parallel edges 1, 3 from node 1 to node 2 of P00001 disagree about being cleaved"
        );
    }
}
