use crate::{Graph, Node};

impl Graph {
    /// Builds the linear graph `start -> r1 -> ... -> rn -> end`, with 1-based residue positions (the start sentinel
    /// sits at position 0, and the end sentinel at `n + 1`)
    pub fn canonical(accession: impl Into<String>, sequence: &str) -> Self {
        let mut graph = Self::new(accession);
        let accession = graph.accession.clone();

        let start = graph.add_node(Node::new("", &accession).with_position(0));
        graph.set_start(start);

        let mut previous = start;
        let mut position = 0;
        for residue in sequence.chars() {
            position += 1;
            let node = graph.add_node(Node::new(residue, &accession).with_position(position));
            graph.add_edge(previous, node, None, None);
            previous = node;
        }

        let end = graph.add_node(Node::new("", &accession).with_position(position + 1));
        graph.add_edge(previous, end, None, None);
        graph.set_end(end);

        graph
    }
}

#[cfg(test)]
mod tests {
    use crate::{NodeId, PathFilter};

    use super::*;

    fn spelled_paths(graph: &Graph) -> Vec<String> {
        graph
            .paths(&PathFilter::default())
            .map(|peptide| peptide.residues().to_owned())
            .collect()
    }

    #[test]
    fn canonical_graph() {
        let graph = Graph::canonical("P00001", "MAKPR");
        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.edge_count(), 6);
        assert_eq!(graph.start(), NodeId(0));
        assert_eq!(graph.end(), NodeId(6));

        let positions: Vec<_> = graph.nodes().map(|(_, n)| n.position()).collect();
        assert_eq!(positions, (0..=6).map(Some).collect::<Vec<_>>());
        assert!(graph.nodes().all(|(_, n)| n.accession() == "P00001"));
        assert_eq!(graph[graph.start()].residues(), "");
        assert_eq!(graph[graph.end()].residues(), "");

        assert_eq!(spelled_paths(&graph), ["MAKPR"]);
    }

    #[test]
    fn empty_sequence() {
        let graph = Graph::canonical("P00001", "");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge(graph.start(), graph.end()));
        assert_eq!(graph[graph.end()].position(), Some(1));
        assert_eq!(spelled_paths(&graph), [""]);
    }

    #[test]
    fn one_path_per_sequence() {
        for sequence in ["A", "AC", "MKWVTFISLLLLFSSAYS", "XXBZJUO"] {
            let graph = Graph::canonical("P00001", sequence);
            let paths: Vec<_> = graph.paths(&PathFilter::default()).collect();
            assert_eq!(paths.len(), 1);
            assert_eq!(paths[0].residues(), sequence);
            assert_eq!(paths[0].edges().len(), sequence.len() + 1);
        }
    }
}
