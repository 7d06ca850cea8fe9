//! Lazily enumerating the peptides spelled out by paths through the graph

// Standard Library Imports
use std::slice;

// External Crate Imports
use aminochem::{Mass, MassKind};

// Local Crate Imports
use crate::{EdgeId, Graph, NodeId};

// Public API ==========================================================================================================

/// Which paths are yielded by `Graph::paths`. Every bound is inclusive, and `None` leaves that quantity unbounded
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PathFilter {
    /// The fewest residues a peptide may have
    pub min_length: usize,
    /// Skip peptides containing an unknown residue (`X`)
    pub reject_unknown: bool,
    pub max_miscleavages: Option<usize>,
    pub min_mass: Option<Mass>,
    pub max_mass: Option<Mass>,
    /// Which mass the mass bounds apply to
    pub mass_kind: MassKind,
    /// The most nodes a path may visit between the sentinels, minus one. `Some(0)` only allows a direct edge from the
    /// start sentinel to the end sentinel
    pub max_hops: Option<usize>,
}

/// One path from the start sentinel to the end sentinel
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Peptide {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    residues: String,
    miscleavages: usize,
    mass: Option<Mass>,
}

/// A depth-first walk over every path from the start sentinel to the end sentinel, yielding those that pass a
/// `PathFilter`. Nothing is enumerated until the iterator is advanced, so callers can stop whenever they like
pub struct Paths<'g> {
    graph: &'g Graph,
    filter: PathFilter,
    frontier: Vec<slice::Iter<'g, EdgeId>>,
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    residues: String,
    prefixes: Vec<Prefix>,
}

impl Graph {
    #[must_use]
    pub fn paths(&self, filter: &PathFilter) -> Paths<'_> {
        Paths::new(self, filter.clone())
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            min_length: 0,
            reject_unknown: false,
            max_miscleavages: None,
            min_mass: None,
            max_mass: None,
            mass_kind: MassKind::Monoisotopic,
            max_hops: None,
        }
    }
}

impl Peptide {
    /// Every node along the path, sentinels included
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    #[must_use]
    pub fn residues(&self) -> &str {
        &self.residues
    }

    #[must_use]
    pub const fn miscleavages(&self) -> usize {
        self.miscleavages
    }

    /// The summed mass of every node along the path, if the graph has been annotated with masses
    #[must_use]
    pub const fn mass(&self) -> Option<Mass> {
        self.mass
    }
}

impl Iterator for Paths<'_> {
    type Item = Peptide;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(&edge) = self.frontier.last_mut()?.next() else {
                self.frontier.pop();
                self.retreat();
                continue;
            };

            if !self.advance(edge) {
                continue;
            }
            if self.nodes.last() == Some(&self.graph.end) {
                let peptide = self.accept();
                self.retreat();
                if peptide.is_some() {
                    return peptide;
                }
            } else {
                self.frontier.push(self.graph.outgoing(self.graph[edge].to).iter());
            }
        }
    }
}

// Private Types =======================================================================================================

/// Running totals for the path up to and including some node
#[derive(Copy, Clone, Debug)]
struct Prefix {
    residues: usize,
    miscleavages: usize,
    mass: Option<Mass>,
}

// Private Methods =====================================================================================================

impl<'g> Paths<'g> {
    fn new(graph: &'g Graph, filter: PathFilter) -> Self {
        let mut paths = Self {
            graph,
            filter,
            frontier: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            residues: String::new(),
            prefixes: Vec::new(),
        };

        if let Some(start) = graph.node(graph.start) {
            paths.residues.push_str(&start.residues);
            paths.nodes.push(graph.start);
            paths.prefixes.push(Prefix {
                residues: paths.residues.len(),
                miscleavages: 0,
                mass: start.mass(paths.filter.mass_kind),
            });
            paths.frontier.push(graph.outgoing(graph.start).iter());
        }
        paths
    }

    /// Extends the current path along `edge`, unless doing so would break one of the monotonic bounds
    fn advance(&mut self, id: EdgeId) -> bool {
        let (graph, filter) = (self.graph, &self.filter);
        let edge = &graph[id];
        // SAFETY: `prefixes` always has an entry for every node of the current path, including the start sentinel
        let prefix = *self.prefixes.last().unwrap();

        if filter.max_hops.is_some_and(|max| self.edges.len() > max) {
            return false;
        }
        let miscleavages = prefix.miscleavages + usize::from(edge.cleaved == Some(true));
        if filter.max_miscleavages.is_some_and(|max| miscleavages > max) {
            return false;
        }

        let node = &graph[edge.to];
        let kind = filter.mass_kind;
        // NOTE: `mass_to_end` includes the node itself, so this is the lightest path that could ever be completed
        if let (Some(max), Some(mass), Some(suffix)) = (filter.max_mass, prefix.mass, node.mass_to_end(kind)) {
            if mass + suffix > max {
                return false;
            }
        }

        self.residues.push_str(&node.residues);
        self.edges.push(id);
        self.nodes.push(edge.to);
        self.prefixes.push(Prefix {
            residues: self.residues.len(),
            miscleavages,
            mass: prefix.mass.zip(node.mass(kind)).map(|(a, b)| a + b),
        });
        true
    }

    /// Steps back over the last node of the current path
    fn retreat(&mut self) {
        self.nodes.pop();
        self.edges.pop();
        self.prefixes.pop();
        let residues = self.prefixes.last().map_or(0, |prefix| prefix.residues);
        self.residues.truncate(residues);
    }

    /// Applies the remaining filters to the just-completed path
    fn accept(&self) -> Option<Peptide> {
        let filter = &self.filter;
        // SAFETY: A completed path always contains both sentinels
        let prefix = self.prefixes.last().unwrap();

        if self.residues.chars().count() < filter.min_length {
            return None;
        }
        if filter.reject_unknown && self.residues.contains('X') {
            return None;
        }
        if filter.max_miscleavages.is_some_and(|max| prefix.miscleavages > max) {
            return None;
        }
        if let Some(mass) = prefix.mass {
            let too_light = filter.min_mass.is_some_and(|min| mass < min);
            let too_heavy = filter.max_mass.is_some_and(|max| mass > max);
            if too_light || too_heavy {
                return None;
            }
        }

        Some(Peptide {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            residues: self.residues.clone(),
            miscleavages: prefix.miscleavages,
            mass: prefix.mass,
        })
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use aminochem::{Enzyme, MassTable};
    use once_cell::sync::Lazy;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    static TABLE: Lazy<MassTable> = Lazy::new(MassTable::default);

    fn peptides(graph: &Graph, filter: &PathFilter) -> Vec<String> {
        let mut peptides: Vec<_> = graph.paths(filter).map(|p| p.residues().to_owned()).collect();
        peptides.sort();
        peptides
    }

    fn digested(sequence: &str) -> Graph {
        let mut graph = Graph::canonical("P00001", sequence);
        graph.digest(Enzyme::Trypsin);
        graph
    }

    #[test]
    fn canonical_path() {
        let graph = Graph::canonical("P00001", "MAKPR");
        let paths: Vec<_> = graph.paths(&PathFilter::default()).collect();
        assert_eq!(paths.len(), 1);

        let peptide = &paths[0];
        assert_eq!(peptide.residues(), "MAKPR");
        assert_eq!(peptide.nodes().len(), 7);
        assert_eq!(peptide.edges().len(), 6);
        assert_eq!(peptide.nodes().first(), Some(&graph.start()));
        assert_eq!(peptide.nodes().last(), Some(&graph.end()));
        assert_eq!(peptide.miscleavages(), 0);
        assert_eq!(peptide.mass(), None);
    }

    #[test]
    fn max_hops() {
        let mut graph = Graph::canonical("P00001", "AC");
        let (start, end) = (graph.start(), graph.end());
        graph.add_edge(start, end, None, None);

        let hops = |max_hops| PathFilter {
            max_hops,
            ..PathFilter::default()
        };
        assert_eq!(peptides(&graph, &hops(None)), ["", "AC"]);
        assert_eq!(peptides(&graph, &hops(Some(0))), [""]);
        assert_eq!(peptides(&graph, &hops(Some(1))), [""]);
        assert_eq!(peptides(&graph, &hops(Some(2))), ["", "AC"]);

        // Without a direct edge between the sentinels, nothing is short enough
        let graph = Graph::canonical("P00001", "A");
        assert!(peptides(&graph, &hops(Some(0))).is_empty());
        assert_eq!(peptides(&graph, &hops(Some(1))), ["A"]);
    }

    #[test]
    fn max_miscleavages() {
        let graph = digested("MAKWRPGRC");
        let miscleavages = |max_miscleavages| PathFilter {
            max_miscleavages,
            ..PathFilter::default()
        };
        assert_eq!(peptides(&graph, &miscleavages(Some(0))), ["C", "MAK", "WRPGR"]);
        assert_eq!(
            peptides(&graph, &miscleavages(Some(1))),
            ["C", "MAK", "MAKWRPGR", "WRPGR", "WRPGRC"]
        );
        assert_eq!(graph.paths(&miscleavages(None)).count(), 6);
        assert!(graph.paths(&miscleavages(Some(1))).all(|p| p.miscleavages() <= 1));
    }

    #[test]
    fn length_and_unknown_residues() {
        let graph = digested("MKAXR");
        assert_eq!(peptides(&graph, &PathFilter::default()), ["AXR", "MK", "MKAXR"]);

        let filter = PathFilter {
            reject_unknown: true,
            ..PathFilter::default()
        };
        assert_eq!(peptides(&graph, &filter), ["MK"]);

        let filter = PathFilter {
            min_length: 3,
            ..PathFilter::default()
        };
        assert_eq!(peptides(&graph, &filter), ["AXR", "MKAXR"]);
    }

    #[test]
    fn mass_bounds() {
        let mut graph = digested("GKAR");
        let bounded = |min_mass: Option<Decimal>, max_mass: Option<Decimal>| PathFilter {
            min_mass: min_mass.map(Mass::new),
            max_mass: max_mass.map(Mass::new),
            ..PathFilter::default()
        };

        // Mass bounds are ignored until the graph has masses
        assert_eq!(peptides(&graph, &bounded(Some(dec!(1000)), None)).len(), 3);

        graph.annotate_masses(&TABLE).unwrap();
        let masses: Vec<_> = graph.paths(&PathFilter::default()).map(|p| p.mass()).collect();
        assert!(masses.contains(&Some(Mass::new(dec!(412.254652)))));

        assert!(peptides(&graph, &bounded(Some(dec!(1000)), None)).is_empty());
        assert_eq!(peptides(&graph, &bounded(None, Some(dec!(300)))), ["AR", "GK"]);
        assert_eq!(peptides(&graph, &bounded(Some(dec!(200)), None)), ["AR", "GKAR"]);
        assert_eq!(
            peptides(&graph, &bounded(Some(dec!(185.116427)), Some(dec!(227.138225)))),
            ["AR", "GK"]
        );

        // Pruning with suffix masses never changes which paths are yielded
        graph.annotate_suffix_masses(&TABLE).unwrap();
        assert!(peptides(&graph, &bounded(Some(dec!(1000)), None)).is_empty());
        assert_eq!(peptides(&graph, &bounded(None, Some(dec!(300)))), ["AR", "GK"]);
        assert!(peptides(&graph, &bounded(None, Some(dec!(100)))).is_empty());
    }

    #[test]
    fn enumeration_is_lazy() {
        // 2^131 paths, far too many to ever enumerate
        let mut graph = Graph::canonical("P00001", &"A".repeat(130));
        let edges: Vec<_> = graph.edges().map(|(_, e)| (e.from(), e.to())).collect();
        for (from, to) in edges {
            graph.add_edge(from, to, None, None);
        }

        let mut paths = graph.paths(&PathFilter::default());
        let first = paths.next().unwrap();
        let second = paths.next().unwrap();
        assert_eq!(first.residues(), second.residues());
        assert_ne!(first.edges(), second.edges());
    }
}
