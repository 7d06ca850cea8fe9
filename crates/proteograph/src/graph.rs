// Standard Library Imports
use std::{collections::VecDeque, ops::Index, sync::Arc};

// External Crate Imports
use aminochem::Mass;

// Local Crate Imports
use crate::{
    Edge, EdgeId, Feature, Graph, GraphError, MassKind, Masses, Node, NodeId, Qualifier, Result,
};

// Public API ==========================================================================================================

impl Graph {
    #[must_use]
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// The current source sentinel. Terminus modifications can replace it with a new one
    #[must_use]
    pub const fn start(&self) -> NodeId {
        self.start
    }

    /// The current sink sentinel. Terminus modifications can replace it with a new one
    #[must_use]
    pub const fn end(&self) -> NodeId {
        self.end
    }

    #[must_use]
    pub fn is_sentinel(&self, id: NodeId) -> bool {
        id == self.start || id == self.end
    }

    #[must_use]
    pub const fn is_digested(&self) -> bool {
        self.digested
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)?.as_ref()
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)?.as_ref()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| Some((NodeId(id), node.as_ref()?)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(id, edge)| Some((EdgeId(id), edge.as_ref()?)))
    }

    #[must_use]
    pub fn outgoing(&self, id: NodeId) -> &[EdgeId] {
        self.outgoing.get(id.0).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn incoming(&self, id: NodeId) -> &[EdgeId] {
        self.incoming.get(id.0).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing(id).iter().map(|&e| self[e].to)
    }

    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming(id).iter().map(|&e| self[e].from)
    }

    #[must_use]
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.successors(from).any(|s| s == to)
    }

    /// Orders every node so that edges only ever point forward, using Kahn's algorithm
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let mut in_degrees: Vec<_> = self.incoming.iter().map(Vec::len).collect();
        let mut ready: VecDeque<_> = self
            .nodes()
            .filter(|&(id, _)| in_degrees[id.0] == 0)
            .map(|(id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for successor in self.successors(id) {
                in_degrees[successor.0] -= 1;
                if in_degrees[successor.0] == 0 {
                    ready.push_back(successor);
                }
            }
        }

        if order.len() == self.node_count() {
            Ok(order)
        } else {
            let nodes = self
                .nodes()
                .filter(|&(id, _)| in_degrees[id.0] > 0)
                .map(|(id, _)| id)
                .collect();
            Err(GraphError::Cycle {
                accession: self.accession.clone(),
                nodes,
            })
        }
    }

    /// Checks that the sentinels still bound the graph: nothing may enter the start, and nothing may leave the end
    pub fn check_sentinels(&self) -> Result<()> {
        let broken = |sentinel, node, problem| GraphError::BrokenSentinel {
            accession: self.accession.clone(),
            sentinel,
            node,
            problem,
        };

        if self.node(self.start).is_none() {
            return Err(broken("start", self.start, "been removed"));
        }
        if self.node(self.end).is_none() {
            return Err(broken("end", self.end, "been removed"));
        }
        if !self.incoming(self.start).is_empty() {
            return Err(broken("start", self.start, "incoming edges"));
        }
        if !self.outgoing(self.end).is_empty() {
            return Err(broken("end", self.end, "outgoing edges"));
        }
        Ok(())
    }
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.node(id)
            .unwrap_or_else(|| panic!("node {id} has been removed from the graph"))
    }
}

impl Index<EdgeId> for Graph {
    type Output = Edge;

    fn index(&self, id: EdgeId) -> &Self::Output {
        self.edge(id)
            .unwrap_or_else(|| panic!("edge {id} has been removed from the graph"))
    }
}

impl Node {
    #[must_use]
    pub fn residues(&self) -> &str {
        &self.residues
    }

    #[must_use]
    pub const fn position(&self) -> Option<u32> {
        self.position
    }

    #[must_use]
    pub fn accession(&self) -> &str {
        &self.accession
    }

    #[must_use]
    pub fn isoform_accession(&self) -> Option<&str> {
        self.isoform_accession.as_deref()
    }

    #[must_use]
    pub const fn isoform_position(&self) -> Option<u32> {
        self.isoform_position
    }

    #[must_use]
    pub const fn delta_mass(&self) -> Option<Mass> {
        self.delta_mass
    }

    #[must_use]
    pub fn mass(&self, kind: MassKind) -> Option<Mass> {
        self.mass.map(|m| m.get(kind))
    }

    /// The smallest total mass of any path from this node to the end sentinel, this node included
    #[must_use]
    pub fn mass_to_end(&self, kind: MassKind) -> Option<Mass> {
        self.mass_to_end.map(|m| m.get(kind))
    }
}

impl Edge {
    #[must_use]
    pub const fn from(&self) -> NodeId {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> NodeId {
        self.to
    }

    #[must_use]
    pub const fn cleaved(&self) -> Option<bool> {
        self.cleaved
    }

    #[must_use]
    pub fn qualifiers(&self) -> Option<&[Qualifier]> {
        self.qualifiers.as_deref()
    }
}

// Crate API ===========================================================================================================

impl Graph {
    pub(crate) fn new(accession: impl Into<String>) -> Self {
        Self {
            accession: accession.into(),
            start: NodeId(0),
            end: NodeId(0),
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            digested: false,
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0]
            .as_mut()
            .unwrap_or_else(|| panic!("node {id} has been removed from the graph"))
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        self.edges[id.0]
            .as_mut()
            .unwrap_or_else(|| panic!("edge {id} has been removed from the graph"))
    }

    pub(crate) fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    pub(crate) fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        cleaved: Option<bool>,
        qualifiers: Option<Vec<Qualifier>>,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Some(Edge {
            from,
            to,
            cleaved,
            qualifiers,
        }));
        self.outgoing[from.0].push(id);
        self.incoming[to.0].push(id);
        id
    }

    /// Adds an edge that isn't the product of digestion. Once a graph is digested, every new edge is uncleaved
    pub(crate) fn add_plain_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        qualifiers: Option<Vec<Qualifier>>,
    ) -> EdgeId {
        let cleaved = self.digested.then_some(false);
        self.add_edge(from, to, cleaved, qualifiers)
    }

    pub(crate) fn remove_edges(&mut self, ids: impl IntoIterator<Item = EdgeId>) {
        for id in ids {
            if let Some(edge) = self.edges.get_mut(id.0).and_then(Option::take) {
                self.outgoing[edge.from.0].retain(|&e| e != id);
                self.incoming[edge.to.0].retain(|&e| e != id);
            }
        }
    }

    /// Removes nodes along with every edge touching them
    pub(crate) fn remove_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            if self.nodes.get_mut(id.0).and_then(Option::take).is_some() {
                let incident: Vec<_> = self.outgoing[id.0]
                    .iter()
                    .chain(&self.incoming[id.0])
                    .copied()
                    .collect();
                self.remove_edges(incident);
            }
        }
    }

    pub(crate) fn set_start(&mut self, id: NodeId) {
        self.start = id;
    }

    pub(crate) fn set_end(&mut self, id: NodeId) {
        self.end = id;
    }

    pub(crate) fn mark_digested(&mut self) {
        self.digested = true;
    }
}

impl Node {
    pub(crate) fn new(residues: impl Into<String>, accession: impl Into<String>) -> Self {
        Self {
            residues: residues.into(),
            position: None,
            accession: accession.into(),
            isoform_accession: None,
            isoform_position: None,
            delta_mass: None,
            mass: None,
            mass_to_end: None,
        }
    }

    pub(crate) const fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub(crate) fn with_isoform(mut self, accession: Option<&str>, position: Option<u32>) -> Self {
        self.isoform_accession = accession.map(str::to_owned);
        self.isoform_position = position;
        self
    }

    /// A copy of this node with `residues` and `delta` swapped in, keeping its positional attributes
    pub(crate) fn derive(&self, residues: impl Into<String>, delta: Option<Mass>) -> Self {
        Self {
            residues: residues.into(),
            delta_mass: delta,
            mass: None,
            mass_to_end: None,
            ..self.clone()
        }
    }

    pub(crate) fn add_delta(&mut self, delta: Mass) {
        self.delta_mass = Some(self.delta_mass.unwrap_or_default() + delta);
    }
}

impl Masses {
    pub(crate) const fn get(self, kind: MassKind) -> Mass {
        match kind {
            MassKind::Monoisotopic => self.monoisotopic,
            MassKind::Average => self.average,
        }
    }
}

/// Copies `qualifiers`, then appends `feature`
pub(crate) fn with_feature(qualifiers: Option<&[Qualifier]>, feature: &Arc<Feature>) -> Vec<Qualifier> {
    let mut qualifiers = qualifiers.map(<[_]>::to_vec).unwrap_or_default();
    qualifiers.push(Qualifier::Feature(Arc::clone(feature)));
    qualifiers
}

// Module Tests ========================================================================================================
