use aminochem::ReplacementRule;

use crate::Graph;

impl Graph {
    /// Applies each rule in turn, replacing every lone `source` residue with one new node per target. Later rules see
    /// the nodes created by earlier ones, so rules can be chained. Returns the number of nodes replaced
    pub fn substitute_residues(&mut self, rules: &[ReplacementRule]) -> usize {
        rules.iter().map(|rule| self.apply_replacement(rule)).sum()
    }

    fn apply_replacement(&mut self, rule: &ReplacementRule) -> usize {
        let source = rule.source.to_string();
        let matching: Vec<_> = self
            .nodes()
            .filter(|&(id, node)| !self.is_sentinel(id) && node.residues == source)
            .map(|(id, _)| id)
            .collect();

        for &original in &matching {
            // NOTE: Adjacency is re-read for every node, so that runs of matching residues are wired to the
            // replacements of their neighbours, and not just to the originals that are about to be removed
            let incoming: Vec<_> = self.incoming(original).iter().map(|&e| self[e].clone()).collect();
            let outgoing: Vec<_> = self.outgoing(original).iter().map(|&e| self[e].clone()).collect();

            for &target in &rule.targets {
                let replacement = self[original].derive(target, self[original].delta_mass);
                let replacement = self.add_node(replacement);
                for edge in &incoming {
                    self.add_edge(edge.from, replacement, edge.cleaved, edge.qualifiers.clone());
                }
                for edge in &outgoing {
                    self.add_edge(replacement, edge.to, edge.cleaved, edge.qualifiers.clone());
                }
            }
        }

        self.remove_nodes(matching.iter().copied());
        matching.len()
    }
}
