// External Crate Imports
use aminochem::Mass;

// Local Crate Imports
use crate::{Graph, GraphError, MassKind, MassTable, Masses, Result};

impl Graph {
    /// Annotates every node with the mass of its residues plus its delta mass
    pub(crate) fn annotate_masses(&mut self, table: &MassTable) -> Result<()> {
        let masses = self
            .nodes()
            .map(|(id, node)| -> Result<_> {
                let mass = |kind| -> Result<Mass> {
                    let residues = table.sequence_mass(&node.residues, kind).map_err(|residue| {
                        GraphError::UnknownResidue {
                            accession: self.accession.clone(),
                            node: id,
                            residue,
                        }
                    })?;
                    Ok(residues + node.delta_mass.unwrap_or_default())
                };
                Ok((id, Masses {
                    monoisotopic: mass(MassKind::Monoisotopic)?,
                    average: mass(MassKind::Average)?,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        for (id, mass) in masses {
            self.node_mut(id).mass = Some(mass);
        }
        Ok(())
    }

    /// Annotates every node with the smallest total mass of any path from it to the end sentinel, annotating the
    /// masses of nodes first if that hasn't been done yet
    pub(crate) fn annotate_suffix_masses(&mut self, table: &MassTable) -> Result<()> {
        if self.nodes().any(|(_, node)| node.mass.is_none()) {
            self.annotate_masses(table)?;
        }

        let mut suffixes: Vec<Option<Masses>> = vec![None; self.nodes.len()];
        suffixes[self.end.0] = Some(Masses::ZERO);
        for node in self.topological_order()?.into_iter().rev() {
            let Some(suffix) = suffixes[node.0] else {
                continue;
            };
            for source in self.predecessors(node) {
                // SAFETY: Every node was annotated with its mass above
                let candidate = suffix + self[source].mass.unwrap();
                let current = &mut suffixes[source.0];
                *current = Some(current.map_or(candidate, |existing| existing.min(candidate)));
            }
        }

        for (id, suffix) in suffixes.into_iter().enumerate() {
            if let Some(node) = self.nodes[id].as_mut() {
                node.mass_to_end = suffix;
            }
        }
        Ok(())
    }
}

impl Masses {
    const ZERO: Self = Self {
        monoisotopic: Mass::ZERO,
        average: Mass::ZERO,
    };

    /// The smaller of each kind of mass, which may not come from the same `Masses`
    fn min(self, other: Self) -> Self {
        Self {
            monoisotopic: self.monoisotopic.min(other.monoisotopic),
            average: self.average.min(other.average),
        }
    }
}
