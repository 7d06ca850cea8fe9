// External Crate Imports
use log::debug;

// Local Crate Imports
use crate::{Axis, Entry, Graph, GraphOptions, MassTable, ProteinGraph, Result, Statistics};

impl ProteinGraph {
    /// Builds the graph of one protein, running every pass selected in `options` in order. An error means that a
    /// pass broke one of the graph's invariants, and that this protein should be skipped
    pub fn from_entry(entry: &Entry, options: &GraphOptions, table: &MassTable) -> Result<Self> {
        let accession = entry.accession();
        let mut graph = Graph::canonical(accession, &entry.sequence);
        let mut statistics = Statistics {
            accession: accession.to_owned(),
            entry_name: entry.entry_name.clone(),
            ..Statistics::default()
        };

        let features = graph.execute_features(entry, &options.features);
        statistics.record_features(&features);
        statistics.replaced_residues = graph.substitute_residues(&options.replacements);
        statistics.cleavages = options.digestion.iter().map(|&enzyme| graph.digest(enzyme)).sum();

        let modifications = graph.annotate_modifications(&options.modifications, table);
        statistics.fixed_modifications = modifications.fixed;
        statistics.variable_modifications = modifications.variable;

        if options.collapse_edges {
            let removed = graph.collapse_parallel_edges()?;
            debug!("{accession}: collapsed {removed} parallel edges");
        }
        if options.merge_chains {
            let merged = graph.merge_chains()?;
            debug!("{accession}: merged {merged} chains of nodes");
        }
        graph.check_sentinels()?;
        graph.topological_order()?;

        if options.suffix_masses {
            graph.annotate_suffix_masses(table)?;
        } else if options.masses {
            graph.annotate_masses(table)?;
        }

        statistics.nodes = graph.node_count();
        statistics.edges = graph.edge_count();

        let requested = &options.statistics;
        if requested.path_count {
            statistics.path_count = Some(graph.path_count()?);
        }
        if requested.miscleavages {
            statistics.miscleavages = Some(graph.distribution(Axis::Miscleavages)?);
        }
        if requested.hops {
            statistics.hops = Some(graph.distribution(Axis::Hops)?);
        }
        for &(kind, combinator) in &requested.features {
            let distribution = graph.distribution(Axis::Feature(kind, combinator))?;
            statistics.feature_distributions.insert((kind, combinator), distribution);
        }

        Ok(Self { graph, statistics })
    }

    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub const fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    #[must_use]
    pub fn into_statistics(self) -> Statistics {
        self.statistics
    }
}
