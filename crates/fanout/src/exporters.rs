//! Exporters read finished graphs through their attributes, and write what they find through `SharedFiles`

// Standard Library Imports
use std::path::PathBuf;

// External Crate Imports
use itertools::Itertools;
use proteograph::{Attr, Graph, PathFilter, Peptide, ProteinGraph};
use serde::Serialize;

// Local Crate Imports
use crate::{Error, Result, SharedFiles};

// Public API ==========================================================================================================

/// Every worker builds its own exporters, which see each protein that worker builds
pub trait Exporter: Send {
    fn export(&mut self, protein: &ProteinGraph, files: &SharedFiles) -> Result<()>;

    /// Called once the worker has run out of proteins
    fn finish(&mut self, _files: &SharedFiles) -> Result<()> {
        Ok(())
    }
}

/// Where, and in what format, to export every protein's graph
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ExportTarget {
    Dot(PathBuf),
    PeptideCsv(PathBuf, PathFilter),
}

/// Writes every graph to the same file, one `digraph` per protein
#[derive(Clone, Debug)]
pub struct DotExporter {
    path: PathBuf,
}

/// Writes every peptide that passes a `PathFilter` to one CSV file, shared by every protein
#[derive(Clone, Debug)]
pub struct PeptideCsvExporter {
    path: PathBuf,
    filter: PathFilter,
    header_sent: bool,
}

impl ExportTarget {
    #[must_use]
    pub fn exporter(&self) -> Box<dyn Exporter> {
        match self {
            Self::Dot(path) => Box::new(DotExporter::new(path.clone())),
            Self::PeptideCsv(path, filter) => Box::new(PeptideCsvExporter::new(path.clone(), filter.clone())),
        }
    }
}

impl DotExporter {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Exporter for DotExporter {
    fn export(&mut self, protein: &ProteinGraph, files: &SharedFiles) -> Result<()> {
        files.append(&self.path, dot(protein.graph()))
    }
}

impl PeptideCsvExporter {
    const COLUMNS: [&'static str; 7] = [
        "accession",
        "peptide",
        "miscleavages",
        "mass",
        "position",
        "isoform",
        "qualifiers",
    ];

    #[must_use]
    pub const fn new(path: PathBuf, filter: PathFilter) -> Self {
        Self {
            path,
            filter,
            header_sent: false,
        }
    }
}

impl Exporter for PeptideCsvExporter {
    fn export(&mut self, protein: &ProteinGraph, files: &SharedFiles) -> Result<()> {
        if !self.header_sent {
            let mut header = csv::Writer::from_writer(Vec::new());
            header.write_record(Self::COLUMNS)?;
            files.write_once(&self.path, into_bytes(header)?)?;
            self.header_sent = true;
        }

        let graph = protein.graph();
        let mut rows = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        for peptide in graph.paths(&self.filter) {
            rows.serialize(PeptideRow::new(graph, &peptide))?;
        }
        let rows = into_bytes(rows)?;
        if rows.is_empty() {
            Ok(())
        } else {
            files.append(&self.path, rows)
        }
    }
}

/// Renders `graph` in the DOT language, with every attribute present on each node and edge
#[must_use]
pub fn dot(graph: &Graph) -> String {
    let nodes = graph
        .nodes()
        .map(|(id, node)| format!("    {id} [{}];\n", dot_attrs(node.attrs())));
    let edges = graph
        .edges()
        .map(|(_, edge)| format!("    {} -> {} [{}];\n", edge.from(), edge.to(), dot_attrs(edge.attrs())));

    format!("digraph {} {{\n{}}}\n", quoted(graph.accession()), nodes.chain(edges).collect::<String>())
}

// Private Types =======================================================================================================

#[derive(Serialize)]
struct PeptideRow<'g> {
    accession: &'g str,
    peptide: &'g str,
    miscleavages: usize,
    mass: Option<String>,
    position: String,
    isoform: String,
    qualifiers: String,
}

impl<'g> PeptideRow<'g> {
    fn new(graph: &'g Graph, peptide: &'g Peptide) -> Self {
        let first = peptide
            .nodes()
            .iter()
            .map(|&id| &graph[id])
            .find(|node| !node.residues().is_empty());
        let attr = |key| {
            first
                .and_then(|node| node.attr(key))
                .map(|value| value.to_string())
                .unwrap_or_default()
        };
        let qualifiers = peptide
            .edges()
            .iter()
            .filter_map(|&id| graph[id].qualifiers())
            .flatten()
            .join(",");

        Self {
            accession: attr_text(first.and_then(|node| node.attr("accession"))).unwrap_or(graph.accession()),
            peptide: peptide.residues(),
            miscleavages: peptide.miscleavages(),
            mass: peptide.mass().map(|mass| mass.to_string()),
            position: attr("position"),
            isoform: attr("isoform_accession"),
            qualifiers,
        }
    }
}

// Private Functions ===================================================================================================

fn attr_text(attr: Option<Attr<'_>>) -> Option<&str> {
    match attr? {
        Attr::Text(text) => Some(text),
        _ => None,
    }
}

fn dot_attrs<'g>(attrs: impl Iterator<Item = (&'static str, Attr<'g>)>) -> String {
    attrs
        .map(|(key, value)| format!("{key}={}", quoted(&value.to_string())))
        .join(", ")
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|error| Error::Csv(error.into_error().into()))
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use std::fs;

    use aminochem::Enzyme;
    use insta::assert_snapshot;
    use once_cell::sync::Lazy;
    use proteograph::{Entry, GraphOptions, MassTable};
    use tempfile::tempdir;

    use crate::writer::spawn_file_writer;

    use super::*;

    static TABLE: Lazy<MassTable> = Lazy::new(MassTable::default);

    #[test]
    fn dot_graphs() {
        let graph = Graph::canonical("P00001", "AC");
        assert_snapshot!(dot(&graph), @r#"
        digraph "P00001" {
            0 [residues="", position="0", accession="P00001", isoform_accession="", isoform_position=""];
            1 [residues="A", position="1", accession="P00001", isoform_accession="", isoform_position=""];
            2 [residues="C", position="2", accession="P00001", isoform_accession="", isoform_position=""];
            3 [residues="", position="3", accession="P00001", isoform_accession="", isoform_position=""];
            0 -> 1 [qualifiers=""];
            1 -> 2 [qualifiers=""];
            2 -> 3 [qualifiers=""];
        }
        "#);
    }

    #[test]
    fn quoting() {
        assert_eq!(quoted(r#"a "quoted" \ word"#), r#""a \"quoted\" \\ word""#);
    }

    #[test]
    fn peptide_rows() {
        let directory = tempdir().unwrap();
        let path = directory.path().join("peptides.csv");
        let entry = Entry {
            accessions: vec!["P00001".to_owned()],
            sequence: "MAKWRPGRC".to_owned(),
            ..Entry::default()
        };
        let options = GraphOptions {
            digestion: vec![Enzyme::Trypsin],
            ..GraphOptions::default()
        };
        let protein = ProteinGraph::from_entry(&entry, &options, &TABLE).unwrap();

        let target = ExportTarget::PeptideCsv(path.clone(), PathFilter {
            max_miscleavages: Some(1),
            ..PathFilter::default()
        });
        let (files, thread) = spawn_file_writer();
        let (mut first, mut second) = (target.exporter(), target.exporter());
        first.export(&protein, &files).unwrap();
        second.export(&protein, &files).unwrap();
        first.finish(&files).unwrap();
        thread.stop().unwrap();

        let csv = fs::read_to_string(&path).unwrap();
        let mut lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.remove(0), "accession,peptide,miscleavages,mass,position,isoform,qualifiers");
        lines.sort_unstable();
        assert_eq!(lines, [
            "P00001,C,0,,9,,",
            "P00001,C,0,,9,,",
            "P00001,MAK,0,,1,,",
            "P00001,MAK,0,,1,,",
            "P00001,MAKWRPGR,1,,1,,",
            "P00001,MAKWRPGR,1,,1,,",
            "P00001,WRPGR,0,,4,,",
            "P00001,WRPGR,0,,4,,",
            "P00001,WRPGRC,1,,4,,",
            "P00001,WRPGRC,1,,4,,",
        ]);
    }
}
