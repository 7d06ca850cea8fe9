//! Builds protein graphs for a stream of entries in parallel, writing statistics and exports from dedicated threads

pub mod errors;
pub mod exporters;
mod pipeline;
mod source;
mod writer;

pub use errors::{Error, Result};
pub use exporters::{DotExporter, ExportTarget, Exporter, PeptideCsvExporter};
pub use pipeline::{Pipeline, Summary};
pub use source::JsonLinesSource;
pub use writer::SharedFiles;
