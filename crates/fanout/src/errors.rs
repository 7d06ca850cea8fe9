use std::{io, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    #[error("failed to read the next entry")]
    ReadEntry(#[source] io::Error),

    #[diagnostic(help("every line should contain one complete, JSON-encoded entry"))]
    #[error("line {line} doesn't contain a valid entry")]
    DecodeEntry {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write to {path:?}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write a CSV record")]
    Csv(#[from] csv::Error),

    #[error("the {0} thread panicked")]
    Panicked(&'static str),

    #[diagnostic(help("this is usually caused by an earlier error in that thread"))]
    #[error("the {0} thread stopped before the pipeline finished")]
    Disconnected(&'static str),
}
