// Standard Library Imports
use std::io::{BufRead, Lines};

// External Crate Imports
use proteograph::Entry;

// Local Crate Imports
use crate::{Error, Result};

/// Reads one JSON-encoded `Entry` per line, skipping blank lines
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line += 1;
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(error) => return Some(Err(Error::ReadEntry(error))),
            };
            if line.trim().is_empty() {
                continue;
            }

            let entry = serde_json::from_str(&line).map_err(|source| Error::DecodeEntry {
                line: self.line,
                source,
            });
            return Some(entry);
        }
    }
}
