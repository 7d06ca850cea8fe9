// Standard Library Imports
use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex,
        mpsc::{self, Receiver, Sender, SyncSender},
    },
    thread::{self, JoinHandle},
};

// External Crate Imports
use log::{debug, error, warn};
use proteograph::{Entry, GraphOptions, MassTable, ProteinGraph, Statistics};

// Local Crate Imports
use crate::{
    Error, ExportTarget, Exporter, Result, SharedFiles,
    writer::{self, Message},
};

// Public API ==========================================================================================================

/// Builds a `ProteinGraph` for every entry it's given, spread over a pool of worker threads
#[derive(Clone, Debug)]
pub struct Pipeline {
    options: Arc<GraphOptions>,
    table: Arc<MassTable>,
    workers: usize,
    queue_capacity: usize,
    statistics: Option<PathBuf>,
    exports: Vec<ExportTarget>,
}

/// How many entries were read, how many of those produced a graph, and how many were skipped or failed
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Summary {
    pub read: usize,
    pub built: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Pipeline {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 25_000;

    /// Defaults to one worker fewer than there are cores, leaving one free for reading entries
    #[must_use]
    pub fn new(options: GraphOptions, table: MassTable) -> Self {
        let workers = thread::available_parallelism().map_or(1, |cores| cores.get().saturating_sub(1).max(1));
        Self {
            options: Arc::new(options),
            table: Arc::new(table),
            workers,
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            statistics: None,
            exports: Vec::new(),
        }
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// The most entries that may be waiting for a worker before reading blocks
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Writes one CSV row of statistics per protein to `path`
    #[must_use]
    pub fn statistics(mut self, path: impl Into<PathBuf>) -> Self {
        self.statistics = Some(path.into());
        self
    }

    #[must_use]
    pub fn export(mut self, target: ExportTarget) -> Self {
        self.exports.push(target);
        self
    }

    /// Feeds `entries` to the workers until they run out, or until one can't be read at all. Entries that can't be
    /// decoded are logged and skipped, as are proteins whose graphs fail to build
    pub fn run(&self, entries: impl IntoIterator<Item = Result<Entry>>) -> Result<Summary> {
        let (files, file_writer) = writer::spawn_file_writer();
        let statistics_writer = self.statistics.clone().map(writer::spawn_statistics_writer);
        let statistics = statistics_writer.as_ref().map(writer::WriterThread::sender);

        let (jobs, receiver) = mpsc::sync_channel(self.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let workers: Vec<_> = (0..self.workers)
            .map(|_| self.spawn_worker(Arc::clone(&receiver), files.clone(), statistics.clone()))
            .collect();
        // NOTE: Only the workers may hold on to the receiver, so that feeding stops if they all exit early
        drop((receiver, files, statistics));

        let (mut summary, fed) = feed(entries, &jobs);
        for _ in &workers {
            // NOTE: Sending only fails once every worker has already exited, and joining them reports why
            let _ = jobs.send(Job::Stop);
        }

        let mut worker_error = None;
        for worker in workers {
            match worker.join() {
                Ok(Ok(Tally { built, failed })) => {
                    summary.built += built;
                    summary.failed += failed;
                }
                Ok(Err(error)) => worker_error = worker_error.or(Some(error)),
                Err(_) => worker_error = worker_error.or(Some(Error::Panicked(WORKER))),
            }
        }

        let written = file_writer.stop();
        let stats_written = statistics_writer.map_or(Ok(()), writer::WriterThread::stop);
        written?;
        stats_written?;
        if let Some(error) = worker_error {
            return Err(error);
        }
        fed?;

        debug!("{summary:?}");
        Ok(summary)
    }
}

// Private Types =======================================================================================================

const WORKER: &str = "graph worker";

enum Job {
    Build(Entry),
    Stop,
}

#[derive(Default)]
struct Tally {
    built: usize,
    failed: usize,
}

struct Worker {
    options: Arc<GraphOptions>,
    table: Arc<MassTable>,
    exporters: Vec<Box<dyn Exporter>>,
    files: SharedFiles,
    statistics: Option<Sender<Message<Statistics>>>,
}

// Private Methods =====================================================================================================

impl Pipeline {
    fn spawn_worker(
        &self,
        jobs: Arc<Mutex<Receiver<Job>>>,
        files: SharedFiles,
        statistics: Option<Sender<Message<Statistics>>>,
    ) -> JoinHandle<Result<Tally>> {
        let mut worker = Worker {
            options: Arc::clone(&self.options),
            table: Arc::clone(&self.table),
            exporters: self.exports.iter().map(ExportTarget::exporter).collect(),
            files,
            statistics,
        };
        thread::spawn(move || worker.run(&jobs))
    }
}

impl Worker {
    fn run(&mut self, jobs: &Mutex<Receiver<Job>>) -> Result<Tally> {
        let mut tally = Tally::default();
        loop {
            // NOTE: The lock is released as soon as a job has been received, not once it's finished
            let job = jobs.lock().map_err(|_| Error::Panicked(WORKER))?.recv();
            let Ok(Job::Build(entry)) = job else {
                break;
            };

            match ProteinGraph::from_entry(&entry, &self.options, &self.table) {
                Ok(protein) => {
                    self.export(protein)?;
                    tally.built += 1;
                }
                Err(error) => {
                    error!("{}: {error}", entry.accession());
                    tally.failed += 1;
                }
            }
        }

        for exporter in &mut self.exporters {
            exporter.finish(&self.files)?;
        }
        Ok(tally)
    }

    fn export(&mut self, protein: ProteinGraph) -> Result<()> {
        for exporter in &mut self.exporters {
            exporter.export(&protein, &self.files)?;
        }
        if let Some(statistics) = &self.statistics {
            statistics
                .send(Message::Write(protein.into_statistics()))
                .map_err(|_| Error::Disconnected(writer::STATISTICS_WRITER))?;
        }
        Ok(())
    }
}

// Private Functions ===================================================================================================

/// Sends every readable entry to the workers. Returns early with an error if an entry couldn't be read at all
fn feed(entries: impl IntoIterator<Item = Result<Entry>>, jobs: &SyncSender<Job>) -> (Summary, Result<()>) {
    let mut summary = Summary::default();
    for entry in entries {
        summary.read += 1;
        match entry {
            Ok(entry) => {
                if jobs.send(Job::Build(entry)).is_err() {
                    return (summary, Err(Error::Disconnected(WORKER)));
                }
            }
            Err(error @ Error::DecodeEntry { .. }) => {
                warn!("skipping entry: {error}");
                summary.skipped += 1;
            }
            Err(error) => return (summary, Err(error)),
        }
    }
    (summary, Ok(()))
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use std::{fs, io};

    use aminochem::Enzyme;
    use indoc::indoc;
    use once_cell::sync::Lazy;
    use proteograph::{PathFilter, RawFeature, StatisticsOptions};
    use tempfile::tempdir;

    use crate::JsonLinesSource;

    use super::*;

    static TABLE: Lazy<MassTable> = Lazy::new(MassTable::default);

    fn entry(accession: &str, sequence: &str) -> Entry {
        Entry {
            accessions: vec![accession.to_owned()],
            sequence: sequence.to_owned(),
            ..Entry::default()
        }
    }

    fn pipeline() -> Pipeline {
        let options = GraphOptions {
            digestion: vec![Enzyme::Trypsin],
            statistics: StatisticsOptions {
                path_count: true,
                ..StatisticsOptions::default()
            },
            ..GraphOptions::default()
        };
        Pipeline::new(options, TABLE.clone())
    }

    #[test]
    fn statistics_for_every_protein() {
        let directory = tempdir().unwrap();
        let path = directory.path().join("statistics.csv");

        let entries: Vec<_> = (1..=100)
            .map(|i| Ok(entry(&format!("P{i:05}"), "MAKWRPGRC")))
            .collect();
        let summary = pipeline()
            .workers(4)
            .queue_capacity(8)
            .statistics(&path)
            .run(entries)
            .unwrap();
        assert_eq!(summary, Summary {
            read: 100,
            built: 100,
            failed: 0,
            skipped: 0,
        });

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let mut accessions: Vec<String> = reader
            .records()
            .map(|record| {
                let record = record.unwrap();
                assert_eq!(&record[18], "6");
                record[0].to_owned()
            })
            .collect();
        accessions.sort();
        let expected: Vec<_> = (1..=100).map(|i| format!("P{i:05}")).collect();
        assert_eq!(accessions, expected);
    }

    #[test]
    fn broken_entries_are_skipped() {
        let directory = tempdir().unwrap();
        let (statistics, dot) = (directory.path().join("statistics.csv"), directory.path().join("graphs.dot"));

        let mut broken = entry("P00003", "MAK");
        broken.features = vec![RawFeature::new("VARIANT", 7, 7, "K -> R")];
        let input = indoc! {r#"
            {"accessions": ["P00001"], "sequence": "MAK"}
            not an entry
            {"accessions": ["P00002"], "sequence": "AC"}
        "#};
        let entries = JsonLinesSource::new(input.as_bytes()).chain([Ok(broken)]);

        let summary = pipeline()
            .workers(2)
            .statistics(&statistics)
            .export(ExportTarget::Dot(dot.clone()))
            .export(ExportTarget::PeptideCsv(
                directory.path().join("peptides.csv"),
                PathFilter::default(),
            ))
            .run(entries)
            .unwrap();
        assert_eq!(summary.read, 4);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.built + summary.failed, 3);

        let graphs = fs::read_to_string(&dot).unwrap();
        assert_eq!(graphs.matches("digraph").count(), summary.built);
        assert!(graphs.contains(r#"digraph "P00001""#));
        assert!(graphs.contains(r#"digraph "P00002""#));

        let rows = csv::Reader::from_path(&statistics).unwrap().records().count();
        assert_eq!(rows, summary.built);
    }

    #[test]
    fn unreadable_input_stops_the_pipeline() {
        let entries = [
            Ok(entry("P00001", "MAK")),
            Err(Error::ReadEntry(io::Error::other("disk on fire"))),
            Ok(entry("P00002", "AC")),
        ];
        let error = pipeline().workers(2).run(entries).unwrap_err();
        assert!(matches!(error, Error::ReadEntry(_)));
    }
}
