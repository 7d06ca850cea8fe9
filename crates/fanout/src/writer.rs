//! Threads that own output files, so that workers never write to a file directly

// Standard Library Imports
use std::{
    collections::hash_map::Entry,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

// External Crate Imports
use ahash::{AHashMap, AHashSet};
use proteograph::Statistics;

// Local Crate Imports
use crate::{Error, Result};

// Public API ==========================================================================================================

/// A handle for writing to files shared between workers. Writes to each file land in the order they were sent
#[derive(Clone, Debug)]
pub struct SharedFiles {
    sender: Sender<Message<FileWrite>>,
}

impl SharedFiles {
    pub fn append(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.send(path.into(), bytes.into(), false)
    }

    /// Writes `bytes` only if nothing has been written to `path` with `write_once` yet. Meant for headers, which every
    /// worker sends before its first row, but which should only appear once
    pub fn write_once(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.send(path.into(), bytes.into(), true)
    }

    fn send(&self, path: PathBuf, bytes: Vec<u8>, once: bool) -> Result<()> {
        self.sender
            .send(Message::Write(FileWrite { path, bytes, once }))
            .map_err(|_| Error::Disconnected(FILE_WRITER))
    }
}

// Crate API ===========================================================================================================

#[derive(Debug)]
pub(crate) enum Message<T> {
    Write(T),
    Stop,
}

pub(crate) struct WriterThread<T> {
    name: &'static str,
    sender: Sender<Message<T>>,
    handle: JoinHandle<Result<()>>,
}

impl<T> WriterThread<T> {
    pub fn sender(&self) -> Sender<Message<T>> {
        self.sender.clone()
    }

    /// Sends the stop sentinel, then waits for everything already sent to be written and flushed
    pub fn stop(self) -> Result<()> {
        // NOTE: If the thread has already exited, the error it exited with is returned by `join` below
        let _ = self.sender.send(Message::Stop);
        self.handle.join().map_err(|_| Error::Panicked(self.name))?
    }
}

pub(crate) fn spawn_file_writer() -> (SharedFiles, WriterThread<FileWrite>) {
    let (sender, receiver) = mpsc::channel();
    let handle = thread::spawn(move || write_files(&receiver));
    let files = SharedFiles {
        sender: sender.clone(),
    };
    let thread = WriterThread {
        name: FILE_WRITER,
        sender,
        handle,
    };
    (files, thread)
}

pub(crate) fn spawn_statistics_writer(path: PathBuf) -> WriterThread<Statistics> {
    let (sender, receiver) = mpsc::channel();
    let handle = thread::spawn(move || write_statistics(&path, &receiver));
    WriterThread {
        name: STATISTICS_WRITER,
        sender,
        handle,
    }
}

pub(crate) const STATISTICS_WRITER: &str = "statistics writer";

// Private Types =======================================================================================================

const FILE_WRITER: &str = "shared file writer";

#[derive(Debug)]
pub(crate) struct FileWrite {
    path: PathBuf,
    bytes: Vec<u8>,
    once: bool,
}

// Private Functions ===================================================================================================

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::WriteFile {
        path: path.to_owned(),
        source,
    }
}

// NOTE: A closed channel means that every sender is gone, so it's treated like `Message::Stop`
fn write_files(receiver: &Receiver<Message<FileWrite>>) -> Result<()> {
    let mut files: AHashMap<PathBuf, BufWriter<File>> = AHashMap::new();
    let mut written_once: AHashSet<PathBuf> = AHashSet::new();

    while let Ok(Message::Write(FileWrite { path, bytes, once })) = receiver.recv() {
        if once && !written_once.insert(path.clone()) {
            continue;
        }
        let file = match files.entry(path.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = File::create(&path).map_err(write_error(&path))?;
                entry.insert(BufWriter::new(file))
            }
        };
        file.write_all(&bytes).map_err(write_error(&path))?;
    }

    for (path, mut file) in files {
        file.flush().map_err(write_error(&path))?;
    }
    Ok(())
}

fn write_statistics(path: &Path, receiver: &Receiver<Message<Statistics>>) -> Result<()> {
    let file = File::create(path).map_err(write_error(path))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    while let Ok(Message::Write(statistics)) = receiver.recv() {
        writer.serialize(statistics)?;
    }
    writer.flush().map_err(write_error(path))
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use std::fs;

    use indoc::indoc;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn shared_files() {
        let directory = tempdir().unwrap();
        let (first, second) = (directory.path().join("first.txt"), directory.path().join("second.txt"));

        let (files, thread) = spawn_file_writer();
        let other = files.clone();
        files.write_once(&first, "header\n").unwrap();
        files.append(&first, "one\n").unwrap();
        other.write_once(&first, "header\n").unwrap();
        other.append(&first, "two\n").unwrap();
        other.append(&second, "three\n").unwrap();
        thread.stop().unwrap();

        assert_eq!(fs::read_to_string(&first).unwrap(), "header\none\ntwo\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "three\n");

        // Once the writer has stopped, nothing else can be sent
        assert!(matches!(files.append(&second, "four\n"), Err(Error::Disconnected(_))));
    }

    #[test]
    fn statistics_files() {
        let directory = tempdir().unwrap();
        let path = directory.path().join("statistics.csv");

        let thread = spawn_statistics_writer(path.clone());
        let sender = thread.sender();
        for (accession, nodes) in [("P00001", 7), ("P00002", 3)] {
            let statistics = Statistics {
                accession: accession.to_owned(),
                nodes,
                miscleavages: Some(vec![3, 2, 1]),
                ..Statistics::default()
            };
            sender.send(Message::Write(statistics)).unwrap();
        }
        thread.stop().unwrap();

        let expected = indoc! {"
            accession,entry_name,isoforms,init_met,signal,propep,peptide,chain,variant,mutagen,conflict,skipped_features,replaced_residues,fixed_modifications,variable_modifications,cleavages,nodes,edges,path_count,miscleavages,hops,feature_distributions
            P00001,,0,0,0,0,0,0,0,0,0,0,0,0,0,0,7,0,,3;2;1,,
            P00002,,0,0,0,0,0,0,0,0,0,0,0,0,0,0,3,0,,3;2;1,,
        "};
        assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }
}
