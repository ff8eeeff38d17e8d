//! Append-only JSON-lines journals behind the user and score stores.
//!
//! Writes go through a dedicated thread so request handlers never touch the
//! filesystem. Stores replay their journal once at startup.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("journal {path} line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// Background writer for one journal file.
#[derive(Debug)]
pub struct Journal<T> {
    path: PathBuf,
    // Taken on close() so the writer thread sees the channel hang up.
    sender: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
    handle: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
    _record: PhantomData<fn(&T)>,
}

impl<T> Clone for Journal<T> {
    fn clone(&self) -> Self {
        Journal {
            path: self.path.clone(),
            sender: Arc::clone(&self.sender),
            handle: Arc::clone(&self.handle),
            _record: PhantomData,
        }
    }
}

impl<T: Serialize> Journal<T> {
    pub fn open(path: PathBuf) -> Result<Self, JournalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| JournalError::Io {
                path: path.clone(),
                source,
            })?;
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let thread_path = path.clone();
        let handle = thread::spawn(move || {
            let mut writer = BufWriter::new(file);
            for line in rx {
                if let Err(e) = writer.write_all(&line).and_then(|_| writer.flush()) {
                    log::error!("journal {}: write failed: {e}", thread_path.display());
                }
            }
            let _ = writer.flush();
        });
        Ok(Journal {
            path,
            sender: Arc::new(Mutex::new(Some(tx))),
            handle: Arc::new(Mutex::new(Some(handle))),
            _record: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort: a closed journal or a serialization failure is logged, not returned.
    pub fn append(&self, record: &T) {
        let mut bytes = match serde_json::to_vec(record) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("journal {}: serialize failed: {e}", self.path.display());
                return;
            }
        };
        bytes.push(b'\n');
        let guard = match self.sender.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        };
        match &*guard {
            Some(tx) => {
                if tx.send(bytes).is_err() {
                    log::error!("journal {}: writer thread is gone", self.path.display());
                }
            }
            None => log::warn!("journal {}: append after close", self.path.display()),
        }
    }

    /// Drops the sender and joins the writer so every pending line is on disk. Idempotent.
    pub fn close(&self) {
        {
            let mut guard = match self.sender.lock() {
                Ok(g) => g,
                Err(e) => e.into_inner(),
            };
            *guard = None;
        }
        let handle = {
            let mut guard = match self.handle.lock() {
                Ok(g) => g,
                Err(e) => e.into_inner(),
            };
            guard.take()
        };
        if let Some(h) = handle {
            let _ = h.join();
        }
    }
}

/// Reads every record of a journal file. A missing file is an empty journal.
pub fn replay<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, JournalError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(JournalError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| JournalError::Corrupt {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Replays `name` inside `dir` and opens it for appending.
pub fn open_in<T: Serialize + DeserializeOwned>(
    dir: &Path,
    name: &str,
) -> Result<(Vec<T>, Journal<T>), JournalError> {
    std::fs::create_dir_all(dir).map_err(|source| JournalError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(name);
    let records = replay(&path)?;
    let journal = Journal::open(path)?;
    Ok((records, journal))
}
