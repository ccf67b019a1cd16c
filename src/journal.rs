//! # Journal: persistence boundary of the catalog
//!
//! A [`Journal`] receives the entries that changed since the previous checkpoint
//! (see [`Catalog::journal_entries`](crate::catalog::Catalog::journal_entries)).
//! The catalog flushes after every dataset, so a failure in a later dataset never
//! loses the data already ingested.
//!
//! ## Implementations
//! -----------------
//! * [`MemoryJournal`]: keeps the last committed snapshot of every entry in memory.
//! * [`JsonDirJournal`]: one pretty-printed JSON document per entry in a directory.
//!   Files are written to a temporary sibling then renamed, so a reader never sees a
//!   half-written entry.
use std::{
    collections::BTreeMap,
    fs,
    io::{BufWriter, Write},
};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, trace};

use crate::{catalog::entry::Entry, catalog_errors::CatalogError};

pub trait Journal {
    /// Persist the current state of `entry`, replacing any previous snapshot.
    fn commit(&mut self, entry: &Entry) -> Result<(), CatalogError>;

    /// Forget the entry called `name`, absorbed into another entry by a merge.
    fn retire(&mut self, name: &str) -> Result<(), CatalogError>;

    /// Mark the end of a batch of commits.
    fn checkpoint(&mut self) -> Result<(), CatalogError>;
}

#[derive(Debug, Default)]
pub struct MemoryJournal {
    snapshots: BTreeMap<String, Entry>,
    checkpoints: usize,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.snapshots.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of checkpoints taken so far.
    pub fn checkpoints(&self) -> usize {
        self.checkpoints
    }
}

impl Journal for MemoryJournal {
    fn commit(&mut self, entry: &Entry) -> Result<(), CatalogError> {
        self.snapshots.insert(entry.name().to_string(), entry.clone());
        Ok(())
    }

    fn retire(&mut self, name: &str) -> Result<(), CatalogError> {
        self.snapshots.remove(name);
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<(), CatalogError> {
        self.checkpoints += 1;
        Ok(())
    }
}

/// File name used for an entry.
///
/// Path separators, `:`, whitespace, control characters and `%` itself are
/// percent-encoded byte by byte, so that two entry names never share a file:
/// `"SDSS-II 19190"` → `"SDSS-II%2019190.json"`, `"MLS/110213"` → `"MLS%2F110213.json"`.
pub fn entry_file_name(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '%' | '/' | '\\' | ':') || c.is_whitespace() || c.is_control() {
            let mut utf8 = [0; 4];
            for byte in c.encode_utf8(&mut utf8).bytes() {
                stem.push_str(&format!("%{byte:02X}"));
            }
        } else {
            stem.push(c);
        }
    }
    format!("{stem}.json")
}

#[derive(Debug)]
pub struct JsonDirJournal {
    dir: Utf8PathBuf,
    written: usize,
}

impl JsonDirJournal {
    /// Open a journal writing into `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Utf8Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(JsonDirJournal { dir, written: 0 })
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of the document holding the entry `name`.
    pub fn entry_path(&self, name: &str) -> Utf8PathBuf {
        self.dir.join(entry_file_name(name))
    }
}

impl Journal for JsonDirJournal {
    fn commit(&mut self, entry: &Entry) -> Result<(), CatalogError> {
        let path = self.entry_path(entry.name());
        let tmp = path.with_extension("json.tmp");

        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, entry)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;

        trace!(entry = entry.name(), path = %path, "entry written");
        self.written += 1;
        Ok(())
    }

    fn retire(&mut self, name: &str) -> Result<(), CatalogError> {
        let path = self.entry_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn checkpoint(&mut self) -> Result<(), CatalogError> {
        debug!(dir = %self.dir, written = self.written, "journal checkpoint");
        self.written = 0;
        Ok(())
    }
}
