//! Existing-file detection
//!
//! A save directory is listed once before its periods are walked. The
//! resulting [`ExistingFileSet`] is the only resume state: a file present by
//! name is considered done, without looking at its contents.

use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Names of the files already present in one save directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingFileSet {
    names: HashSet<String>,
}

impl ExistingFileSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `file_name` was present when the directory was scanned
    pub fn contains(&self, file_name: &str) -> bool {
        self.names.contains(file_name)
    }

    /// Number of names in the set
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExistingFileSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lists the files of a save directory
pub trait FileScanner: Send + Sync {
    /// Snapshot the file names in `dir`
    ///
    /// A missing directory is an empty set, not an error.
    fn scan(&self, dir: &Path) -> io::Result<ExistingFileSet>;
}

/// [`FileScanner`] over the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryScanner;

impl FileScanner for DirectoryScanner {
    fn scan(&self, dir: &Path) -> io::Result<ExistingFileSet> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ExistingFileSet::new()),
            Err(e) => return Err(e),
        };

        let mut names = HashSet::new();
        for entry in entries {
            let entry = entry?;
            // Non UTF-8 names can never match a generated archive name
            if let Ok(name) = entry.file_name().into_string() {
                names.insert(name);
            }
        }
        Ok(ExistingFileSet { names })
    }
}
