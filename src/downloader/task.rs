//! A single file to fetch

use crate::archive::path::checksum_file_name;

/// One archive file the orchestrator decided to download
///
/// Immutable once built. `want_checksum` is false when the sidecar already
/// exists locally or checksums were not requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    remote_path: String,
    file_name: String,
    want_checksum: bool,
}

impl DownloadTask {
    /// Create a task
    pub fn new(remote_path: impl Into<String>, file_name: impl Into<String>, want_checksum: bool) -> Self {
        Self {
            remote_path: remote_path.into(),
            file_name: file_name.into(),
            want_checksum,
        }
    }

    /// Remote directory path, with trailing `/`
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Archive file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether the checksum sidecar should be fetched too
    pub fn want_checksum(&self) -> bool {
        self.want_checksum
    }

    /// Name of the checksum sidecar
    pub fn checksum_file_name(&self) -> String {
        checksum_file_name(&self.file_name)
    }
}
