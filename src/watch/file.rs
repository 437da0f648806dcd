//! # File-backed source.
//!
//! [`FileSource`] re-reads a JSON file on every listing. Handy for running the
//! controller without a cluster: edit the file, and the next poll reconciles.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{
    notification::Object,
    source::{SnapshotSource, decode_list},
};
use crate::error::WatchError;

/// Lists declarations from a JSON `List` or array stored in a file.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    /// Creates a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    /// File being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self) -> Result<Vec<Object>, WatchError> {
        let bytes = tokio::fs::read(&self.path).await?;
        decode_list(&bytes)
    }
}
