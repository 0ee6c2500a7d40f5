//! Startup-time cache of entrypoint documents.

use std::collections::HashMap;
use std::time::SystemTime;

use bytes::Bytes;

/// An in-memory copy of a served file.
#[derive(Debug, Clone)]
pub struct CachedFile {
    data: Bytes,
    modified: SystemTime,
}

impl CachedFile {
    pub fn new(data: impl Into<Bytes>, modified: SystemTime) -> Self {
        Self {
            data: data.into(),
            modified,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }
}

/// Files keyed by root-relative path (`es6/index.html`). A build's directory
/// (`es6/`) maps to its index document too.
///
/// Built in one pass at startup and never mutated afterwards; shared by
/// reference between request handlers.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    files: HashMap<String, CachedFile>,
}

impl FileCache {
    pub fn get(&self, path: &str) -> Option<&CachedFile> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl FromIterator<(String, CachedFile)> for FileCache {
    fn from_iter<I: IntoIterator<Item = (String, CachedFile)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
