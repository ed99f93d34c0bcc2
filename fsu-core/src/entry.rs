//! Directory entries

use serde::{Deserialize, Serialize};

use crate::backend::FileSystem;
use crate::error::{FsError, FsResult};
use crate::metadata::Metadata;
use crate::path::{segments_equal, FsPath, PathStyle};

/// Kind of a file-system object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Devices, sockets, FIFOs and anything else
    Other,
}

/// Metadata of a listed entry, as much as the enumeration call produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryMetadata {
    Loaded(Metadata),
    /// Only a type hint was available (`d_type`); `None` if even that was unknown
    Deferred { kind_hint: Option<EntryKind> },
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Single path segment, never `.` or `..`
    pub name: String,
    pub metadata: EntryMetadata,
}

impl DirectoryEntry {
    pub fn loaded(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            metadata: EntryMetadata::Loaded(metadata),
        }
    }

    pub fn deferred(name: impl Into<String>, kind_hint: Option<EntryKind>) -> Self {
        Self {
            name: name.into(),
            metadata: EntryMetadata::Deferred { kind_hint },
        }
    }

    /// Kind without touching the file system, if known
    pub fn kind_hint(&self) -> Option<EntryKind> {
        match &self.metadata {
            EntryMetadata::Loaded(meta) => Some(meta.kind),
            EntryMetadata::Deferred { kind_hint } => *kind_hint,
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match &self.metadata {
            EntryMetadata::Loaded(meta) => Some(meta),
            EntryMetadata::Deferred { .. } => None,
        }
    }

    /// Fill in deferred metadata with an `lstat` of `dir/name`.
    pub fn load_metadata<F: FileSystem>(&mut self, fs: &F, dir: &FsPath) -> FsResult<&Metadata> {
        if let EntryMetadata::Deferred { .. } = self.metadata {
            let meta = fs.lstat(&dir.join_str(&self.name)?)?;
            self.metadata = EntryMetadata::Loaded(meta);
        }
        let EntryMetadata::Loaded(meta) = &self.metadata else {
            return Err(FsError::InvalidArgument(format!(
                "{}: metadata not loaded",
                self.name
            )));
        };
        Ok(meta)
    }

    pub fn name_eq(&self, other: &str, style: PathStyle) -> bool {
        segments_equal(&self.name, other, style)
    }
}
