// SPDX-License-Identifier: AGPL-3.0-or-later
//! fsu core
//!
//! Platform-independent contract for file-system primitives: the path model,
//! the error taxonomy, metadata and the traits every native backend implements.

pub mod backend;
pub mod config;
pub mod entry;
pub mod error;
pub mod metadata;
pub mod operations;
pub mod path;
pub mod platform;

pub use backend::{FileHandle, FileSystem};
pub use config::BackendConfig;
pub use entry::{DirectoryEntry, EntryKind, EntryMetadata};
pub use error::{ErrorKind, FsError, FsResult};
pub use metadata::{Metadata, Permissions};
pub use operations::{CreatePolicy, MoveOutcome, OpenMode, SeekOrigin};
pub use path::{Component, Components, FsPath, PathStyle, Root};
pub use platform::{Platform, PlatformCapabilities};
