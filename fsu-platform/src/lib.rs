// SPDX-License-Identifier: AGPL-3.0-or-later
//! Native backends for fsu
//!
//! Exactly one backend is compiled, chosen by the target: the POSIX backend on
//! Linux and macOS, the Windows backend on Windows. Callers use the
//! [`NativeFs`] alias (or the [`FileSystem`] trait) and never name a backend
//! directly.

#[cfg(any(target_os = "linux", target_os = "macos"))]
mod posix;

#[cfg(windows)]
mod windows;

// Pure Win32 data handling, also built into test binaries on other hosts
#[cfg(any(windows, test))]
#[cfg_attr(not(windows), allow(dead_code))]
#[path = "windows/translate.rs"]
mod win_translate;

mod tree;


#[cfg(any(target_os = "linux", target_os = "macos"))]
pub use posix::{PosixDir as NativeDir, PosixFile as NativeFile, PosixFs as NativeFs};

#[cfg(windows)]
pub use windows::{WindowsDir as NativeDir, WindowsFile as NativeFile, WindowsFs as NativeFs};

pub use fsu_core::{
    BackendConfig, CreatePolicy, DirectoryEntry, EntryKind, ErrorKind, FileHandle, FileSystem,
    FsError, FsPath, FsResult, Metadata, MoveOutcome, OpenMode, PathStyle, Platform, SeekOrigin,
};

/// Backend for the compiled-for platform with default settings
pub fn native() -> NativeFs {
    NativeFs::new()
}
