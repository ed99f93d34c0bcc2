//! Backend traits
//!
//! [`FileSystem`] is implemented once per platform. Callers name the trait (or
//! the `NativeFs` alias exported by `fsu-platform`) and never the concrete
//! backend.

use std::fmt::Debug;

use crate::{
    entry::DirectoryEntry,
    error::{ErrorKind, FsError, FsResult},
    metadata::Metadata,
    operations::{CreatePolicy, MoveOutcome, OpenMode, SeekOrigin},
    path::{FsPath, PathStyle},
    platform::Platform,
};

/// Buffer size used by the default copy and read helpers
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// An open file
///
/// Every method fails with [`FsError::InvalidHandle`] once [`close`](Self::close)
/// has been called. Dropping an open handle releases it silently.
pub trait FileHandle: Debug + Send {
    /// Path the handle was opened with
    fn path(&self) -> &FsPath;

    fn is_open(&self) -> bool;

    /// Read into `buf`; `Ok(0)` at end of file.
    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;

    /// Write from `buf`; may write fewer bytes than given.
    fn write(&mut self, buf: &[u8]) -> FsResult<usize>;

    /// Move the file position. A resulting position before the start of the
    /// file fails with `InvalidArgument`.
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> FsResult<u64>;

    fn metadata(&self) -> FsResult<Metadata>;

    /// Flush data and metadata to the device
    fn sync(&mut self) -> FsResult<()>;

    /// Release the native handle. A second call fails with `InvalidHandle`.
    fn close(&mut self) -> FsResult<()>;

    fn write_all(&mut self, mut buf: &[u8]) -> FsResult<()> {
        while !buf.is_empty() {
            match self.write(buf)? {
                0 => {
                    return Err(FsError::from_native(
                        ErrorKind::Io,
                        self.path().to_string(),
                        0,
                    ))
                }
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    /// Read until end of file, appending to `out`. Returns the number of bytes read.
    fn read_to_end(&mut self, out: &mut Vec<u8>) -> FsResult<usize> {
        let mut chunk = vec![0u8; COPY_BUFFER_SIZE];
        let mut total = 0;
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..n]);
            total += n;
        }
    }
}

/// Platform file-system primitives
pub trait FileSystem: Send + Sync {
    type File: FileHandle;
    /// Lazy listing; yields `.`/`..`-free entries in no particular order.
    type Dir: Iterator<Item = FsResult<DirectoryEntry>>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    fn platform(&self) -> Platform;

    fn path_style(&self) -> PathStyle {
        self.platform().path_style()
    }

    fn open(&self, path: &FsPath, mode: OpenMode, policy: CreatePolicy) -> FsResult<Self::File>;

    /// Metadata of the object, following symlinks
    fn stat(&self, path: &FsPath) -> FsResult<Metadata>;

    /// Metadata of the object itself
    fn lstat(&self, path: &FsPath) -> FsResult<Metadata>;

    fn list(&self, path: &FsPath) -> FsResult<Self::Dir>;

    fn mkdir(&self, path: &FsPath, recursive: bool) -> FsResult<()>;

    /// Remove a file, symlink or directory. Recursive removal never follows
    /// symlinks.
    fn remove(&self, path: &FsPath, recursive: bool) -> FsResult<()>;

    /// Rename within one volume, replacing an existing destination file.
    fn rename(&self, from: &FsPath, to: &FsPath) -> FsResult<()>;

    /// Create `link` pointing at `target`. `target` is stored as given.
    fn symlink(&self, target: &FsPath, link: &FsPath) -> FsResult<()>;

    fn readlink(&self, link: &FsPath) -> FsResult<FsPath>;

    fn set_readonly(&self, path: &FsPath, readonly: bool) -> FsResult<()>;

    /// `false` for a dangling symlink
    fn exists(&self, path: &FsPath) -> FsResult<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read_file(&self, path: &FsPath) -> FsResult<Vec<u8>> {
        let mut file = self.open(path, OpenMode::Read, CreatePolicy::MustExist)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        file.close()?;
        Ok(data)
    }

    /// Create or replace `path` with `data`.
    fn write_file(&self, path: &FsPath, data: &[u8]) -> FsResult<()> {
        let mut file = self.open(path, OpenMode::Write, CreatePolicy::Truncate)?;
        file.write_all(data)?;
        file.close()
    }

    /// Copy the contents of a regular file. Returns the number of bytes copied.
    fn copy_file(&self, from: &FsPath, to: &FsPath) -> FsResult<u64> {
        let mut src = self.open(from, OpenMode::Read, CreatePolicy::MustExist)?;
        let mut dst = self.open(to, OpenMode::Write, CreatePolicy::Truncate)?;
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut copied = 0u64;
        loop {
            let n = src.read(&mut buf)?;
            if n == 0 {
                break;
            }
            dst.write_all(&buf[..n])?;
            copied += n as u64;
        }
        dst.close()?;
        src.close()?;
        Ok(copied)
    }

    /// Rename, falling back to copy + remove when a regular file crosses volumes.
    fn move_path(&self, from: &FsPath, to: &FsPath) -> FsResult<MoveOutcome> {
        match self.rename(from, to) {
            Ok(()) => Ok(MoveOutcome::Renamed),
            Err(e) if e.kind() == ErrorKind::CrossDevice => {
                if !self.lstat(from)?.is_file() {
                    return Err(e);
                }
                self.copy_file(from, to)?;
                self.remove(from, false)?;
                Ok(MoveOutcome::Copied)
            }
            Err(e) => Err(e),
        }
    }
}
