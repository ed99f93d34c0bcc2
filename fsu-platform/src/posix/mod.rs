//! POSIX backend (Linux, macOS)
//!
//! Thin layer over the libc file-system calls. Every native failure goes
//! through the errno table. Calls that resolve a path report `ENOTDIR` from a
//! parent component as `NotFound`, matching the Windows backend; only `list`
//! and `rename` can still answer `NotADirectory`, about their own operands.

mod dir;
mod errno;
mod file;
mod stat;

use std::ffi::{CStr, CString};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use fsu_core::{
    BackendConfig, CreatePolicy, EntryKind, FileSystem, FsError, FsPath, FsResult, Metadata,
    OpenMode, PathStyle, Platform,
};
use tracing::debug;

use crate::tree::{self, RawChild, RawTree};
use errno::{error_from_errno, error_from_path_errno, retry};
use file::fstat;
use stat::{kind_from_mode, metadata_from_stat};

pub use dir::PosixDir;
pub use file::PosixFile;

/// Backend over the POSIX system calls
#[derive(Debug, Clone, Default)]
pub struct PosixFs {
    config: BackendConfig,
}

impl PosixFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn raw_stat(&self, path: &FsPath, follow: bool) -> FsResult<libc::stat> {
        let c = c_path(path)?;
        stat_c(&c, follow).map_err(|errno| error_from_path_errno(errno, path.to_string()))
    }

    /// `rename` of a directory onto an existing non-directory
    fn replaces_non_directory(&self, from: &FsPath, to: &FsPath) -> bool {
        match (self.raw_stat(from, false), self.raw_stat(to, false)) {
            (Ok(src), Ok(dst)) => {
                kind_from_mode(src.st_mode) == EntryKind::Directory
                    && kind_from_mode(dst.st_mode) != EntryKind::Directory
            }
            _ => false,
        }
    }
}

fn stat_c(c: &CStr, follow: bool) -> Result<libc::stat, i32> {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    retry(|| unsafe {
        if follow {
            libc::stat(c.as_ptr(), &mut st)
        } else {
            libc::lstat(c.as_ptr(), &mut st)
        }
    })?;
    Ok(st)
}

fn rmdir_c(c: &CStr, subject: String) -> FsResult<()> {
    retry(|| unsafe { libc::rmdir(c.as_ptr()) })
        .map_err(|errno| match errno {
            // Some systems report a non-empty directory as EEXIST
            libc::EEXIST => FsError::NotEmpty(subject),
            errno => error_from_path_errno(errno, subject),
        })
        .map(drop)
}

fn unlink_c(c: &CStr, subject: String) -> FsResult<()> {
    retry(|| unsafe { libc::unlink(c.as_ptr()) })
        .map_err(|errno| error_from_path_errno(errno, subject))
        .map(drop)
}

fn c_path(path: &FsPath) -> FsResult<CString> {
    if path.style() != PathStyle::Posix {
        return Err(FsError::InvalidPath(format!(
            "{}: not a POSIX path",
            path
        )));
    }
    CString::new(path.to_string())
        .map_err(|_| FsError::InvalidPath(format!("{}: contains NUL", path)))
}

/// `dir/name` on raw bytes
fn child_c(dir: &CStr, name: &[u8]) -> FsResult<CString> {
    let mut bytes = dir.to_bytes().to_vec();
    if bytes.last() != Some(&b'/') {
        bytes.push(b'/');
    }
    bytes.extend_from_slice(name);
    CString::new(bytes).map_err(|e| {
        FsError::InvalidPath(format!(
            "{}: contains NUL",
            String::from_utf8_lossy(&e.into_vec())
        ))
    })
}

fn open_flags(mode: OpenMode, policy: CreatePolicy) -> libc::c_int {
    let access = match mode {
        OpenMode::Read => libc::O_RDONLY,
        OpenMode::Write => libc::O_WRONLY,
        OpenMode::ReadWrite => libc::O_RDWR,
        OpenMode::Append => libc::O_WRONLY | libc::O_APPEND,
    };
    let create = match policy {
        CreatePolicy::MustExist => 0,
        CreatePolicy::CreateIfMissing => libc::O_CREAT,
        CreatePolicy::CreateExclusive => libc::O_CREAT | libc::O_EXCL,
        CreatePolicy::Truncate => libc::O_CREAT | libc::O_TRUNC,
    };
    libc::O_CLOEXEC | access | create
}

impl FileSystem for PosixFs {
    type File = PosixFile;
    type Dir = PosixDir;

    fn name(&self) -> &'static str {
        "posix"
    }

    fn platform(&self) -> Platform {
        Platform::CURRENT
    }

    fn open(&self, path: &FsPath, mode: OpenMode, policy: CreatePolicy) -> FsResult<PosixFile> {
        policy.validate(mode, &path.to_string())?;
        let c = c_path(path)?;
        let flags = open_flags(mode, policy);
        let perm = self.config.file_mode as libc::c_uint;

        let fd = retry(|| unsafe { libc::open(c.as_ptr(), flags, perm) })
            .map_err(|errno| error_from_path_errno(errno, path.to_string()))?;
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };

        // A directory opens fine read-only; refuse it before handing out byte I/O
        let st = fstat(fd.as_raw_fd())
            .map_err(|errno| error_from_errno(errno, path.to_string()))?;
        if kind_from_mode(st.st_mode) == EntryKind::Directory {
            return Err(FsError::IsADirectory(path.to_string()));
        }

        debug!(path = %path, ?mode, ?policy, "opened file");
        Ok(PosixFile::new(fd, path.clone(), mode))
    }

    fn stat(&self, path: &FsPath) -> FsResult<Metadata> {
        Ok(metadata_from_stat(&self.raw_stat(path, true)?))
    }

    fn lstat(&self, path: &FsPath) -> FsResult<Metadata> {
        Ok(metadata_from_stat(&self.raw_stat(path, false)?))
    }

    fn list(&self, path: &FsPath) -> FsResult<PosixDir> {
        let c = c_path(path)?;
        PosixDir::open(&c, path.to_string()).map_err(|errno| match errno {
            // Either the target or one of its parents is not a directory
            libc::ENOTDIR => match self.raw_stat(path, true) {
                Ok(_) => FsError::NotADirectory(path.to_string()),
                Err(e) => e,
            },
            errno => error_from_errno(errno, path.to_string()),
        })
    }

    fn mkdir(&self, path: &FsPath, recursive: bool) -> FsResult<()> {
        if recursive {
            return tree::create_all(self, path);
        }
        let c = c_path(path)?;
        let perm = self.config.dir_mode as libc::mode_t;
        retry(|| unsafe { libc::mkdir(c.as_ptr(), perm) })
            .map_err(|errno| error_from_path_errno(errno, path.to_string()))?;
        debug!(path = %path, "created directory");
        Ok(())
    }

    fn remove(&self, path: &FsPath, recursive: bool) -> FsResult<()> {
        if recursive {
            return tree::remove_all(self, path);
        }
        let c = c_path(path)?;
        let kind = self.raw_kind(&c)?;
        self.raw_remove(&c, kind)?;
        debug!(path = %path, "removed");
        Ok(())
    }

    fn rename(&self, from: &FsPath, to: &FsPath) -> FsResult<()> {
        let (c_from, c_to) = (c_path(from)?, c_path(to)?);
        retry(|| unsafe { libc::rename(c_from.as_ptr(), c_to.as_ptr()) }).map_err(|errno| {
            let subject = format!("{} -> {}", from, to);
            match errno {
                libc::ENOTDIR if self.replaces_non_directory(from, to) => {
                    FsError::NotADirectory(subject)
                }
                errno => error_from_path_errno(errno, subject),
            }
        })?;
        debug!(from = %from, to = %to, "renamed");
        Ok(())
    }

    fn symlink(&self, target: &FsPath, link: &FsPath) -> FsResult<()> {
        let (c_target, c_link) = (c_path(target)?, c_path(link)?);
        retry(|| unsafe { libc::symlink(c_target.as_ptr(), c_link.as_ptr()) })
            .map_err(|errno| error_from_path_errno(errno, link.to_string()))?;
        debug!(link = %link, target = %target, "created symlink");
        Ok(())
    }

    fn readlink(&self, link: &FsPath) -> FsResult<FsPath> {
        let c = c_path(link)?;
        let mut buf = vec![0u8; 256];
        loop {
            let (ptr, cap) = (buf.as_mut_ptr().cast::<libc::c_char>(), buf.len());
            let len = retry(|| unsafe { libc::readlink(c.as_ptr(), ptr, cap) })
                .map_err(|errno| error_from_path_errno(errno, link.to_string()))?
                as usize;
            if len < buf.len() {
                buf.truncate(len);
                break;
            }
            buf.resize(buf.len() * 2, 0);
        }
        let target = String::from_utf8(buf).map_err(|_| {
            FsError::InvalidPath(format!("{}: link target is not valid UTF-8", link))
        })?;
        FsPath::normalize_with(&target, PathStyle::Posix)
    }

    fn set_readonly(&self, path: &FsPath, readonly: bool) -> FsResult<()> {
        let mode = self.raw_stat(path, true)?.st_mode & 0o7777;
        let mode = if readonly { mode & !0o222 } else { mode | 0o200 };
        let c = c_path(path)?;
        retry(|| unsafe { libc::chmod(c.as_ptr(), mode) })
            .map_err(|errno| error_from_path_errno(errno, path.to_string()))?;
        debug!(path = %path, readonly, "changed mode");
        Ok(())
    }
}

impl RawTree for PosixFs {
    type Loc = CString;

    fn locate(&self, path: &FsPath) -> FsResult<CString> {
        c_path(path)
    }

    fn display(&self, loc: &CString) -> String {
        String::from_utf8_lossy(loc.as_bytes()).into_owned()
    }

    fn raw_kind(&self, loc: &CString) -> FsResult<EntryKind> {
        stat_c(loc, false)
            .map(|st| kind_from_mode(st.st_mode))
            .map_err(|errno| error_from_path_errno(errno, self.display(loc)))
    }

    fn raw_children(&self, dir: &CString) -> FsResult<Vec<FsResult<RawChild<CString>>>> {
        let subject = self.display(dir);
        let mut stream = PosixDir::open(dir, subject.clone())
            .map_err(|errno| error_from_path_errno(errno, subject))?;
        let mut children = Vec::new();
        while let Some(next) = stream.next_raw() {
            children.push(next.and_then(|(name, kind)| {
                Ok(RawChild {
                    loc: child_c(dir, &name)?,
                    kind,
                })
            }));
        }
        Ok(children)
    }

    fn raw_remove(&self, loc: &CString, kind: EntryKind) -> FsResult<()> {
        if kind == EntryKind::Directory {
            rmdir_c(loc, self.display(loc))
        } else {
            unlink_c(loc, self.display(loc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsu_core::ErrorKind;

    #[test]
    fn test_open_flags() {
        let flags = open_flags(OpenMode::Append, CreatePolicy::CreateIfMissing);
        assert_ne!(flags & libc::O_APPEND, 0);
        assert_ne!(flags & libc::O_CREAT, 0);
        assert_eq!(flags & libc::O_ACCMODE, libc::O_WRONLY);

        let flags = open_flags(OpenMode::Read, CreatePolicy::MustExist);
        assert_eq!(flags & libc::O_ACCMODE, libc::O_RDONLY);
        assert_eq!(flags & libc::O_CREAT, 0);
        assert_ne!(flags & libc::O_CLOEXEC, 0);

        let flags = open_flags(OpenMode::Write, CreatePolicy::CreateExclusive);
        assert_ne!(flags & libc::O_EXCL, 0);
    }

    #[test]
    fn test_windows_style_path_rejected() {
        let path = FsPath::normalize_with("C:\\x", PathStyle::Windows).unwrap();
        assert!(matches!(c_path(&path), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_child_path_bytes() {
        let root = CString::new("/").unwrap();
        assert_eq!(child_c(&root, b"tmp").unwrap().as_bytes(), b"/tmp");
        let dir = CString::new("/tmp/t").unwrap();
        assert_eq!(child_c(&dir, b"bad\xff").unwrap().as_bytes(), b"/tmp/t/bad\xff");
        assert!(matches!(child_c(&dir, b"a\0b"), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_unlisted_error_keeps_code() {
        let err = error_from_errno(libc::ENOSPC, "/full");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.native_code(), Some(libc::ENOSPC));
    }
}
