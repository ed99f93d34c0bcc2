//! File handle over a raw descriptor

use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};

use fsu_core::{FileHandle, FsError, FsPath, FsResult, Metadata, OpenMode, SeekOrigin};
use tracing::trace;

use super::errno::{error_from_errno, last_errno, retry};
use super::stat::metadata_from_stat;

/// Open file on a POSIX system
#[derive(Debug)]
pub struct PosixFile {
    fd: Option<OwnedFd>,
    path: FsPath,
    mode: OpenMode,
}

impl PosixFile {
    pub(crate) fn new(fd: OwnedFd, path: FsPath, mode: OpenMode) -> Self {
        Self {
            fd: Some(fd),
            path,
            mode,
        }
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn raw(&self) -> FsResult<RawFd> {
        self.fd
            .as_ref()
            .map(|fd| fd.as_raw_fd())
            .ok_or_else(|| FsError::InvalidHandle(self.path.to_string()))
    }

    fn error(&self, errno: i32) -> FsError {
        error_from_errno(errno, self.path.to_string())
    }
}

pub(crate) fn fstat(fd: RawFd) -> Result<libc::stat, i32> {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    retry(|| unsafe { libc::fstat(fd, &mut st) })?;
    Ok(st)
}

impl FileHandle for PosixFile {
    fn path(&self) -> &FsPath {
        &self.path
    }

    fn is_open(&self) -> bool {
        self.fd.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let fd = self.raw()?;
        self.mode.check_readable(&self.path.to_string())?;
        let (ptr, len) = (buf.as_mut_ptr().cast::<libc::c_void>(), buf.len());
        let n = retry(|| unsafe { libc::read(fd, ptr, len) }).map_err(|e| self.error(e))?;
        Ok(n as usize)
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        let fd = self.raw()?;
        self.mode.check_writable(&self.path.to_string())?;
        let (ptr, len) = (buf.as_ptr().cast::<libc::c_void>(), buf.len());
        let n = retry(|| unsafe { libc::write(fd, ptr, len) }).map_err(|e| self.error(e))?;
        Ok(n as usize)
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> FsResult<u64> {
        let fd = self.raw()?;
        if origin == SeekOrigin::Start && offset < 0 {
            return Err(FsError::InvalidArgument(format!(
                "{}: seek to negative offset {}",
                self.path, offset
            )));
        }
        let whence = match origin {
            SeekOrigin::Start => libc::SEEK_SET,
            SeekOrigin::Current => libc::SEEK_CUR,
            SeekOrigin::End => libc::SEEK_END,
        };
        let pos = retry(|| unsafe { libc::lseek(fd, offset as libc::off_t, whence) })
            .map_err(|e| self.error(e))?;
        Ok(pos as u64)
    }

    fn metadata(&self) -> FsResult<Metadata> {
        let st = fstat(self.raw()?).map_err(|e| self.error(e))?;
        Ok(metadata_from_stat(&st))
    }

    fn sync(&mut self) -> FsResult<()> {
        let fd = self.raw()?;
        retry(|| unsafe { libc::fsync(fd) }).map_err(|e| self.error(e))?;
        Ok(())
    }

    fn close(&mut self) -> FsResult<()> {
        let fd = self
            .fd
            .take()
            .ok_or_else(|| FsError::InvalidHandle(self.path.to_string()))?
            .into_raw_fd();
        trace!(path = %self.path, fd, "closing file");
        // The descriptor is gone even when close reports EINTR
        if unsafe { libc::close(fd) } == -1 {
            let errno = last_errno();
            if errno != libc::EINTR {
                return Err(self.error(errno));
            }
        }
        Ok(())
    }
}
