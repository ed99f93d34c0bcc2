//! File handle over a Win32 `HANDLE`

use std::os::windows::io::{AsRawHandle, IntoRawHandle, OwnedHandle};
use std::ptr;

use fsu_core::{FileHandle, FsError, FsPath, FsResult, Metadata, OpenMode, SeekOrigin};
use tracing::trace;
use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, FILETIME, HANDLE};
use windows_sys::Win32::Storage::FileSystem::{
    FlushFileBuffers, GetFileInformationByHandle, ReadFile, SetFilePointerEx, WriteFile,
    BY_HANDLE_FILE_INFORMATION, FILE_BEGIN, FILE_CURRENT, FILE_END,
};

use crate::win_translate::{
    error_from_win32, join_u32, metadata_from_attributes, RawAttributes, ERROR_BROKEN_PIPE,
    ERROR_HANDLE_EOF,
};

/// Open file on Windows
#[derive(Debug)]
pub struct WindowsFile {
    handle: Option<OwnedHandle>,
    path: FsPath,
    mode: OpenMode,
}

pub(crate) fn filetime(ft: &FILETIME) -> u64 {
    join_u32(ft.dwHighDateTime, ft.dwLowDateTime)
}

/// Attributes of an open handle. On failure returns the Win32 error code.
pub(crate) fn handle_attributes(handle: HANDLE) -> Result<RawAttributes, u32> {
    let mut info: BY_HANDLE_FILE_INFORMATION = unsafe { std::mem::zeroed() };
    if unsafe { GetFileInformationByHandle(handle, &mut info) } == 0 {
        return Err(unsafe { GetLastError() });
    }
    Ok(RawAttributes {
        attributes: info.dwFileAttributes,
        size: join_u32(info.nFileSizeHigh, info.nFileSizeLow),
        created: filetime(&info.ftCreationTime),
        accessed: filetime(&info.ftLastAccessTime),
        modified: filetime(&info.ftLastWriteTime),
    })
}

impl WindowsFile {
    pub(crate) fn new(handle: OwnedHandle, path: FsPath, mode: OpenMode) -> Self {
        Self {
            handle: Some(handle),
            path,
            mode,
        }
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn raw(&self) -> FsResult<HANDLE> {
        self.handle
            .as_ref()
            .map(|h| h.as_raw_handle() as HANDLE)
            .ok_or_else(|| FsError::InvalidHandle(self.path.to_string()))
    }

    fn last_error(&self) -> FsError {
        error_from_win32(unsafe { GetLastError() }, self.path.to_string())
    }
}

impl FileHandle for WindowsFile {
    fn path(&self) -> &FsPath {
        &self.path
    }

    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let handle = self.raw()?;
        self.mode.check_readable(&self.path.to_string())?;
        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        let mut read = 0u32;
        let ok = unsafe { ReadFile(handle, buf.as_mut_ptr(), len, &mut read, ptr::null_mut()) };
        if ok == 0 {
            return match unsafe { GetLastError() } {
                ERROR_HANDLE_EOF | ERROR_BROKEN_PIPE => Ok(0),
                code => Err(error_from_win32(code, self.path.to_string())),
            };
        }
        Ok(read as usize)
    }

    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        let handle = self.raw()?;
        self.mode.check_writable(&self.path.to_string())?;
        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        let mut written = 0u32;
        if unsafe { WriteFile(handle, buf.as_ptr(), len, &mut written, ptr::null_mut()) } == 0 {
            return Err(self.last_error());
        }
        Ok(written as usize)
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> FsResult<u64> {
        let handle = self.raw()?;
        if origin == SeekOrigin::Start && offset < 0 {
            return Err(FsError::InvalidArgument(format!(
                "{}: seek to negative offset {}",
                self.path, offset
            )));
        }
        let method = match origin {
            SeekOrigin::Start => FILE_BEGIN,
            SeekOrigin::Current => FILE_CURRENT,
            SeekOrigin::End => FILE_END,
        };
        let mut pos = 0i64;
        if unsafe { SetFilePointerEx(handle, offset, &mut pos, method) } == 0 {
            return Err(self.last_error());
        }
        Ok(pos as u64)
    }

    fn metadata(&self) -> FsResult<Metadata> {
        let raw = handle_attributes(self.raw()?)
            .map_err(|code| error_from_win32(code, self.path.to_string()))?;
        Ok(metadata_from_attributes(&raw, self.path.file_name()))
    }

    fn sync(&mut self) -> FsResult<()> {
        if unsafe { FlushFileBuffers(self.raw()?) } == 0 {
            return Err(self.last_error());
        }
        Ok(())
    }

    fn close(&mut self) -> FsResult<()> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| FsError::InvalidHandle(self.path.to_string()))?
            .into_raw_handle();
        trace!(path = %self.path, "closing file");
        if unsafe { CloseHandle(handle as HANDLE) } == 0 {
            return Err(self.last_error());
        }
        Ok(())
    }
}
