//! Lazy directory listing over `FindFirstFileW`/`FindNextFileW`

use std::fmt;
use std::iter::FusedIterator;

use fsu_core::{DirectoryEntry, FsError, FsResult};
use windows_sys::Win32::Foundation::{GetLastError, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    FindClose, FindFirstFileW, FindNextFileW, WIN32_FIND_DATAW,
};

use super::file::filetime;
use crate::win_translate::{
    error_from_win32, from_wide, join_u32, metadata_from_attributes, wide_name, RawAttributes,
    ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_FILES,
};

const DOT: u16 = b'.' as u16;

/// Open find handle. The first result arrives with the handle itself.
pub struct WindowsDir {
    find: Option<HANDLE>,
    first: Option<Box<WIN32_FIND_DATAW>>,
    subject: String,
    done: bool,
}

// The find handle is only touched through &mut self
unsafe impl Send for WindowsDir {}

pub(crate) fn find_attributes(data: &WIN32_FIND_DATAW) -> RawAttributes {
    RawAttributes {
        attributes: data.dwFileAttributes,
        size: join_u32(data.nFileSizeHigh, data.nFileSizeLow),
        created: filetime(&data.ftCreationTime),
        accessed: filetime(&data.ftLastAccessTime),
        modified: filetime(&data.ftLastWriteTime),
    }
}

impl WindowsDir {
    /// Start a search for the NUL-terminated `pattern`. A pattern matching
    /// nothing gives an empty listing.
    pub(crate) fn open(pattern: &[u16], subject: String) -> FsResult<Self> {
        let mut data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };
        let find = unsafe { FindFirstFileW(pattern.as_ptr(), &mut data) };
        if find == INVALID_HANDLE_VALUE {
            return match unsafe { GetLastError() } {
                ERROR_FILE_NOT_FOUND => Ok(Self {
                    find: None,
                    first: None,
                    subject,
                    done: true,
                }),
                code => Err(error_from_win32(code, subject)),
            };
        }
        Ok(Self {
            find: Some(find),
            first: Some(Box::new(data)),
            subject,
            done: false,
        })
    }

    /// Next find record, skipping `.` and `..`
    pub(crate) fn next_raw(&mut self) -> Option<FsResult<WIN32_FIND_DATAW>> {
        while !self.done {
            let data = match self.advance()? {
                Ok(data) => data,
                Err(e) => return Some(Err(e)),
            };
            if matches!(wide_name(&data.cFileName), [DOT] | [DOT, DOT]) {
                continue;
            }
            return Some(Ok(data));
        }
        None
    }

    fn advance(&mut self) -> Option<FsResult<WIN32_FIND_DATAW>> {
        if let Some(first) = self.first.take() {
            return Some(Ok(*first));
        }
        let find = self.find?;
        let mut data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };
        if unsafe { FindNextFileW(find, &mut data) } == 0 {
            self.done = true;
            return match unsafe { GetLastError() } {
                ERROR_NO_MORE_FILES => None,
                code => Some(Err(error_from_win32(code, self.subject.clone()))),
            };
        }
        Some(Ok(data))
    }
}

impl Iterator for WindowsDir {
    type Item = FsResult<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = match self.next_raw()? {
            Ok(data) => data,
            Err(e) => return Some(Err(e)),
        };
        let Some(name) = from_wide(&data.cFileName) else {
            return Some(Err(FsError::InvalidPath(format!(
                "{}: entry {:?} is not valid UTF-16",
                self.subject,
                String::from_utf16_lossy(wide_name(&data.cFileName))
            ))));
        };
        let meta = metadata_from_attributes(&find_attributes(&data), Some(&name));
        Some(Ok(DirectoryEntry::loaded(name, meta)))
    }
}

impl FusedIterator for WindowsDir {}

impl fmt::Debug for WindowsDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowsDir")
            .field("subject", &self.subject)
            .field("done", &self.done)
            .finish()
    }
}

impl Drop for WindowsDir {
    fn drop(&mut self) {
        if let Some(find) = self.find.take() {
            unsafe {
                FindClose(find);
            }
        }
    }
}
