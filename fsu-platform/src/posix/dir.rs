//! Lazy directory listing over `opendir`/`readdir`

use std::ffi::CStr;
use std::iter::FusedIterator;
use std::ptr::NonNull;

use fsu_core::{DirectoryEntry, EntryKind, FsError, FsResult};

use super::errno::{error_from_errno, last_errno, set_errno};
use super::stat::kind_from_d_type;

/// Open directory stream. Closed on drop.
#[derive(Debug)]
pub struct PosixDir {
    dirp: NonNull<libc::DIR>,
    subject: String,
    done: bool,
}

// The stream is only touched through &mut self
unsafe impl Send for PosixDir {}

impl PosixDir {
    /// `opendir` on `path`. On failure returns the errno.
    pub(crate) fn open(path: &CStr, subject: String) -> Result<Self, i32> {
        let dirp = unsafe { libc::opendir(path.as_ptr()) };
        match NonNull::new(dirp) {
            Some(dirp) => Ok(Self {
                dirp,
                subject,
                done: false,
            }),
            None => Err(last_errno()),
        }
    }

    /// Next name as stored on disk, with the `d_type` hint. Skips `.` and `..`.
    pub(crate) fn next_raw(&mut self) -> Option<FsResult<(Vec<u8>, Option<EntryKind>)>> {
        while !self.done {
            set_errno(0);
            let ent = unsafe { libc::readdir(self.dirp.as_ptr()) };
            if ent.is_null() {
                self.done = true;
                return match last_errno() {
                    0 => None,
                    errno => Some(Err(error_from_errno(errno, self.subject.clone()))),
                };
            }

            // Valid until the next readdir on this stream
            let (name, d_type) = unsafe {
                (
                    CStr::from_ptr((*ent).d_name.as_ptr()).to_bytes(),
                    (*ent).d_type,
                )
            };
            if name == b"." || name == b".." {
                continue;
            }
            return Some(Ok((name.to_vec(), kind_from_d_type(d_type))));
        }
        None
    }
}

impl Iterator for PosixDir {
    type Item = FsResult<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let (name, hint) = match self.next_raw()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };
        Some(match String::from_utf8(name) {
            Ok(name) => Ok(DirectoryEntry::deferred(name, hint)),
            Err(e) => Err(FsError::InvalidPath(format!(
                "{}: entry {:?} is not valid UTF-8",
                self.subject,
                String::from_utf8_lossy(e.as_bytes())
            ))),
        })
    }
}

impl FusedIterator for PosixDir {}

impl Drop for PosixDir {
    fn drop(&mut self) {
        unsafe {
            libc::closedir(self.dirp.as_ptr());
        }
    }
}
