//! errno translation

use fsu_core::{ErrorKind, FsError};

/// Every errno the POSIX backend classifies. Anything else is `ErrorKind::Io`.
pub(crate) const ERRNO_TABLE: &[(i32, ErrorKind)] = &[
    (libc::ENOENT, ErrorKind::NotFound),
    (libc::EEXIST, ErrorKind::AlreadyExists),
    (libc::EACCES, ErrorKind::PermissionDenied),
    (libc::EPERM, ErrorKind::PermissionDenied),
    (libc::EROFS, ErrorKind::PermissionDenied),
    (libc::ENOTDIR, ErrorKind::NotADirectory),
    (libc::EISDIR, ErrorKind::IsADirectory),
    (libc::ENOTEMPTY, ErrorKind::NotEmpty),
    (libc::ENAMETOOLONG, ErrorKind::InvalidPath),
    (libc::ELOOP, ErrorKind::InvalidPath),
    (libc::EINVAL, ErrorKind::InvalidArgument),
    (libc::EBADF, ErrorKind::InvalidHandle),
    (libc::ESPIPE, ErrorKind::InvalidHandle),
    (libc::EXDEV, ErrorKind::CrossDevice),
];

pub(crate) fn kind_of(errno: i32) -> ErrorKind {
    ERRNO_TABLE
        .iter()
        .find(|(code, _)| *code == errno)
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Io)
}

pub(crate) fn error_from_errno(errno: i32, subject: impl Into<String>) -> FsError {
    FsError::from_native(kind_of(errno), subject, errno)
}

/// Translation for calls that resolve a path. `ENOTDIR` there means a
/// non-final component is not a directory, so the object does not exist; this
/// is what Windows reports as `ERROR_PATH_NOT_FOUND`.
pub(crate) fn error_from_path_errno(errno: i32, subject: impl Into<String>) -> FsError {
    match errno {
        libc::ENOTDIR => FsError::from_native(ErrorKind::NotFound, subject, errno),
        errno => error_from_errno(errno, subject),
    }
}

pub(crate) fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(target_os = "linux")]
pub(crate) fn set_errno(val: i32) {
    unsafe {
        *libc::__errno_location() = val;
    }
}

#[cfg(target_os = "macos")]
pub(crate) fn set_errno(val: i32) {
    unsafe {
        *libc::__error() = val;
    }
}

/// Return value of a libc call that signals failure with -1
pub(crate) trait IsMinusOne: Copy {
    fn is_minus_one(self) -> bool;
}

macro_rules! impl_is_minus_one {
    ($($t:ty)*) => {$(
        impl IsMinusOne for $t {
            fn is_minus_one(self) -> bool {
                self == -1
            }
        }
    )*};
}

impl_is_minus_one! { i32 i64 isize }

/// Call `f` until it stops failing with `EINTR`. On failure returns the errno.
pub(crate) fn retry<T: IsMinusOne>(mut f: impl FnMut() -> T) -> Result<T, i32> {
    loop {
        let ret = f();
        if !ret.is_minus_one() {
            return Ok(ret);
        }
        match last_errno() {
            libc::EINTR => continue,
            errno => return Err(errno),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        assert_eq!(kind_of(libc::ENOENT), ErrorKind::NotFound);
        assert_eq!(kind_of(libc::EPERM), ErrorKind::PermissionDenied);
        assert_eq!(kind_of(libc::EXDEV), ErrorKind::CrossDevice);
        assert_eq!(kind_of(libc::ESPIPE), ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_unlisted_errno_is_io_with_code() {
        let err = error_from_errno(libc::EIO, "/dev/disk");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.native_code(), Some(libc::EIO));
        assert_eq!(err.subject(), "/dev/disk");
    }

    #[test]
    fn test_path_resolution_enotdir_is_not_found() {
        let err = error_from_path_errno(libc::ENOTDIR, "/etc/passwd/x");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.subject(), "/etc/passwd/x");
        // Everything else goes through the table unchanged
        assert_eq!(
            error_from_path_errno(libc::EACCES, "/x").kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            error_from_errno(libc::ENOTDIR, "/x").kind(),
            ErrorKind::NotADirectory
        );
    }

    #[test]
    fn test_cross_device_rename() {
        let err = error_from_path_errno(libc::EXDEV, "/a -> /mnt/b");
        assert_eq!(err.kind(), ErrorKind::CrossDevice);
        assert!(matches!(err, FsError::CrossDevice(_)));
    }

    #[test]
    fn test_table_has_no_duplicate_codes() {
        for (i, (code, _)) in ERRNO_TABLE.iter().enumerate() {
            assert!(
                ERRNO_TABLE[i + 1..].iter().all(|(other, _)| other != code),
                "errno {code} listed twice"
            );
        }
    }

    #[test]
    fn test_retry_reports_errno() {
        let mut calls = 0;
        let res = retry(|| {
            calls += 1;
            set_errno(libc::EBADF);
            -1i32
        });
        assert_eq!(res, Err(libc::EBADF));
        assert_eq!(calls, 1);
        assert_eq!(retry(|| 7isize), Ok(7));
    }
}
