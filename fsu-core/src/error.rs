//! Error types for fsu
//!
//! Every backend translates its native error domain into [`FsError`] through a
//! single table, so callers only ever branch on [`ErrorKind`].

use thiserror::Error;

/// Result type alias
pub type FsResult<T> = Result<T, FsError>;

/// Classification of a failure, independent of the subject it refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    NotADirectory,
    IsADirectory,
    NotEmpty,
    InvalidPath,
    InvalidArgument,
    InvalidHandle,
    CrossDevice,
    Io,
}

/// Main error type
///
/// The payload is the path (or handle description) the operation failed on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Cross-device operation: {0}")]
    CrossDevice(String),

    /// Native failure with no portable classification. `code` is an errno on
    /// POSIX and a Win32 error code on Windows; it is for diagnostics only.
    #[error("IO error at {path} (native code {code})")]
    Io { path: String, code: i32 },
}

impl FsError {
    /// Build an error of the given kind. `Io` errors get native code 0.
    pub fn new(kind: ErrorKind, subject: impl Into<String>) -> Self {
        Self::from_native(kind, subject, 0)
    }

    /// Build an error from a translated native failure.
    pub fn from_native(kind: ErrorKind, subject: impl Into<String>, code: i32) -> Self {
        let subject = subject.into();
        match kind {
            ErrorKind::NotFound => FsError::NotFound(subject),
            ErrorKind::AlreadyExists => FsError::AlreadyExists(subject),
            ErrorKind::PermissionDenied => FsError::PermissionDenied(subject),
            ErrorKind::NotADirectory => FsError::NotADirectory(subject),
            ErrorKind::IsADirectory => FsError::IsADirectory(subject),
            ErrorKind::NotEmpty => FsError::NotEmpty(subject),
            ErrorKind::InvalidPath => FsError::InvalidPath(subject),
            ErrorKind::InvalidArgument => FsError::InvalidArgument(subject),
            ErrorKind::InvalidHandle => FsError::InvalidHandle(subject),
            ErrorKind::CrossDevice => FsError::CrossDevice(subject),
            ErrorKind::Io => FsError::Io {
                path: subject,
                code,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            FsError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            FsError::NotADirectory(_) => ErrorKind::NotADirectory,
            FsError::IsADirectory(_) => ErrorKind::IsADirectory,
            FsError::NotEmpty(_) => ErrorKind::NotEmpty,
            FsError::InvalidPath(_) => ErrorKind::InvalidPath,
            FsError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            FsError::InvalidHandle(_) => ErrorKind::InvalidHandle,
            FsError::CrossDevice(_) => ErrorKind::CrossDevice,
            FsError::Io { .. } => ErrorKind::Io,
        }
    }

    /// The path or handle description the error refers to
    pub fn subject(&self) -> &str {
        match self {
            FsError::NotFound(s)
            | FsError::AlreadyExists(s)
            | FsError::PermissionDenied(s)
            | FsError::NotADirectory(s)
            | FsError::IsADirectory(s)
            | FsError::NotEmpty(s)
            | FsError::InvalidPath(s)
            | FsError::InvalidArgument(s)
            | FsError::InvalidHandle(s)
            | FsError::CrossDevice(s) => s,
            FsError::Io { path, .. } => path,
        }
    }

    /// Native error code, only carried by unclassified failures
    pub fn native_code(&self) -> Option<i32> {
        match self {
            FsError::Io { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Same classification, different subject.
    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        let code = self.native_code().unwrap_or(0);
        Self::from_native(self.kind(), subject, code)
    }
}

impl From<FsError> for std::io::Error {
    fn from(err: FsError) -> Self {
        use std::io::ErrorKind as Io;
        let kind = match err.kind() {
            ErrorKind::NotFound => Io::NotFound,
            ErrorKind::AlreadyExists => Io::AlreadyExists,
            ErrorKind::PermissionDenied => Io::PermissionDenied,
            ErrorKind::InvalidPath | ErrorKind::InvalidArgument => Io::InvalidInput,
            _ => Io::Other,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_constructor() {
        let kinds = [
            ErrorKind::NotFound,
            ErrorKind::AlreadyExists,
            ErrorKind::PermissionDenied,
            ErrorKind::NotADirectory,
            ErrorKind::IsADirectory,
            ErrorKind::NotEmpty,
            ErrorKind::InvalidPath,
            ErrorKind::InvalidArgument,
            ErrorKind::InvalidHandle,
            ErrorKind::CrossDevice,
            ErrorKind::Io,
        ];
        for kind in kinds {
            let err = FsError::new(kind, "/tmp/x");
            assert_eq!(err.kind(), kind);
            assert_eq!(err.subject(), "/tmp/x");
        }
    }

    #[test]
    fn test_native_code_only_on_io() {
        let err = FsError::from_native(ErrorKind::Io, "/dev/sda", 5);
        assert_eq!(err.native_code(), Some(5));

        let err = FsError::from_native(ErrorKind::NotFound, "a.txt", 2);
        assert_eq!(err.native_code(), None);
    }

    #[test]
    fn test_error_display() {
        let err = FsError::NotFound("/path/to/file".into());
        assert_eq!(format!("{}", err), "Path not found: /path/to/file");

        let err = FsError::Io {
            path: "disk".into(),
            code: 28,
        };
        assert_eq!(format!("{}", err), "IO error at disk (native code 28)");
    }

    #[test]
    fn test_with_subject_keeps_kind() {
        let err = FsError::PermissionDenied("a".into()).with_subject("b");
        assert_eq!(err, FsError::PermissionDenied("b".into()));
    }

    #[test]
    fn test_into_io_error() {
        let io_err: std::io::Error = FsError::AlreadyExists("x".into()).into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::AlreadyExists);

        let io_err: std::io::Error = FsError::CrossDevice("x".into()).into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::Other);
    }
}
