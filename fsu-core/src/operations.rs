//! Operation parameters

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// Access requested when opening a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenMode {
    Read,
    Write,
    ReadWrite,
    /// Write-only; every write goes to the current end of file
    Append,
}

impl OpenMode {
    pub fn is_readable(self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, OpenMode::Read)
    }

    /// `InvalidHandle` unless a handle opened in this mode may be read.
    pub fn check_readable(self, subject: &str) -> FsResult<()> {
        if self.is_readable() {
            return Ok(());
        }
        Err(FsError::InvalidHandle(format!(
            "{}: opened {:?}, not readable",
            subject, self
        )))
    }

    /// `InvalidHandle` unless a handle opened in this mode may be written.
    pub fn check_writable(self, subject: &str) -> FsResult<()> {
        if self.is_writable() {
            return Ok(());
        }
        Err(FsError::InvalidHandle(format!(
            "{}: opened {:?}, not writable",
            subject, self
        )))
    }
}

/// What to do about a missing or existing file on open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CreatePolicy {
    #[default]
    MustExist,
    CreateIfMissing,
    /// Fail with `AlreadyExists` if the file is present
    CreateExclusive,
    /// Create if missing, truncate to zero length if present
    Truncate,
}

impl CreatePolicy {
    pub fn creates(self) -> bool {
        !matches!(self, CreatePolicy::MustExist)
    }

    /// Reject combinations no backend can honor.
    pub fn validate(self, mode: OpenMode, subject: &str) -> FsResult<()> {
        if self == CreatePolicy::Truncate && !mode.is_writable() {
            return Err(FsError::InvalidArgument(format!(
                "{}: truncate requires a writable mode",
                subject
            )));
        }
        Ok(())
    }
}

/// Reference point for a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeekOrigin {
    Start,
    Current,
    End,
}

/// How [`move_path`](crate::FileSystem::move_path) got the object to its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    Renamed,
    /// Source and destination were on different volumes
    Copied,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_mode_access() {
        assert!(OpenMode::Read.is_readable());
        assert!(!OpenMode::Read.is_writable());
        assert!(OpenMode::ReadWrite.is_readable() && OpenMode::ReadWrite.is_writable());
        assert!(!OpenMode::Append.is_readable());
        assert!(OpenMode::Append.is_writable());
    }

    #[test]
    fn test_access_checks() {
        assert!(OpenMode::ReadWrite.check_readable("/f").is_ok());
        assert!(OpenMode::Append.check_writable("/f").is_ok());

        let err = OpenMode::Write.check_readable("/f").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
        let err = OpenMode::Read.check_writable("/f").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
        assert_eq!(err.subject(), "/f: opened Read, not writable");
    }

    #[test]
    fn test_truncate_needs_write() {
        let err = CreatePolicy::Truncate
            .validate(OpenMode::Read, "f")
            .unwrap_err();
        assert!(matches!(err, FsError::InvalidArgument(_)));
        assert!(CreatePolicy::Truncate.validate(OpenMode::Write, "f").is_ok());
        assert!(CreatePolicy::MustExist.validate(OpenMode::Read, "f").is_ok());
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(CreatePolicy::default(), CreatePolicy::MustExist);
        assert!(!CreatePolicy::MustExist.creates());
        assert!(CreatePolicy::CreateExclusive.creates());
    }
}
