//! File and directory metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::EntryKind;

/// Seconds between 1601-01-01 and 1970-01-01, in 100 ns ticks
const FILETIME_UNIX_EPOCH: u64 = 116_444_736_000_000_000;

/// Metadata of one file-system object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Size in bytes. For directories and links this is whatever the
    /// platform reports.
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub accessed: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub permissions: Permissions,
    /// POSIX: the object is a symlink. Windows: `FILE_ATTRIBUTE_REPARSE_POINT`.
    pub is_reparse_point: bool,
}

impl Metadata {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    /// Modification time as nanoseconds since the Unix epoch
    pub fn modified_unix_nanos(&self) -> i128 {
        i128::from(self.modified.timestamp()) * 1_000_000_000
            + i128::from(self.modified.timestamp_subsec_nanos())
    }
}

/// Access permissions as seen by the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    /// Raw POSIX mode bits; `None` on Windows
    pub mode: Option<u32>,
}

impl Permissions {
    pub fn from_mode(mode: u32) -> Self {
        Self {
            readable: mode & 0o400 != 0,
            writable: mode & 0o200 != 0,
            executable: mode & 0o100 != 0,
            mode: Some(mode & 0o7777),
        }
    }

    pub fn is_readonly(&self) -> bool {
        !self.writable
    }
}

/// Build a UTC timestamp from POSIX seconds + nanoseconds.
///
/// Out-of-range values clamp to the epoch rather than failing the whole stat.
pub fn timestamp_from_unix(secs: i64, nanos: u32) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

/// Build a UTC timestamp from a Windows FILETIME (100 ns ticks since 1601).
pub fn timestamp_from_filetime(ticks: u64) -> DateTime<Utc> {
    let since_unix = ticks as i128 - FILETIME_UNIX_EPOCH as i128;
    let secs = since_unix.div_euclid(10_000_000);
    let nanos = (since_unix.rem_euclid(10_000_000) * 100) as u32;
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, nanos))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: EntryKind) -> Metadata {
        Metadata {
            kind,
            size: 42,
            modified: timestamp_from_unix(1_700_000_000, 123_456_789),
            accessed: None,
            created: None,
            permissions: Permissions::from_mode(0o644),
            is_reparse_point: false,
        }
    }

    #[test]
    fn test_permissions_from_mode() {
        let perms = Permissions::from_mode(0o644);
        assert!(perms.readable);
        assert!(perms.writable);
        assert!(!perms.executable);
        assert_eq!(perms.mode, Some(0o644));

        let perms = Permissions::from_mode(0o100555);
        assert!(perms.is_readonly());
        assert!(perms.executable);
        assert_eq!(perms.mode, Some(0o555));
    }

    #[test]
    fn test_permissions_ignore_group_and_other_bits() {
        let perms = Permissions::from_mode(0o077);
        assert!(!perms.readable);
        assert!(perms.is_readonly());
        assert!(!perms.executable);

        let perms = Permissions::from_mode(0o700);
        assert!(perms.readable && perms.writable && perms.executable);
    }

    #[test]
    fn test_kind_helpers() {
        assert!(sample(EntryKind::File).is_file());
        assert!(sample(EntryKind::Directory).is_dir());
        assert!(sample(EntryKind::Symlink).is_symlink());
        assert!(!sample(EntryKind::Other).is_file());
    }

    #[test]
    fn test_unix_nanos_keeps_precision() {
        let meta = sample(EntryKind::File);
        assert_eq!(meta.modified_unix_nanos(), 1_700_000_000_123_456_789);
    }

    #[test]
    fn test_filetime_conversion() {
        assert_eq!(timestamp_from_filetime(FILETIME_UNIX_EPOCH).timestamp(), 0);

        // 2023-11-14T22:13:20Z plus 1234567 ticks (0.1234567 s)
        let ticks = FILETIME_UNIX_EPOCH + 1_700_000_000 * 10_000_000 + 1_234_567;
        let ts = timestamp_from_filetime(ticks);
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_nanos(), 123_456_700);
    }

    #[test]
    fn test_filetime_before_unix_epoch() {
        let ts = timestamp_from_filetime(FILETIME_UNIX_EPOCH - 5_000_000);
        assert_eq!(ts.timestamp(), -1);
        assert_eq!(ts.timestamp_subsec_nanos(), 500_000_000);
    }

    #[test]
    fn test_metadata_serializes() {
        let meta = sample(EntryKind::Directory);
        let json = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
