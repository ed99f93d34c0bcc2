//! `struct stat` conversion

use chrono::{DateTime, Utc};
use fsu_core::metadata::timestamp_from_unix;
use fsu_core::{EntryKind, Metadata, Permissions};

pub(crate) fn kind_from_mode(mode: libc::mode_t) -> EntryKind {
    match mode & libc::S_IFMT {
        libc::S_IFREG => EntryKind::File,
        libc::S_IFDIR => EntryKind::Directory,
        libc::S_IFLNK => EntryKind::Symlink,
        _ => EntryKind::Other,
    }
}

/// Kind hint from a `dirent::d_type`. `DT_UNKNOWN` means the file system
/// did not say.
pub(crate) fn kind_from_d_type(d_type: u8) -> Option<EntryKind> {
    match d_type {
        libc::DT_REG => Some(EntryKind::File),
        libc::DT_DIR => Some(EntryKind::Directory),
        libc::DT_LNK => Some(EntryKind::Symlink),
        libc::DT_UNKNOWN => None,
        _ => Some(EntryKind::Other),
    }
}

pub(crate) fn metadata_from_stat(st: &libc::stat) -> Metadata {
    let kind = kind_from_mode(st.st_mode);
    Metadata {
        kind,
        size: st.st_size as u64,
        modified: timestamp_from_unix(st.st_mtime as i64, st.st_mtime_nsec as u32),
        accessed: Some(timestamp_from_unix(st.st_atime as i64, st.st_atime_nsec as u32)),
        created: birth_time(st),
        permissions: Permissions::from_mode(st.st_mode as u32),
        is_reparse_point: kind == EntryKind::Symlink,
    }
}

#[cfg(target_os = "macos")]
fn birth_time(st: &libc::stat) -> Option<DateTime<Utc>> {
    Some(timestamp_from_unix(
        st.st_birthtime as i64,
        st.st_birthtime_nsec as u32,
    ))
}

// statx would have it on Linux; plain stat does not
#[cfg(not(target_os = "macos"))]
fn birth_time(_st: &libc::stat) -> Option<DateTime<Utc>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mode() {
        assert_eq!(kind_from_mode(libc::S_IFREG | 0o644), EntryKind::File);
        assert_eq!(kind_from_mode(libc::S_IFDIR | 0o755), EntryKind::Directory);
        assert_eq!(kind_from_mode(libc::S_IFLNK | 0o777), EntryKind::Symlink);
        assert_eq!(kind_from_mode(libc::S_IFIFO | 0o600), EntryKind::Other);
    }

    #[test]
    fn test_kind_from_d_type() {
        assert_eq!(kind_from_d_type(libc::DT_DIR), Some(EntryKind::Directory));
        assert_eq!(kind_from_d_type(libc::DT_UNKNOWN), None);
        assert_eq!(kind_from_d_type(libc::DT_SOCK), Some(EntryKind::Other));
    }

    #[test]
    fn test_metadata_from_stat() {
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        st.st_mode = libc::S_IFREG | 0o640;
        st.st_size = 1234;
        st.st_mtime = 1_700_000_000;
        st.st_mtime_nsec = 42;

        let meta = metadata_from_stat(&st);
        assert!(meta.is_file());
        assert_eq!(meta.size, 1234);
        assert_eq!(meta.modified_unix_nanos(), 1_700_000_000_000_000_042);
        assert_eq!(meta.permissions.mode, Some(0o640));
        assert!(!meta.permissions.executable);
        assert!(!meta.is_reparse_point);
    }
}
