//! Win32 data translation
//!
//! Pure functions over plain integers and buffers, so they build and test on
//! every host. Values match the Windows SDK headers.

use fsu_core::metadata::timestamp_from_filetime;
use fsu_core::{
    EntryKind, ErrorKind, FsError, FsPath, FsResult, Metadata, PathStyle, Permissions, Root,
};

pub(crate) const ERROR_FILE_NOT_FOUND: u32 = 2;
pub(crate) const ERROR_PATH_NOT_FOUND: u32 = 3;
pub(crate) const ERROR_ACCESS_DENIED: u32 = 5;
pub(crate) const ERROR_INVALID_HANDLE: u32 = 6;
pub(crate) const ERROR_INVALID_DRIVE: u32 = 15;
pub(crate) const ERROR_NOT_SAME_DEVICE: u32 = 17;
pub(crate) const ERROR_NO_MORE_FILES: u32 = 18;
pub(crate) const ERROR_WRITE_PROTECT: u32 = 19;
pub(crate) const ERROR_SHARING_VIOLATION: u32 = 32;
pub(crate) const ERROR_LOCK_VIOLATION: u32 = 33;
pub(crate) const ERROR_HANDLE_EOF: u32 = 38;
pub(crate) const ERROR_FILE_EXISTS: u32 = 80;
pub(crate) const ERROR_INVALID_PARAMETER: u32 = 87;
pub(crate) const ERROR_BROKEN_PIPE: u32 = 109;
pub(crate) const ERROR_NEGATIVE_SEEK: u32 = 131;
pub(crate) const ERROR_DIR_NOT_EMPTY: u32 = 145;
pub(crate) const ERROR_BAD_PATHNAME: u32 = 161;
pub(crate) const ERROR_ALREADY_EXISTS: u32 = 183;
pub(crate) const ERROR_FILENAME_EXCED_RANGE: u32 = 206;
pub(crate) const ERROR_INVALID_NAME: u32 = 123;
pub(crate) const ERROR_DIRECTORY: u32 = 267;
pub(crate) const ERROR_PRIVILEGE_NOT_HELD: u32 = 1314;
pub(crate) const ERROR_NOT_A_REPARSE_POINT: u32 = 4390;

pub(crate) const FILE_ATTRIBUTE_READONLY: u32 = 0x0000_0001;
pub(crate) const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x0000_0010;
pub(crate) const FILE_ATTRIBUTE_NORMAL: u32 = 0x0000_0080;
pub(crate) const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x0000_0400;

pub(crate) const IO_REPARSE_TAG_MOUNT_POINT: u32 = 0xA000_0003;
pub(crate) const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;

/// Longest path the non-prefixed Win32 APIs accept, terminator included
const MAX_PATH: usize = 260;

/// Every Win32 error the Windows backend classifies. Anything else is
/// `ErrorKind::Io`.
pub(crate) const WIN32_ERROR_TABLE: &[(u32, ErrorKind)] = &[
    (ERROR_FILE_NOT_FOUND, ErrorKind::NotFound),
    (ERROR_PATH_NOT_FOUND, ErrorKind::NotFound),
    (ERROR_INVALID_DRIVE, ErrorKind::NotFound),
    (ERROR_ACCESS_DENIED, ErrorKind::PermissionDenied),
    (ERROR_SHARING_VIOLATION, ErrorKind::PermissionDenied),
    (ERROR_LOCK_VIOLATION, ErrorKind::PermissionDenied),
    (ERROR_PRIVILEGE_NOT_HELD, ErrorKind::PermissionDenied),
    (ERROR_WRITE_PROTECT, ErrorKind::PermissionDenied),
    (ERROR_FILE_EXISTS, ErrorKind::AlreadyExists),
    (ERROR_ALREADY_EXISTS, ErrorKind::AlreadyExists),
    (ERROR_DIRECTORY, ErrorKind::NotADirectory),
    (ERROR_DIR_NOT_EMPTY, ErrorKind::NotEmpty),
    (ERROR_INVALID_NAME, ErrorKind::InvalidPath),
    (ERROR_BAD_PATHNAME, ErrorKind::InvalidPath),
    (ERROR_FILENAME_EXCED_RANGE, ErrorKind::InvalidPath),
    (ERROR_INVALID_PARAMETER, ErrorKind::InvalidArgument),
    (ERROR_NEGATIVE_SEEK, ErrorKind::InvalidArgument),
    (ERROR_NOT_A_REPARSE_POINT, ErrorKind::InvalidArgument),
    (ERROR_INVALID_HANDLE, ErrorKind::InvalidHandle),
    (ERROR_NOT_SAME_DEVICE, ErrorKind::CrossDevice),
];

pub(crate) fn kind_of(code: u32) -> ErrorKind {
    WIN32_ERROR_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Io)
}

pub(crate) fn error_from_win32(code: u32, subject: impl Into<String>) -> FsError {
    FsError::from_native(kind_of(code), subject, code as i32)
}

/// Combine the two halves of a FILETIME or file size
pub(crate) fn join_u32(high: u32, low: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Attribute data common to `WIN32_FILE_ATTRIBUTE_DATA`,
/// `BY_HANDLE_FILE_INFORMATION` and `WIN32_FIND_DATAW`
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RawAttributes {
    pub attributes: u32,
    pub size: u64,
    pub created: u64,
    pub accessed: u64,
    pub modified: u64,
}

/// Extensions Windows runs directly
const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "com", "bat", "cmd"];

pub(crate) fn metadata_from_attributes(raw: &RawAttributes, name: Option<&str>) -> Metadata {
    let is_reparse = raw.attributes & FILE_ATTRIBUTE_REPARSE_POINT != 0;
    let is_dir = raw.attributes & FILE_ATTRIBUTE_DIRECTORY != 0;
    let kind = if is_reparse {
        EntryKind::Symlink
    } else if is_dir {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let executable = is_dir
        || name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| {
                EXECUTABLE_EXTENSIONS
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);
    Metadata {
        kind,
        size: if is_dir { 0 } else { raw.size },
        modified: timestamp_from_filetime(raw.modified),
        accessed: Some(timestamp_from_filetime(raw.accessed)),
        created: Some(timestamp_from_filetime(raw.created)),
        permissions: Permissions {
            readable: true,
            writable: raw.attributes & FILE_ATTRIBUTE_READONLY == 0,
            executable,
            mode: None,
        },
        is_reparse_point: is_reparse,
    }
}

/// Attributes `SetFileAttributesW` accepts back. The type bits are not
/// settable, and an empty set must be spelled `FILE_ATTRIBUTE_NORMAL`.
pub(crate) fn settable_attributes(attributes: u32) -> u32 {
    let attrs = attributes
        & !(FILE_ATTRIBUTE_DIRECTORY | FILE_ATTRIBUTE_REPARSE_POINT | FILE_ATTRIBUTE_NORMAL);
    if attrs == 0 {
        FILE_ATTRIBUTE_NORMAL
    } else {
        attrs
    }
}

/// NUL-terminated UTF-16 for the wide Win32 APIs
pub(crate) fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Decode a NUL-terminated (or full) UTF-16 buffer
pub(crate) fn from_wide(buf: &[u16]) -> Option<String> {
    String::from_utf16(wide_name(buf)).ok()
}

/// Native string for `path`, with the `\\?\` prefix when it is too long for
/// the plain APIs.
pub(crate) fn native_path(path: &FsPath, extended: bool) -> FsResult<String> {
    if path.style() != PathStyle::Windows {
        return Err(FsError::InvalidPath(format!("{}: not a Windows path", path)));
    }
    let rendered = path.to_string();
    if !extended || rendered.len() < MAX_PATH {
        return Ok(rendered);
    }
    Ok(with_extended_prefix(path, rendered))
}

/// Native string for the top of a tree walk. Children can outgrow
/// `MAX_PATH`, so an eligible path takes the prefix whatever its length.
pub(crate) fn tree_root_path(path: &FsPath, extended: bool) -> FsResult<String> {
    let rendered = native_path(path, false)?;
    if !extended {
        return Ok(rendered);
    }
    Ok(with_extended_prefix(path, rendered))
}

/// Only absolute paths without `.`/`..` can take the prefix, since it turns
/// off the normalization that would resolve them.
fn with_extended_prefix(path: &FsPath, rendered: String) -> String {
    let has_dots = path.segments().iter().any(|s| s == "." || s == "..");
    if !path.is_absolute() || has_dots {
        return rendered;
    }
    match path.root() {
        Root::Unc { .. } => format!("\\\\?\\UNC\\{}", &rendered[2..]),
        _ => format!("\\\\?\\{}", rendered),
    }
}

/// UTF-16 without a terminator
pub(crate) fn encode_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Copy of `wide` with the NUL the Win32 APIs expect
pub(crate) fn terminated(wide: &[u16]) -> Vec<u16> {
    wide.iter().copied().chain(std::iter::once(0)).collect()
}

/// Name in a fixed buffer such as `cFileName`, up to its NUL
pub(crate) fn wide_name(buf: &[u16]) -> &[u16] {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    &buf[..end]
}

/// `dir\name`. A directory ending in a separator, or a bare drive designator
/// such as `C:` (the current directory on that drive), takes the name as is.
pub(crate) fn join_wide(dir: &[u16], name: &[u16]) -> Vec<u16> {
    let mut joined = dir.to_vec();
    match dir.last() {
        Some(&c) if c == u16::from(b'\\') || c == u16::from(b'/') || c == u16::from(b':') => {}
        Some(_) => joined.push(u16::from(b'\\')),
        None => {}
    }
    joined.extend_from_slice(name);
    joined
}

/// `FindFirstFileW` pattern matching every entry of `dir`
pub(crate) fn find_pattern(dir: &[u16]) -> Vec<u16> {
    terminated(&join_wide(dir, &[u16::from(b'*')]))
}

/// Undo the `\\?\` prefix some link targets are stored with.
pub(crate) fn strip_extended_prefix(target: &str) -> String {
    if let Some(rest) = target.strip_prefix("\\\\?\\UNC\\") {
        format!("\\\\{}", rest)
    } else if let Some(rest) = target.strip_prefix("\\\\?\\") {
        rest.to_string()
    } else {
        target.to_string()
    }
}

/// Target stored in a `REPARSE_DATA_BUFFER` for a symlink or mount point.
///
/// Layout: tag (4), data length (2), reserved (2), substitute name offset and
/// length, print name offset and length (2 each), then for symlinks a 4 byte
/// flags field, then the UTF-16 path buffer. Offsets are relative to the
/// path buffer.
pub(crate) fn parse_reparse_target(buf: &[u8]) -> Option<String> {
    let u16_at = |off: usize| -> Option<u16> {
        buf.get(off..off + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    };
    let tag = u32::from_le_bytes(buf.get(0..4)?.try_into().ok()?);
    let path_buffer = match tag {
        IO_REPARSE_TAG_SYMLINK => 20,
        IO_REPARSE_TAG_MOUNT_POINT => 16,
        _ => return None,
    };
    let sub_off = usize::from(u16_at(8)?);
    let sub_len = usize::from(u16_at(10)?);
    let print_off = usize::from(u16_at(12)?);
    let print_len = usize::from(u16_at(14)?);

    let read_name = |off: usize, len: usize| -> Option<String> {
        let bytes = buf.get(path_buffer + off..path_buffer + off + len)?;
        let wide: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&wide).ok()
    };

    match read_name(print_off, print_len) {
        Some(print) if !print.is_empty() => Some(print),
        _ => {
            let sub = read_name(sub_off, sub_len)?;
            Some(sub.strip_prefix("\\??\\").map(str::to_string).unwrap_or(sub))
        }
    }
}
