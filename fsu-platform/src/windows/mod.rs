//! Windows backend
//!
//! Wide-character Win32 calls via `windows-sys`. Paths are rendered with `\`
//! and, when [`BackendConfig::extended_length_paths`] is set, long absolute
//! paths get the `\\?\` prefix. Every failure goes through the Win32 error
//! table in `win_translate`.

mod dir;
mod file;

use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle, RawHandle};
use std::ptr;

use fsu_core::{
    BackendConfig, CreatePolicy, EntryKind, FileSystem, FsError, FsPath, FsResult, Metadata,
    OpenMode, PathStyle, Platform,
};
use tracing::debug;
use windows_sys::Win32::Foundation::{
    GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateDirectoryW, CreateFileW, CreateSymbolicLinkW, DeleteFileW, GetFileAttributesExW,
    GetFileAttributesW, GetFileExInfoStandard, MoveFileExW, RemoveDirectoryW, SetFileAttributesW,
    CREATE_ALWAYS, CREATE_NEW, FILE_ATTRIBUTE_NORMAL,
    FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OPEN_REPARSE_POINT, FILE_GENERIC_WRITE,
    FILE_READ_ATTRIBUTES, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE, FILE_WRITE_DATA,
    INVALID_FILE_ATTRIBUTES, MOVEFILE_REPLACE_EXISTING, OPEN_ALWAYS, OPEN_EXISTING,
    SYMBOLIC_LINK_FLAG_ALLOW_UNPRIVILEGED_CREATE, SYMBOLIC_LINK_FLAG_DIRECTORY,
    WIN32_FILE_ATTRIBUTE_DATA,
};
use windows_sys::Win32::System::IO::DeviceIoControl;

use crate::tree::{self, RawChild, RawTree};
use crate::win_translate::{
    encode_wide, error_from_win32, find_pattern, join_u32, join_wide, metadata_from_attributes,
    native_path, parse_reparse_target, settable_attributes, strip_extended_prefix, terminated,
    to_wide, tree_root_path, wide_name, RawAttributes, ERROR_ACCESS_DENIED,
    ERROR_INVALID_PARAMETER, FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_READONLY,
};
use dir::find_attributes;
use file::{filetime, handle_attributes};

pub use dir::WindowsDir;
pub use file::WindowsFile;

const SHARE_ALL: u32 = FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE;
const FSCTL_GET_REPARSE_POINT: u32 = 0x0009_00A8;
const MAXIMUM_REPARSE_DATA_BUFFER_SIZE: usize = 16 * 1024;

/// Backend over the Win32 file APIs
#[derive(Debug, Clone, Default)]
pub struct WindowsFs {
    config: BackendConfig,
}

fn last_error() -> u32 {
    unsafe { GetLastError() }
}

impl WindowsFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn wide(&self, path: &FsPath) -> FsResult<Vec<u16>> {
        Ok(to_wide(&native_path(path, self.config.extended_length_paths)?))
    }

    /// Attributes of the object itself, not following reparse points
    fn attributes(&self, path: &FsPath) -> FsResult<RawAttributes> {
        Self::attributes_wide(&self.wide(path)?)
            .map_err(|code| error_from_win32(code, path.to_string()))
    }

    fn attributes_wide(name: &[u16]) -> Result<RawAttributes, u32> {
        let mut data: WIN32_FILE_ATTRIBUTE_DATA = unsafe { std::mem::zeroed() };
        let ok = unsafe {
            GetFileAttributesExW(
                name.as_ptr(),
                GetFileExInfoStandard,
                (&mut data as *mut WIN32_FILE_ATTRIBUTE_DATA).cast(),
            )
        };
        if ok == 0 {
            return Err(last_error());
        }
        Ok(RawAttributes {
            attributes: data.dwFileAttributes,
            size: join_u32(data.nFileSizeHigh, data.nFileSizeLow),
            created: filetime(&data.ftCreationTime),
            accessed: filetime(&data.ftLastAccessTime),
            modified: filetime(&data.ftLastWriteTime),
        })
    }

    /// `rename` of a directory onto an existing non-directory
    fn replaces_non_directory(&self, from: &FsPath, to: &FsPath) -> bool {
        match (self.attributes(from), self.attributes(to)) {
            (Ok(src), Ok(dst)) => {
                src.attributes & FILE_ATTRIBUTE_DIRECTORY != 0
                    && dst.attributes & FILE_ATTRIBUTE_DIRECTORY == 0
            }
            _ => false,
        }
    }

    fn is_directory(&self, path: &FsPath) -> bool {
        self.attributes(path)
            .map(|a| a.attributes & FILE_ATTRIBUTE_DIRECTORY != 0)
            .unwrap_or(false)
    }

    fn create_file(
        name: &[u16],
        access: u32,
        disposition: u32,
        flags: u32,
    ) -> Result<OwnedHandle, u32> {
        let handle = unsafe {
            CreateFileW(
                name.as_ptr(),
                access,
                SHARE_ALL,
                ptr::null(),
                disposition,
                flags,
                ptr::null_mut(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(last_error());
        }
        Ok(unsafe { OwnedHandle::from_raw_handle(handle as RawHandle) })
    }

    fn delete_entry(name: &[u16], is_dir: bool) -> Result<(), u32> {
        let ok = unsafe {
            if is_dir {
                RemoveDirectoryW(name.as_ptr())
            } else {
                DeleteFileW(name.as_ptr())
            }
        };
        if ok == 0 {
            return Err(last_error());
        }
        Ok(())
    }

    /// Delete one entry. A read-only one is made writable and retried once,
    /// so removal ignores the attribute the way `unlink` ignores file mode.
    fn remove_wide(name: &[u16], attributes: u32) -> Result<(), u32> {
        // Directory symlinks and junctions go through RemoveDirectoryW too
        let is_dir = attributes & FILE_ATTRIBUTE_DIRECTORY != 0;
        match Self::delete_entry(name, is_dir) {
            Err(ERROR_ACCESS_DENIED) if attributes & FILE_ATTRIBUTE_READONLY != 0 => {
                let writable = settable_attributes(attributes & !FILE_ATTRIBUTE_READONLY);
                if unsafe { SetFileAttributesW(name.as_ptr(), writable) } == 0 {
                    return Err(last_error());
                }
                Self::delete_entry(name, is_dir)
            }
            other => other,
        }
    }

    fn create_symlink(link: &[u16], target: &[u16], flags: u32) -> Result<(), u32> {
        if unsafe { CreateSymbolicLinkW(link.as_ptr(), target.as_ptr(), flags) } == 0 {
            return Err(last_error());
        }
        Ok(())
    }
}

impl FileSystem for WindowsFs {
    type File = WindowsFile;
    type Dir = WindowsDir;

    fn name(&self) -> &'static str {
        "windows"
    }

    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn open(&self, path: &FsPath, mode: OpenMode, policy: CreatePolicy) -> FsResult<WindowsFile> {
        policy.validate(mode, &path.to_string())?;
        let access = match mode {
            OpenMode::Read => GENERIC_READ,
            OpenMode::Write => GENERIC_WRITE,
            OpenMode::ReadWrite => GENERIC_READ | GENERIC_WRITE,
            // Append data only, so every write lands at the end
            OpenMode::Append => FILE_GENERIC_WRITE & !FILE_WRITE_DATA,
        };
        let disposition = match policy {
            CreatePolicy::MustExist => OPEN_EXISTING,
            CreatePolicy::CreateIfMissing => OPEN_ALWAYS,
            CreatePolicy::CreateExclusive => CREATE_NEW,
            CreatePolicy::Truncate => CREATE_ALWAYS,
        };

        let name = self.wide(path)?;
        let handle = Self::create_file(
            &name,
            access,
            disposition,
            FILE_ATTRIBUTE_NORMAL | FILE_FLAG_BACKUP_SEMANTICS,
        )
        .map_err(|code| {
            if code == ERROR_ACCESS_DENIED && self.is_directory(path) {
                FsError::IsADirectory(path.to_string())
            } else {
                error_from_win32(code, path.to_string())
            }
        })?;

        let raw = handle_attributes(handle.as_raw_handle() as HANDLE)
            .map_err(|code| error_from_win32(code, path.to_string()))?;
        if raw.attributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
            return Err(FsError::IsADirectory(path.to_string()));
        }

        debug!(path = %path, ?mode, ?policy, "opened file");
        Ok(WindowsFile::new(handle, path.clone(), mode))
    }

    fn stat(&self, path: &FsPath) -> FsResult<Metadata> {
        let name = self.wide(path)?;
        let handle = Self::create_file(
            &name,
            FILE_READ_ATTRIBUTES,
            OPEN_EXISTING,
            FILE_FLAG_BACKUP_SEMANTICS,
        )
        .map_err(|code| error_from_win32(code, path.to_string()))?;
        let raw = handle_attributes(handle.as_raw_handle() as HANDLE)
            .map_err(|code| error_from_win32(code, path.to_string()))?;
        Ok(metadata_from_attributes(&raw, path.file_name()))
    }

    fn lstat(&self, path: &FsPath) -> FsResult<Metadata> {
        let raw = self.attributes(path)?;
        Ok(metadata_from_attributes(&raw, path.file_name()))
    }

    fn list(&self, path: &FsPath) -> FsResult<WindowsDir> {
        if self.attributes(path)?.attributes & FILE_ATTRIBUTE_DIRECTORY == 0 {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        let dir = encode_wide(&native_path(path, self.config.extended_length_paths)?);
        WindowsDir::open(&find_pattern(&dir), path.to_string())
    }

    fn mkdir(&self, path: &FsPath, recursive: bool) -> FsResult<()> {
        if recursive {
            return tree::create_all(self, path);
        }
        let name = self.wide(path)?;
        if unsafe { CreateDirectoryW(name.as_ptr(), ptr::null()) } == 0 {
            return Err(error_from_win32(last_error(), path.to_string()));
        }
        debug!(path = %path, "created directory");
        Ok(())
    }

    fn remove(&self, path: &FsPath, recursive: bool) -> FsResult<()> {
        if recursive {
            return tree::remove_all(self, path);
        }
        let name = self.wide(path)?;
        let attributes = self.attributes(path)?.attributes;
        Self::remove_wide(&name, attributes)
            .map_err(|code| error_from_win32(code, path.to_string()))?;
        debug!(path = %path, "removed");
        Ok(())
    }

    fn rename(&self, from: &FsPath, to: &FsPath) -> FsResult<()> {
        let (w_from, w_to) = (self.wide(from)?, self.wide(to)?);
        if unsafe { MoveFileExW(w_from.as_ptr(), w_to.as_ptr(), MOVEFILE_REPLACE_EXISTING) } == 0 {
            let subject = format!("{} -> {}", from, to);
            return Err(match last_error() {
                // Reported as access denied; classify it the way POSIX does
                _ if self.replaces_non_directory(from, to) => FsError::NotADirectory(subject),
                code => error_from_win32(code, subject),
            });
        }
        debug!(from = %from, to = %to, "renamed");
        Ok(())
    }

    fn symlink(&self, target: &FsPath, link: &FsPath) -> FsResult<()> {
        // A relative target is resolved against the directory holding the link
        let resolved = match (target.has_root(), link.parent()) {
            (false, Some(dir)) => dir.join(target).unwrap_or_else(|_| target.clone()),
            _ => target.clone(),
        };
        let mut flags = 0;
        if self.stat(&resolved).map(|m| m.is_dir()).unwrap_or(false) {
            flags |= SYMBOLIC_LINK_FLAG_DIRECTORY;
        }

        let w_link = self.wide(link)?;
        // The stored target must stay exactly as given, relative or not
        let w_target = to_wide(&target.to_string());
        let mut result = if self.config.unprivileged_symlinks {
            Self::create_symlink(
                &w_link,
                &w_target,
                flags | SYMBOLIC_LINK_FLAG_ALLOW_UNPRIVILEGED_CREATE,
            )
        } else {
            Self::create_symlink(&w_link, &w_target, flags)
        };
        // Older systems reject the unprivileged flag outright
        if result == Err(ERROR_INVALID_PARAMETER) && self.config.unprivileged_symlinks {
            result = Self::create_symlink(&w_link, &w_target, flags);
        }
        result.map_err(|code| error_from_win32(code, link.to_string()))?;
        debug!(link = %link, target = %target, "created symlink");
        Ok(())
    }

    fn readlink(&self, link: &FsPath) -> FsResult<FsPath> {
        let name = self.wide(link)?;
        let handle = Self::create_file(
            &name,
            0,
            OPEN_EXISTING,
            FILE_FLAG_OPEN_REPARSE_POINT | FILE_FLAG_BACKUP_SEMANTICS,
        )
        .map_err(|code| error_from_win32(code, link.to_string()))?;

        let mut buf = vec![0u8; MAXIMUM_REPARSE_DATA_BUFFER_SIZE];
        let mut returned = 0u32;
        let ok = unsafe {
            DeviceIoControl(
                handle.as_raw_handle() as HANDLE,
                FSCTL_GET_REPARSE_POINT,
                ptr::null(),
                0,
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                &mut returned,
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(error_from_win32(last_error(), link.to_string()));
        }
        buf.truncate(returned as usize);

        let target = parse_reparse_target(&buf).ok_or_else(|| {
            FsError::InvalidArgument(format!("{}: not a symbolic link", link))
        })?;
        FsPath::normalize_with(&strip_extended_prefix(&target), PathStyle::Windows)
    }

    fn set_readonly(&self, path: &FsPath, readonly: bool) -> FsResult<()> {
        let name = self.wide(path)?;
        let attributes = unsafe { GetFileAttributesW(name.as_ptr()) };
        if attributes == INVALID_FILE_ATTRIBUTES {
            return Err(error_from_win32(last_error(), path.to_string()));
        }
        let updated = if readonly {
            attributes | FILE_ATTRIBUTE_READONLY
        } else {
            attributes & !FILE_ATTRIBUTE_READONLY
        };
        if unsafe { SetFileAttributesW(name.as_ptr(), settable_attributes(updated)) } == 0 {
            return Err(error_from_win32(last_error(), path.to_string()));
        }
        debug!(path = %path, readonly, "changed attributes");
        Ok(())
    }
}

impl RawTree for WindowsFs {
    /// UTF-16 path without terminator
    type Loc = Vec<u16>;

    fn locate(&self, path: &FsPath) -> FsResult<Vec<u16>> {
        Ok(encode_wide(&tree_root_path(
            path,
            self.config.extended_length_paths,
        )?))
    }

    fn display(&self, loc: &Vec<u16>) -> String {
        String::from_utf16_lossy(loc)
    }

    fn raw_kind(&self, loc: &Vec<u16>) -> FsResult<EntryKind> {
        Self::attributes_wide(&terminated(loc))
            .map(|raw| metadata_from_attributes(&raw, None).kind)
            .map_err(|code| error_from_win32(code, self.display(loc)))
    }

    fn raw_children(&self, dir: &Vec<u16>) -> FsResult<Vec<FsResult<RawChild<Vec<u16>>>>> {
        let mut search = WindowsDir::open(&find_pattern(dir), self.display(dir))?;
        let mut children = Vec::new();
        while let Some(next) = search.next_raw() {
            children.push(next.map(|data| RawChild {
                loc: join_wide(dir, wide_name(&data.cFileName)),
                kind: Some(metadata_from_attributes(&find_attributes(&data), None).kind),
            }));
        }
        Ok(children)
    }

    fn raw_remove(&self, loc: &Vec<u16>, _kind: EntryKind) -> FsResult<()> {
        let name = terminated(loc);
        Self::attributes_wide(&name)
            .and_then(|raw| Self::remove_wide(&name, raw.attributes))
            .map_err(|code| error_from_win32(code, self.display(loc)))
    }
}
