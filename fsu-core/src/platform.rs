//! Compile-time platform description
//!
//! Supports: Linux, macOS, Windows

use serde::{Deserialize, Serialize};

use crate::path::PathStyle;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
compile_error!("fsu supports linux, macos and windows targets only");

/// Operating system family a backend targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this crate was compiled for
    #[cfg(target_os = "windows")]
    pub const CURRENT: Platform = Platform::Windows;
    #[cfg(target_os = "macos")]
    pub const CURRENT: Platform = Platform::MacOs;
    #[cfg(target_os = "linux")]
    pub const CURRENT: Platform = Platform::Linux;

    pub const fn path_style(self) -> PathStyle {
        match self {
            Platform::Windows => PathStyle::Windows,
            Platform::MacOs | Platform::Linux => PathStyle::Posix,
        }
    }

    pub fn capabilities(self) -> PlatformCapabilities {
        match self {
            Platform::Windows => PlatformCapabilities::windows(),
            Platform::MacOs => PlatformCapabilities::macos(),
            Platform::Linux => PlatformCapabilities::linux(),
        }
    }
}

/// What the native file system can be relied on to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub symlinks: bool,
    pub symlinks_require_privilege: bool,
    pub case_sensitive_paths: bool,
    pub atomic_rename: bool,
    pub unix_permissions: bool,
}

impl PlatformCapabilities {
    pub fn detect() -> Self {
        Platform::CURRENT.capabilities()
    }

    pub fn linux() -> Self {
        Self {
            symlinks: true,
            symlinks_require_privilege: false,
            case_sensitive_paths: true,
            atomic_rename: true,
            unix_permissions: true,
        }
    }

    pub fn macos() -> Self {
        Self {
            symlinks: true,
            symlinks_require_privilege: false,
            // Path comparison follows the POSIX rules even though APFS
            // volumes are usually case-insensitive.
            case_sensitive_paths: true,
            atomic_rename: true,
            unix_permissions: true,
        }
    }

    pub fn windows() -> Self {
        Self {
            symlinks: true,
            symlinks_require_privilege: true, // unless developer mode is on
            case_sensitive_paths: false,
            atomic_rename: false,
            unix_permissions: false,
        }
    }
}
