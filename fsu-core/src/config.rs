//! Backend configuration

use serde::{Deserialize, Serialize};

/// Settings shared by both native backends. Each backend ignores the fields
/// that mean nothing on its platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Mode for newly created files, before the process umask
    pub file_mode: u32,
    /// Mode for newly created directories, before the process umask
    pub dir_mode: u32,
    /// Prefix long absolute Windows paths with `\\?\`
    pub extended_length_paths: bool,
    /// Ask Windows for developer-mode symlink creation
    pub unprivileged_symlinks: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            file_mode: 0o666,
            dir_mode: 0o777,
            extended_length_paths: true,
            unprivileged_symlinks: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.file_mode, 0o666);
        assert_eq!(config.dir_mode, 0o777);
        assert!(config.extended_length_paths);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: BackendConfig = serde_json::from_str(r#"{"file_mode": 384}"#).unwrap();
        assert_eq!(config.file_mode, 0o600);
        assert_eq!(config.dir_mode, 0o777);
        assert!(config.unprivileged_symlinks);
    }
}
