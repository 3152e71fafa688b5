/// Configuration loading from breakbridge.json and environment overrides
use crate::config::types::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Explicit config file location.
pub const CONFIG_ENV: &str = "BREAKBRIDGE_CONFIG";
/// Overrides the native directory backing the POSIX root. Empty disables it.
pub const ROOT_ENV: &str = "BREAKBRIDGE_ROOT";
/// Overrides the drive-letter prefix.
pub const CYGDRIVE_ENV: &str = "BREAKBRIDGE_CYGDRIVE";

const CONFIG_FILE_NAME: &str = "breakbridge.json";
const DEFAULT_ROOT: &str = "C:\\cygwin64";
const DEFAULT_CYGDRIVE_PREFIX: &str = "/cygdrive";

/// A POSIX directory mounted from a native location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    pub posix: String,
    pub native: String,
}

/// Mount table used when rewriting path variables for the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Native directory that `/` maps to. `None` makes unmounted absolute paths an error.
    pub root: Option<String>,
    /// Prefix under which `/<prefix>/x` names drive `X:`.
    pub cygdrive_prefix: String,
    pub mounts: Vec<MountEntry>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            root: Some(DEFAULT_ROOT.to_string()),
            cygdrive_prefix: DEFAULT_CYGDRIVE_PREFIX.to_string(),
            mounts: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: BridgeConfig = serde_json::from_str(&content).map_err(|e| {
            BridgeError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from the process environment.
    pub fn load() -> Result<Self> {
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));
        let vars = [CONFIG_ENV, ROOT_ENV, CYGDRIVE_ENV]
            .into_iter()
            .map(|name| Ok((name, env_value(name)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::resolve(
            |name| {
                vars.iter()
                    .find(|(var, _)| *var == name)
                    .and_then(|(_, value)| value.clone())
            },
            beside_exe,
        )
    }

    /// Resolution order: explicit file, file beside the executable, defaults.
    /// Environment overrides apply last.
    pub fn resolve<F>(lookup: F, beside_exe: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if let Some(path) = lookup(CONFIG_ENV).filter(|p| !p.is_empty()) {
            log::debug!("Loading config from {} ({})", path, CONFIG_ENV);
            Self::load_from_file(path)?
        } else if let Some(path) = beside_exe.filter(|p| p.is_file()) {
            log::debug!("Loading config from {}", path.display());
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        if let Some(root) = lookup(ROOT_ENV) {
            config.root = if root.is_empty() { None } else { Some(root) };
        }
        if let Some(prefix) = lookup(CYGDRIVE_ENV) {
            config.cygdrive_prefix = prefix;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.cygdrive_prefix.starts_with('/') {
            return Err(BridgeError::Config(format!(
                "cygdrive prefix must be absolute: '{}'",
                self.cygdrive_prefix
            )));
        }

        for mount in &self.mounts {
            if !mount.posix.starts_with('/') {
                return Err(BridgeError::Config(format!(
                    "mount point must be absolute: '{}'",
                    mount.posix
                )));
            }
            if mount.native.is_empty() {
                return Err(BridgeError::Config(format!(
                    "mount '{}' has an empty native path",
                    mount.posix
                )));
            }
        }

        if matches!(self.root.as_deref(), Some("")) {
            return Err(BridgeError::Config("root must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Read one override. A value that is not valid unicode is a config error.
fn env_value(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(raw)) => Err(BridgeError::Config(format!(
            "{} is not valid unicode: {}",
            name,
            raw.to_string_lossy()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "breakbridge-{}-{}.json",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file_or_overrides() {
        let config = BridgeConfig::resolve(|_| None, None).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.root.as_deref(), Some("C:\\cygwin64"));
        assert_eq!(config.cygdrive_prefix, "/cygdrive");
    }

    #[test]
    fn test_env_overrides_apply_after_defaults() {
        let vars: HashMap<&str, &str> = [(ROOT_ENV, "D:\\msys64"), (CYGDRIVE_ENV, "/")]
            .into_iter()
            .collect();
        let config =
            BridgeConfig::resolve(|name| vars.get(name).map(|v| v.to_string()), None).unwrap();
        assert_eq!(config.root.as_deref(), Some("D:\\msys64"));
        assert_eq!(config.cygdrive_prefix, "/");
    }

    #[test]
    fn test_empty_root_override_disables_root() {
        let config = BridgeConfig::resolve(
            |name| (name == ROOT_ENV).then(String::new),
            None,
        )
        .unwrap();
        assert_eq!(config.root, None);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let path = scratch_file(
            "explicit",
            r#"{"root": "E:\\cyg", "mounts": [{"posix": "/home", "native": "F:\\users"}]}"#,
        );
        let path_str = path.to_string_lossy().to_string();
        let config = BridgeConfig::resolve(
            |name| (name == CONFIG_ENV).then(|| path_str.clone()),
            None,
        )
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.root.as_deref(), Some("E:\\cyg"));
        assert_eq!(config.cygdrive_prefix, "/cygdrive");
        assert_eq!(
            config.mounts,
            vec![MountEntry {
                posix: "/home".to_string(),
                native: "F:\\users".to_string(),
            }]
        );
    }

    #[test]
    fn test_file_beside_executable_is_used() {
        let path = scratch_file("beside", r#"{"root": null}"#);
        let config = BridgeConfig::resolve(|_| None, Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.root, None);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let path = scratch_file("malformed", "{ not json");
        let result = BridgeConfig::load_from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let result = BridgeConfig::resolve(
            |name| (name == CONFIG_ENV).then(|| "/nonexistent/breakbridge.json".to_string()),
            None,
        );
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_relative_mount_point_rejected() {
        let config = BridgeConfig {
            mounts: vec![MountEntry {
                posix: "home".to_string(),
                native: "D:\\home".to_string(),
            }],
            ..BridgeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_cygdrive_prefix_rejected() {
        let config = BridgeConfig {
            cygdrive_prefix: "cygdrive".to_string(),
            ..BridgeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unset_override_reads_as_none() {
        assert_eq!(
            env_value("BREAKBRIDGE_TEST_SURELY_UNSET_VARIABLE").unwrap(),
            None
        );
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_non_unicode_override_is_config_error() {
        use std::os::unix::ffi::OsStrExt;
        let name = "BREAKBRIDGE_TEST_NON_UNICODE_OVERRIDE";
        std::env::set_var(name, std::ffi::OsStr::from_bytes(b"/bad\xff"));
        let result = env_value(name);
        std::env::remove_var(name);
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }
}
