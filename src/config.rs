//! Configuration for the lock manager.
//!
//! Settings are loaded from a YAML file by the embedding server. Unknown
//! fields are ignored for forward compatibility, absent fields fall back to
//! defaults, and values are validated on load.

use crate::error::{LockError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lock manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minutes after which a held lock is reported as stale by
    /// `list_locks`. Staleness is informational only; locks are never
    /// broken automatically.
    #[serde(default = "default_lock_stale_minutes")]
    pub lock_stale_minutes: u32,

    /// Path of the NDJSON audit log. Auditing is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_stale_minutes: default_lock_stale_minutes(),
            audit_log: None,
        }
    }
}

fn default_lock_stale_minutes() -> u32 {
    120
}

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward
    /// compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return an error on invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.lock_stale_minutes == 0 {
            return Err(LockError::Config(
                "lock_stale_minutes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.lock_stale_minutes, 120);
        assert!(config.audit_log.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.lock_stale_minutes, 120);
        assert!(config.audit_log.is_none());
    }

    #[test]
    fn fields_are_parsed() {
        let yaml = "lock_stale_minutes: 30\naudit_log: /var/log/dslock/locks.ndjson\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.lock_stale_minutes, 30);
        assert_eq!(
            config.audit_log.as_deref(),
            Some(Path::new("/var/log/dslock/locks.ndjson"))
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let yaml = "lock_stale_minutes: 45\nfuture_option: true\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.lock_stale_minutes, 45);
    }

    #[test]
    fn zero_stale_threshold_is_rejected() {
        let err = Config::from_yaml("lock_stale_minutes: 0\n").unwrap_err();
        assert!(err.to_string().contains("lock_stale_minutes"));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(Config::from_yaml("lock_stale_minutes: [").is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let config = Config {
            lock_stale_minutes: 15,
            audit_log: Some(PathBuf::from("/tmp/locks.ndjson")),
        };

        let yaml = config.to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.lock_stale_minutes, 15);
        assert_eq!(parsed.audit_log, config.audit_log);
    }

    #[test]
    fn load_reads_from_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "lock_stale_minutes: 10\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.lock_stale_minutes, 10);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Config::load("/nonexistent/dslock-config.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
