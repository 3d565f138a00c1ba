use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Kernel accounting node for 1 GiB huge pages.
pub const HUGEPAGE_1G_CONTROL: &str = "/sys/kernel/mm/hugepages/hugepages-1048576kB/nr_hugepages";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Knobs for the detector. Only the CLI changes these; the library default
/// probes the real machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// File whose readability signals 1 GiB huge-page support.
    pub hugepage_control: PathBuf,
    /// Replaces whatever the name resolver reports.
    pub brand_override: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            hugepage_control: PathBuf::from(HUGEPAGE_1G_CONTROL),
            brand_override: None,
        }
    }
}

impl ProbeConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_points_at_kernel_node() {
        let config = ProbeConfig::default();
        assert_eq!(config.hugepage_control, Path::new(HUGEPAGE_1G_CONTROL));
        assert!(config.brand_override.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "brand_override": "Test CPU" }}"#).unwrap();

        let config = ProbeConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.brand_override.as_deref(), Some("Test CPU"));
        assert_eq!(config.hugepage_control, Path::new(HUGEPAGE_1G_CONTROL));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "hugepages": "/tmp/x" }}"#).unwrap();

        let err = ProbeConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProbeConfig::from_json_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
