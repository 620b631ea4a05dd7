//! Configuration for access-matrix processes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::DEFAULT_DATA_FILE;

/// Settings shared by administrator and reader processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Path of the shared matrix file
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Interval between change checks, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Where administrative changes are recorded (none = no audit trail)
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            poll_interval_ms: default_poll_interval_ms(),
            audit_log: None,
        }
    }
}

impl MatrixConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// Default value helpers
fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

fn default_poll_interval_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MatrixConfig::default();
        assert_eq!(config.data_file, PathBuf::from("access_matrix.json"));
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
        assert!(config.audit_log.is_none());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: MatrixConfig = serde_json::from_str(r#"{"poll_interval_ms": 250}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.data_file, PathBuf::from("access_matrix.json"));
    }
}
