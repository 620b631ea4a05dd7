//! CLI configuration

use crate::error::{CliError, CliResult};
use access_matrix::MatrixConfig;
use std::path::PathBuf;

/// Load configuration from file.
///
/// A missing file yields the defaults.
pub fn load(path: Option<&str>) -> CliResult<MatrixConfig> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path()?,
    };

    if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)?;
        let config: MatrixConfig =
            toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    } else {
        Ok(MatrixConfig::default())
    }
}

/// Get the default configuration file path
fn default_config_path() -> CliResult<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| CliError::Config("Cannot find config directory".into()))?;
    Ok(config_dir.join("acm").join("config.toml"))
}
