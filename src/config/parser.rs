use crate::config::types::Config;
use crate::error::{Result, VersionerError};
use std::path::Path;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	if !path.exists() {
		return Err(VersionerError::ConfigNotFound {
			path: path.to_path_buf(),
		});
	}

	let content =
		std::fs::read_to_string(path).map_err(|source| VersionerError::ConfigReadError {
			path: path.to_path_buf(),
			source,
		})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
///
/// Relative paths inside the config are resolved against `path`'s directory.
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	let mut config: Config =
		toml::from_str(content).map_err(|source| VersionerError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	if let Some(dir) = path.parent() {
		config.resolve_paths(dir);
	}

	Ok(config)
}
