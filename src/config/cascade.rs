use crate::config::parser::parse_config_file;
use crate::config::types::{CONFIG_FILE_NAME, LoadedConfig, MergedConfig};
use crate::error::{Result, VersionerError};
use std::path::{Path, PathBuf};

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.gradle-versioner.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.gradle-versioner.toml
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	// Walk up the directory tree
	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			let config = parse_config_file(&config_path)?;
			log::debug!("loaded config {}", config_path.display());

			let is_root = config.root;
			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		// Move to parent directory
		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.gradle-versioner.toml if it exists and wasn't already
/// picked up while walking the tree.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	let user_config_path = user_config_path()?;

	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.exists() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Merge multiple configs into a single effective config.
///
/// Configs are expected in cascade order; for every field the first config
/// that sets it wins.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		let config = &loaded.config;

		if merged.build_gradle_path.is_none() {
			merged.build_gradle_path = config.build_gradle_path.clone();
		}
		if merged.version_code_offset.is_none() {
			merged.version_code_offset = config.version_code_offset;
		}
		if merged.export.is_none() {
			merged.export = config.export;
		}
		if merged.output_file.is_none() {
			merged.output_file = config.output_file.clone();
		}

		merged.sources.push(loaded.path.clone());
	}

	merged
}

/// Load either a single explicitly named config file (bypassing the
/// cascade) or every config discovered from `start_dir`.
pub fn collect_configs(explicit: Option<&Path>, start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	match explicit {
		Some(path) => Ok(vec![LoadedConfig {
			config: parse_config_file(path)?,
			path: path.to_path_buf(),
		}]),
		None => discover_configs(start_dir),
	}
}

/// Convenience function to collect and merge configs.
pub fn load_merged_config(explicit: Option<&Path>, start_dir: &Path) -> Result<MergedConfig> {
	let configs = collect_configs(explicit, start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(VersionerError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
