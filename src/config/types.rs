use crate::error::{Result, VersionerError};
use crate::rules::RewriteRequest;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in every directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".gradle-versioner.toml";

/// Where the final versionCode / versionName get exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
	/// Don't export.
	None,
	/// Print `KEY=VALUE` lines on stdout.
	#[default]
	Stdout,
	/// Call `envman add` for every output.
	Envman,
}

impl ExportTarget {
	pub fn as_str(&self) -> &'static str {
		match self {
			ExportTarget::None => "none",
			ExportTarget::Stdout => "stdout",
			ExportTarget::Envman => "envman",
		}
	}
}

/// Top-level configuration from a `.gradle-versioner.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// If true, stop the directory cascade here and jump to the user config.
	#[serde(default)]
	pub root: bool,

	/// Build file to edit. Relative paths are resolved against the config file's directory.
	pub build_gradle_path: Option<PathBuf>,

	/// Added to every new versionCode.
	pub version_code_offset: Option<i64>,

	/// Export target for the final values.
	pub export: Option<ExportTarget>,

	/// File to append `KEY=VALUE` outputs to. Resolved like `build-gradle-path`.
	pub output_file: Option<PathBuf>,
}

impl Config {
	/// Make relative paths absolute with respect to `base_dir`.
	pub fn resolve_paths(&mut self, base_dir: &Path) {
		for path in [&mut self.build_gradle_path, &mut self.output_file]
			.into_iter()
			.flatten()
		{
			if path.is_relative() {
				*path = base_dir.join(&*path);
			}
		}
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from every file in the cascade. The nearest file
/// that sets a field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedConfig {
	pub build_gradle_path: Option<PathBuf>,
	pub version_code_offset: Option<i64>,
	pub export: Option<ExportTarget>,
	pub output_file: Option<PathBuf>,

	/// Config files that contributed, in cascade order.
	pub sources: Vec<PathBuf>,
}

/// Values given on the command line or through the environment. These
/// beat anything from config files.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub build_gradle_path: Option<PathBuf>,
	pub new_version_code: Option<i64>,
	pub version_code_offset: Option<i64>,
	pub new_version_name: Option<String>,
	pub export: Option<ExportTarget>,
	pub output_file: Option<PathBuf>,
}

/// Parse a numeric input such as `new_version_code`. Empty (or blank) values
/// count as absent, since automation steps pass unset inputs as `""`.
pub fn parse_number_input(input: &str, raw: Option<&str>) -> Result<Option<i64>> {
	let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
		return Ok(None);
	};

	value
		.parse()
		.map(Some)
		.map_err(|source| VersionerError::InvalidNumber {
			input: input.to_string(),
			value: value.to_string(),
			source,
		})
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
	pub build_gradle_path: PathBuf,
	pub request: RewriteRequest,
	pub export: ExportTarget,
	pub output_file: Option<PathBuf>,
}

impl Settings {
	/// Layer overrides over the merged config, falling back to defaults.
	pub fn resolve(overrides: Overrides, merged: &MergedConfig) -> Result<Self> {
		let build_gradle_path = overrides
			.build_gradle_path
			.filter(|p| !p.as_os_str().is_empty())
			.or_else(|| merged.build_gradle_path.clone())
			.ok_or(VersionerError::MissingBuildGradlePath)?;

		Ok(Settings {
			build_gradle_path,
			request: RewriteRequest {
				new_version_code: overrides.new_version_code,
				version_code_offset: overrides
					.version_code_offset
					.or(merged.version_code_offset)
					.unwrap_or(0),
				new_version_name: overrides.new_version_name.filter(|n| !n.is_empty()),
			},
			export: overrides.export.or(merged.export).unwrap_or_default(),
			output_file: overrides
				.output_file
				.or_else(|| merged.output_file.clone()),
		})
	}

	/// Check the build file exists.
	pub fn ensure_build_gradle_exists(&self) -> Result<()> {
		if !self.build_gradle_path.is_file() {
			return Err(VersionerError::BuildGradleNotFound {
				path: self.build_gradle_path.clone(),
			});
		}
		Ok(())
	}

	/// Validate settings for a rewrite: the build file must exist and at
	/// least one new value must be given.
	pub fn validate(&self) -> Result<()> {
		self.ensure_build_gradle_exists()?;
		if self.request.is_noop() {
			return Err(VersionerError::NothingToUpdate);
		}
		Ok(())
	}
}
