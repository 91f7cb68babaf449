//! Exporting results for gradle-versioner.
//!
//! This module handles:
//! - Building the named outputs from an update result
//! - Printing them, appending them to an output file, or handing them to envman

use crate::config::ExportTarget;
use crate::error::{Result, VersionerError};
use crate::rules::UpdateResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Output key for the final versionCode.
pub const VERSION_CODE_KEY: &str = "ANDROID_VERSION_CODE";

/// Output key for the final versionName.
pub const VERSION_NAME_KEY: &str = "ANDROID_VERSION_NAME";

/// Named outputs for a result. The versionName is exported without quotes.
pub fn build_outputs(result: &UpdateResult) -> Vec<(&'static str, String)> {
	vec![
		(VERSION_CODE_KEY, result.final_version_code.clone()),
		(VERSION_NAME_KEY, result.version_name_unquoted().to_string()),
	]
}

/// Render outputs as `KEY=VALUE` lines.
pub fn format_outputs(outputs: &[(&str, String)]) -> String {
	outputs
		.iter()
		.map(|(key, value)| format!("{key}={value}\n"))
		.collect()
}

/// Export outputs to the given target.
pub fn write_outputs(target: ExportTarget, outputs: &[(&str, String)]) -> Result<()> {
	match target {
		ExportTarget::None => Ok(()),
		ExportTarget::Stdout => {
			print!("{}", format_outputs(outputs));
			Ok(())
		}
		ExportTarget::Envman => export_with_envman(outputs),
	}
}

/// Append outputs to `path` (e.g. a `$GITHUB_OUTPUT` file), creating it if needed.
pub fn append_output_file(path: &Path, outputs: &[(&str, String)]) -> Result<()> {
	let write_error = |source| VersionerError::WriteError {
		path: path.to_path_buf(),
		source,
	};

	let mut file = std::fs::OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.map_err(write_error)?;
	file.write_all(format_outputs(outputs).as_bytes())
		.map_err(write_error)
}

/// Run `envman add --key K --value V` for every output.
pub fn export_with_envman(outputs: &[(&str, String)]) -> Result<()> {
	let envman = resolve_command("envman").ok_or_else(|| VersionerError::CommandNotFound {
		command: "envman".to_string(),
	})?;

	for (key, value) in outputs {
		let args = ["add", "--key", *key, "--value", value.as_str()];
		log::debug!("running {} {}", envman.display(), args.join(" "));
		run_command(&envman, &args)?;
	}

	Ok(())
}

/// Run a command to completion, failing on a non-zero exit status.
pub fn run_command(binary: &Path, args: &[&str]) -> Result<()> {
	let command = binary.to_string_lossy().to_string();

	let status = Command::new(binary)
		.args(args)
		.stdin(Stdio::null())
		.stdout(Stdio::inherit())
		.stderr(Stdio::inherit())
		.status()
		.map_err(|source| {
			if source.kind() == std::io::ErrorKind::NotFound {
				VersionerError::CommandNotFound {
					command: command.clone(),
				}
			} else {
				VersionerError::CommandFailed {
					command: command.clone(),
					source,
				}
			}
		})?;

	if !status.success() {
		return Err(VersionerError::CommandNonZeroExit {
			command,
			exit_code: status.code().unwrap_or(-1),
		});
	}

	Ok(())
}

/// Resolve a command name to its full path.
///
/// If the command is already an absolute path, returns it as-is.
/// Otherwise, searches PATH for the command.
pub fn resolve_command(command: &str) -> Option<PathBuf> {
	let path = Path::new(command);

	// If it's already an absolute path, return it if it exists
	if path.is_absolute() {
		return path.exists().then(|| path.to_path_buf());
	}

	std::env::var_os("PATH").and_then(|path_var| {
		std::env::split_paths(&path_var)
			.map(|dir| dir.join(command))
			.find(|full_path| full_path.is_file())
	})
}
