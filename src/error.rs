use std::path::PathBuf;

/// Library-level structured errors for gradle-versioner.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum VersionerError {
	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern in recognizer: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Recognizer pattern must have exactly one capture group, found {groups}: {pattern}")]
	InvalidCaptureCount { pattern: String, groups: usize },

	#[error("Failed to read input at line {line}")]
	ReadError {
		line: usize,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write build file: {path}")]
	WriteError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Build file not found: {path}")]
	BuildGradleNotFound { path: PathBuf },

	#[error("No build file given (use --build-gradle-path or build-gradle-path in config)")]
	MissingBuildGradlePath,

	#[error("Nothing to update: neither a new versionCode nor a new versionName was given")]
	NothingToUpdate,

	#[error("Invalid number for {input}: {value:?}")]
	InvalidNumber {
		input: String,
		value: String,
		#[source]
		source: std::num::ParseIntError,
	},

	#[error("versionCode overflows: {version_code} + {offset}")]
	VersionCodeOverflow { version_code: i64, offset: i64 },

	#[error("Command execution failed: {command}")]
	CommandFailed {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Command returned non-zero exit code: {command} (exit code: {exit_code})")]
	CommandNonZeroExit { command: String, exit_code: i32 },

	#[error("Command not found: {command}")]
	CommandNotFound { command: String },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using VersionerError.
pub type Result<T> = std::result::Result<T, VersionerError>;
