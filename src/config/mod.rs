//! Configuration loading and parsing for gradle-versioner.
//!
//! This module handles:
//! - TOML config file parsing
//! - Directory cascade discovery
//! - Config merging and layering of command-line overrides

pub mod cascade;
pub mod parser;
pub mod types;

pub use cascade::{
	collect_configs, discover_configs, load_merged_config, merge_configs, user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{
	CONFIG_FILE_NAME, Config, ExportTarget, LoadedConfig, MergedConfig, Overrides, Settings,
	parse_number_input,
};
