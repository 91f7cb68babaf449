use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gradle_versioner::VersionerError;
use gradle_versioner::config::{
	ExportTarget, MergedConfig, Overrides, Settings, collect_configs, load_merged_config,
	merge_configs, parse_number_input, user_config_path,
};
use gradle_versioner::exec::{append_output_file, build_outputs, format_outputs, write_outputs};
use gradle_versioner::rules::{RewriteRequest, UpdateResult, VersionRewriter};

#[derive(Parser)]
#[command(name = "gradle-versioner")]
#[command(
	author,
	version,
	about = "CLI tool for bumping versionCode and versionName in Android build.gradle files"
)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Path to the build.gradle file to edit
	#[arg(long, env = "build_gradle_path", value_name = "PATH", global = true)]
	build_gradle_path: Option<PathBuf>,

	/// New versionCode (the offset is added to it)
	#[arg(long, env = "new_version_code", value_name = "N", allow_negative_numbers = true)]
	new_version_code: Option<String>,

	/// Number added to the new versionCode
	#[arg(long, env = "version_code_offset", value_name = "N", allow_negative_numbers = true)]
	version_code_offset: Option<String>,

	/// New versionName, quoted automatically if needed
	#[arg(long, env = "new_version_name", value_name = "NAME")]
	new_version_name: Option<String>,

	/// Where to export ANDROID_VERSION_CODE / ANDROID_VERSION_NAME
	#[arg(long, value_enum)]
	export: Option<ExportTarget>,

	/// Append KEY=VALUE outputs to this file
	#[arg(long, value_name = "PATH")]
	output_file: Option<PathBuf>,

	/// Compute and report the new versions without writing anything
	#[arg(long)]
	dry_run: bool,

	/// Use this config file instead of the .gradle-versioner.toml cascade
	#[arg(long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,

	/// Enable debug logging
	#[arg(short, long, global = true)]
	verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the current versionCode and versionName without changing anything
	Inspect,
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display discovered configuration files and the merged result
	Show,
	/// Check all config files for errors without running anything
	Validate,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: bool) {
	let level = if verbose {
		log::LevelFilter::Debug
	} else {
		log::LevelFilter::Info
	};

	// RUST_LOG still wins over the flag
	env_logger::Builder::new()
		.filter_level(level)
		.parse_default_env()
		.format_timestamp(None)
		.format_target(false)
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	if let Some(ref command) = cli.command {
		return match command {
			Commands::Inspect => handle_inspect(&cli),
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(cli.config.as_deref()),
				ConfigAction::Validate => handle_config_validate(cli.config.as_deref()),
			},
		};
	}

	handle_rewrite(&cli)
}

fn load_config(explicit: Option<&Path>) -> Result<MergedConfig> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	load_merged_config(explicit, &cwd).context("Failed to load configuration")
}

fn overrides_from(cli: &Cli) -> Result<Overrides> {
	Ok(Overrides {
		build_gradle_path: cli.build_gradle_path.clone(),
		new_version_code: parse_number_input("new_version_code", cli.new_version_code.as_deref())?,
		version_code_offset: parse_number_input(
			"version_code_offset",
			cli.version_code_offset.as_deref(),
		)?,
		new_version_name: cli.new_version_name.clone(),
		export: cli.export,
		output_file: cli.output_file.clone(),
	})
}

fn scan_build_gradle(path: &Path, request: &RewriteRequest) -> Result<UpdateResult> {
	let file =
		File::open(path).with_context(|| format!("Failed to read {}", path.display()))?;

	VersionRewriter::new()
		.context("Failed to build version recognizers")?
		.rewrite(BufReader::new(file), request)
		.with_context(|| format!("Failed to scan {}", path.display()))
}

fn handle_rewrite(cli: &Cli) -> Result<ExitCode> {
	let merged = load_config(cli.config.as_deref())?;
	let overrides = overrides_from(cli).context("Issue with input")?;
	let settings = Settings::resolve(overrides, &merged).context("Issue with input")?;

	log::info!("Configs:");
	log::info!("- build_gradle_path: {}", settings.build_gradle_path.display());
	log::info!("- new_version_code: {:?}", settings.request.new_version_code);
	log::info!("- version_code_offset: {}", settings.request.version_code_offset);
	log::info!("- new_version_name: {:?}", settings.request.new_version_name);

	settings.validate().context("Issue with input")?;

	log::info!(
		"Updating versionName and versionCode in: {}",
		settings.build_gradle_path.display()
	);
	let result = scan_build_gradle(&settings.build_gradle_path, &settings.request)?;
	let outputs = build_outputs(&result);

	if cli.dry_run {
		print!("{}", format_outputs(&outputs));
		log::info!("dry run, {} left untouched", settings.build_gradle_path.display());
	} else {
		write_outputs(settings.export, &outputs).context("Failed to export outputs")?;
		if let Some(ref output_file) = settings.output_file {
			append_output_file(output_file, &outputs)
				.with_context(|| format!("Failed to write outputs to {}", output_file.display()))?;
		}

		if result.changed() {
			std::fs::write(&settings.build_gradle_path, &result.new_content)
				.map_err(|source| VersionerError::WriteError {
					path: settings.build_gradle_path.clone(),
					source,
				})
				.context("Failed to write build.gradle file")?;
		}
	}

	println!("{} versionCode updated", result.updated_version_codes);
	println!("{} versionName updated", result.updated_version_names);

	Ok(ExitCode::SUCCESS)
}

fn handle_inspect(cli: &Cli) -> Result<ExitCode> {
	let merged = load_config(cli.config.as_deref())?;
	let overrides = Overrides {
		build_gradle_path: cli.build_gradle_path.clone(),
		..Default::default()
	};
	let settings = Settings::resolve(overrides, &merged).context("Issue with input")?;
	settings
		.ensure_build_gradle_exists()
		.context("Issue with input")?;

	let result = scan_build_gradle(&settings.build_gradle_path, &RewriteRequest::default())?;
	print!("{}", format_outputs(&build_outputs(&result)));

	Ok(ExitCode::SUCCESS)
}

fn handle_config_show(explicit: Option<&Path>) -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs =
		collect_configs(explicit, &cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("Configuration files (in cascade order):\n");

		for loaded in &configs {
			let config = &loaded.config;
			println!("# Source: {}", loaded.path.display());
			println!("  root: {}", config.root);
			if let Some(ref path) = config.build_gradle_path {
				println!("  build-gradle-path: {}", path.display());
			}
			if let Some(offset) = config.version_code_offset {
				println!("  version-code-offset: {}", offset);
			}
			if let Some(export) = config.export {
				println!("  export: {}", export.as_str());
			}
			if let Some(ref path) = config.output_file {
				println!("  output-file: {}", path.display());
			}
			println!();
		}

		let merged = merge_configs(&configs);
		println!("Effective configuration:");
		match merged.build_gradle_path {
			Some(ref path) => println!("  build-gradle-path: {}", path.display()),
			None => println!("  build-gradle-path: (unset)"),
		}
		println!(
			"  version-code-offset: {}",
			merged.version_code_offset.unwrap_or(0)
		);
		println!(
			"  export: {}",
			merged.export.unwrap_or_default().as_str()
		);
		println!();
	}

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(explicit: Option<&Path>) -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	match collect_configs(explicit, &cwd) {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!("  {}", loaded.path.display());
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {}", e);
			if let Some(source) = std::error::Error::source(&e) {
				eprintln!("  caused by: {}", source);
			}
			Ok(ExitCode::FAILURE)
		}
	}
}
