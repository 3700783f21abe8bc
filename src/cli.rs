//! Command-line interface module for sortdir.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Loading the category configuration and ignore rules
//! - Organization orchestration (dry run and live run)
//! - Editing and resetting the category configuration

use crate::category::{ConfigEditError, Configuration, ExtensionlessPolicy};
use crate::config_store::{ConfigLoadError, ConfigSaveError, ConfigStore, DEFAULT_CONFIG_FILE};
use crate::file_organizer::{OrganizeError, Organizer, Plan, Report};
use crate::filters::{FilterError, IgnoreConfig, IgnoreRules};
use crate::output::OutputFormatter;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sort the files of a directory into category subfolders by extension.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Category configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Ignore rules file (TOML)
    #[arg(long, global = true)]
    pub ignore_config: Option<PathBuf>,

    /// Append diagnostic logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print informational logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move the files of a directory into category subfolders
    Organize {
        /// Directory to organize
        dir: PathBuf,

        /// Only show what would be moved
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Leave files without an extension in place instead of moving them to "Other"
        #[arg(long)]
        skip_extensionless: bool,
    },
    /// Show or edit the category configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Print the categories and their extensions
    Show,
    /// Replace the configuration with the built-in defaults
    Reset,
    /// Add an empty category
    AddCategory { name: String },
    /// Remove a category
    RemoveCategory { name: String },
    /// Add an extension to a category
    AddExtension { category: String, extension: String },
    /// Remove an extension from a category
    RemoveExtension { category: String, extension: String },
    /// Replace the extensions of a category
    SetExtensions {
        category: String,
        extensions: Vec<String>,
    },
}

/// Represents an organize run to execute.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizeCommand {
    /// If true, only plan the moves.
    pub dry_run: bool,
    /// How files without an extension are handled.
    pub extensionless: ExtensionlessPolicy,
}

/// Where the CLI reads its configuration from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub ignore_config: Option<PathBuf>,
    /// Diagnostic log file; never organized.
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            ignore_config: None,
            log_file: None,
        }
    }
}

/// The result of an organize run.
#[derive(Debug)]
pub enum RunOutput {
    /// Dry run: the plan that was shown.
    Preview(Plan),
    /// Live run: the per-file results.
    Executed(Report),
}

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    #[error(transparent)]
    Filters(#[from] FilterError),
    #[error(transparent)]
    ConfigLoad(#[from] ConfigLoadError),
    #[error(transparent)]
    ConfigSave(#[from] ConfigSaveError),
    #[error(transparent)]
    ConfigEdit(#[from] ConfigEditError),
    #[error("failed to open log file: {0}")]
    Logging(#[from] std::io::Error),
}

/// Runs a parsed command line.
pub fn run(cli: Cli) -> Result<(), CliError> {
    crate::logging::init(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings {
        config_path: cli.config,
        ignore_config: cli.ignore_config,
        log_file: cli.log_file,
    };

    match cli.command {
        Commands::Organize {
            dir,
            dry_run,
            skip_extensionless,
        } => {
            let command = OrganizeCommand {
                dry_run,
                extensionless: if skip_extensionless {
                    ExtensionlessPolicy::Skip
                } else {
                    ExtensionlessPolicy::Fallback
                },
            };
            run_cli_with_config(command, &dir, &settings).map(|_| ())
        }
        Commands::Config { action } => run_config_action(action, &settings.config_path),
    }
}

/// Organizes `dir_path` with the default settings.
///
/// # Examples
///
/// ```no_run
/// use sortdir::cli::{run_cli, OrganizeCommand};
/// use std::path::Path;
///
/// let preview = OrganizeCommand { dry_run: true, ..Default::default() };
/// match run_cli(preview, Path::new("/path/to/directory")) {
///     Ok(_) => println!("Preview complete"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path) -> Result<RunOutput, CliError> {
    run_cli_with_config(command, dir_path, &Settings::default())
}

/// Organizes `dir_path` using the configuration named in `settings`.
///
/// This function:
/// 1. Loads the categories, falling back to the defaults
/// 2. Loads and compiles the ignore rules
/// 3. Plans every entry of the directory, leaving the configuration and
///    log files in place
/// 4. Prints the plan (dry run) or executes it and prints the results
pub fn run_cli_with_config(
    command: OrganizeCommand,
    dir_path: &Path,
    settings: &Settings,
) -> Result<RunOutput, CliError> {
    let mut config = load_configuration(&settings.config_path);
    config.set_extensionless_policy(command.extensionless);
    tracing::info!(
        categories = config.rules().len(),
        extensionless = ?config.extensionless_policy(),
        "loaded configuration"
    );

    let ignore = load_ignore_rules(settings.ignore_config.as_deref())?;
    let mut organizer = Organizer::new().protecting(&settings.config_path);
    if let Some(log_file) = &settings.log_file {
        organizer = organizer.protecting(log_file);
    }
    let plan = organizer.plan(dir_path, &config, &ignore)?;

    if command.dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", dir_path.display()));
        OutputFormatter::print_actions(dir_path, plan.actions());
        OutputFormatter::summary_table(&plan.summary());
        if plan.planned_count() == 0 {
            OutputFormatter::info("Nothing to organize.");
        } else {
            OutputFormatter::dry_run_notice("No files were modified.");
        }
        return Ok(RunOutput::Preview(plan));
    }

    OutputFormatter::info(&format!("Organizing contents of: {}", dir_path.display()));
    let pb = OutputFormatter::create_progress_bar(plan.planned_count() as u64);
    let report = organizer.execute_with_progress(plan, |action| {
        if action.category.is_some() {
            pb.inc(1);
        }
    });
    pb.finish_and_clear();
    let report = report?;

    OutputFormatter::print_actions(&report.directory, &report.actions);
    let summary = report.summary();
    OutputFormatter::summary_table(&summary);

    if report.is_complete_success() {
        OutputFormatter::success(&format!(
            "Organization complete in {} ms.",
            (report.finished_at - report.started_at).num_milliseconds()
        ));
    } else {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. Please review errors above.",
            summary.errors
        ));
    }

    Ok(RunOutput::Executed(report))
}

/// Loads the category configuration, falling back to the defaults.
///
/// A missing file is created with the defaults; any other failure is
/// reported and the defaults are used for this run only.
pub fn load_configuration(path: &Path) -> Configuration {
    if !path.exists() {
        let config = ConfigStore::default();
        match ConfigStore::save(&config, path) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote default configuration"),
            Err(e) => tracing::warn!(error = %e, "could not write default configuration"),
        }
        return config;
    }
    ConfigStore::load_or_default(path)
}

fn load_ignore_rules(path: Option<&Path>) -> Result<IgnoreRules, FilterError> {
    IgnoreConfig::load(path)?.compile()
}

/// Applies a configuration edit and saves the result.
///
/// Edits start from the stored file, or from the defaults if there is none.
/// A file that exists but cannot be loaded is an error, so a broken file is
/// never silently replaced; `reset` is the way out.
pub fn run_config_action(action: ConfigAction, config_path: &Path) -> Result<(), CliError> {
    let mut config = match action {
        ConfigAction::Reset => ConfigStore::default(),
        _ => match ConfigStore::load(config_path) {
            Ok(config) => config,
            Err(ConfigLoadError::NotFound(_)) => ConfigStore::default(),
            Err(e) => return Err(e.into()),
        },
    };

    let message = match &action {
        ConfigAction::Show => {
            OutputFormatter::print_configuration(&config);
            return Ok(());
        }
        ConfigAction::Reset => {
            format!("Restored default categories in {}", config_path.display())
        }
        ConfigAction::AddCategory { name } => {
            config.add_category(name)?;
            format!("Added category: {}", name)
        }
        ConfigAction::RemoveCategory { name } => {
            config.remove_category(name)?;
            format!("Removed category: {}", name)
        }
        ConfigAction::AddExtension {
            category,
            extension,
        } => {
            config.add_extension(category, extension)?;
            format!("Added extension {} to {}", extension, category)
        }
        ConfigAction::RemoveExtension {
            category,
            extension,
        } => {
            if config.remove_extension(category, extension)? {
                format!("Removed extension {} from {}", extension, category)
            } else {
                OutputFormatter::warning(&format!("{} has no extension {}", category, extension));
                return Ok(());
            }
        }
        ConfigAction::SetExtensions {
            category,
            extensions,
        } => {
            config.set_extensions(category, extensions.as_slice())?;
            format!("Saved extensions for {}", category)
        }
    };

    ConfigStore::save(&config, config_path)?;
    OutputFormatter::success(&message);
    Ok(())
}
