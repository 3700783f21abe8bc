//! sortdir - sort the files of a directory into category subfolders
//!
//! This library provides the category configuration and its JSON store,
//! ignore rules loaded from TOML, and the organizer that plans moves by
//! file extension and executes them with per-file failure isolation.

pub mod category;
pub mod cli;
pub mod config_store;
pub mod file_organizer;
pub mod filters;
pub mod fs;
pub mod logging;
pub mod output;

pub use category::{CategoryRule, ConfigEditError, Configuration, ExtensionlessPolicy};
pub use config_store::{ConfigLoadError, ConfigSaveError, ConfigStore};
pub use file_organizer::{MoveAction, OrganizeError, Organizer, Outcome, Plan, Report, classify};
pub use filters::{FilterError, IgnoreConfig, IgnoreRules};

pub use cli::{OrganizeCommand, run_cli};
