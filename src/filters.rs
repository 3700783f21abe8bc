//! Ignore rules for directory entries.
//!
//! Files matching an ignore rule are left where they are. Rules are loaded
//! from a TOML file and support several strategies:
//! - Exact filename matching (case-insensitive)
//! - File extension matching (case-insensitive)
//! - Glob pattern matching against the file name
//! - Regex pattern matching against the file name
//! - Include patterns that override every ignore rule
//!
//! # Configuration File Format
//!
//! ```toml
//! [ignore]
//! filenames = ["desktop.ini", "Thumbs.db", ".DS_Store"]
//! extensions = ["part", "crdownload"]
//! patterns = ["~$*"]
//! regex = []
//!
//! [include]
//! patterns = []
//! ```
//!
//! Hidden entries are skipped by the organizer before these rules apply, so
//! an include pattern cannot bring a hidden file back in.

use crate::category::normalize_extension;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory ignore file looked up in the working directory.
pub const LOCAL_IGNORE_FILE: &str = ".sortdirrc.toml";

/// Errors that can occur while loading or compiling ignore rules.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("ignore configuration not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read ignore configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid ignore configuration: {0}")]
    Invalid(#[from] toml::de::Error),
    #[error("invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// Ignore configuration as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Rules for leaving files in place.
    #[serde(default)]
    pub ignore: ExcludeRules,

    /// Glob patterns that override the ignore rules.
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to ignore, compared case-insensitively.
    #[serde(default = "default_ignored_filenames")]
    pub filenames: Vec<String>,

    /// Extensions to ignore, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

fn default_ignored_filenames() -> Vec<String> {
    ["desktop.ini", "Thumbs.db", ".DS_Store"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ExcludeRules {
    fn default() -> Self {
        Self {
            filenames: default_ignored_filenames(),
            extensions: Vec::new(),
            patterns: Vec::new(),
            regex: Vec::new(),
        }
    }
}

/// Rules for including files, overriding the ignore rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl IgnoreConfig {
    /// Loads ignore rules, falling back to the built-in defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.sortdirrc.toml` in the current directory
    /// 3. `~/.config/sortdir/ignore.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found or explicitly given but cannot be
    /// read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, FilterError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_IGNORE_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortdir")
                .join("ignore.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Loads ignore rules from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, FilterError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                FilterError::NotFound(path.to_path_buf())
            } else {
                FilterError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Compiles the rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(self) -> Result<IgnoreRules, FilterError> {
        IgnoreRules::new(self)
    }
}

/// Compiled ignore rules.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl IgnoreRules {
    /// Rules that ignore nothing.
    pub fn none() -> Self {
        Self {
            filenames: HashSet::new(),
            extensions: HashSet::new(),
            patterns: Vec::new(),
            regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    fn new(config: IgnoreConfig) -> Result<Self, FilterError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern)
                        .map_err(|_| FilterError::InvalidGlobPattern(pattern.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let patterns = compile_globs(&config.ignore.patterns[..])?;
        let include_patterns = compile_globs(&config.include.patterns[..])?;

        let regexes = config
            .ignore
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| FilterError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filenames: config
                .ignore
                .filenames
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
            extensions: config
                .ignore
                .extensions
                .iter()
                .filter_map(|ext| normalize_extension(ext))
                .collect(),
            patterns,
            regexes,
            include_patterns,
        })
    }

    /// Checks whether a file with this name should be left in place.
    ///
    /// Include patterns are checked first and win; then exact filenames,
    /// extensions, glob patterns and regexes, in that order.
    pub fn is_ignored(&self, file_name: &str) -> bool {
        let as_path = Path::new(file_name);

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(as_path))
        {
            return false;
        }

        if self.filenames.contains(&file_name.to_lowercase()) {
            return true;
        }

        if let Some(ext) = as_path.extension()
            && let Some(ext) = normalize_extension(&ext.to_string_lossy())
            && self.extensions.contains(&ext)
        {
            return true;
        }

        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_path(as_path))
        {
            return true;
        }

        self.regexes.iter().any(|regex| regex.is_match(file_name))
    }
}

impl Default for IgnoreRules {
    /// The built-in ignore list.
    fn default() -> Self {
        // The defaults contain no patterns, so compiling cannot fail.
        IgnoreRules::new(IgnoreConfig::default()).unwrap_or_else(|_| Self::none())
    }
}
