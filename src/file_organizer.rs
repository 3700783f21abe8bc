/// Move planning and execution.
///
/// Organizing a directory happens in two steps. [`Organizer::plan`] reads the
/// directory listing once and decides, for every entry, whether and where it
/// should move; it never modifies the filesystem. [`Organizer::execute`] then
/// carries out the planned moves, one file at a time. A dry run is a plan that
/// is rendered and never executed.
///
/// Name collisions are never resolved by overwriting: if the destination
/// already exists, the move is skipped and reported as
/// `Error("destination exists")`.
use crate::category::{Configuration, FALLBACK_CATEGORY};
use crate::filters::IgnoreRules;
use crate::fs::{DirectoryEntry, FileSystem, StdFileSystem};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reason recorded when the destination of a move is already occupied.
pub const DESTINATION_EXISTS: &str = "destination exists";

/// What happened, or will happen, to a single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Will be moved when the plan is executed.
    Planned,
    /// Was moved to its destination.
    Moved,
    /// Hidden by the platform convention.
    SkippedHidden,
    /// A directory that is not a category folder.
    SkippedIsDirectory,
    /// A category folder, usually created by a previous run.
    SkippedCategoryFolder,
    /// Matched an ignore rule.
    SkippedIgnored,
    /// Has no extension and the configuration skips such files.
    SkippedNoExtension,
    /// The move failed; the file stays where it was.
    Error(String),
}

impl Outcome {
    /// Returns true for every `Skipped*` variant.
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Outcome::SkippedHidden
                | Outcome::SkippedIsDirectory
                | Outcome::SkippedCategoryFolder
                | Outcome::SkippedIgnored
                | Outcome::SkippedNoExtension
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Planned => write!(f, "planned"),
            Outcome::Moved => write!(f, "moved"),
            Outcome::SkippedHidden => write!(f, "skipped (hidden)"),
            Outcome::SkippedIsDirectory => write!(f, "skipped (directory)"),
            Outcome::SkippedCategoryFolder => write!(f, "skipped (category folder)"),
            Outcome::SkippedIgnored => write!(f, "skipped (ignored)"),
            Outcome::SkippedNoExtension => write!(f, "skipped (no extension)"),
            Outcome::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// One entry of a plan or report.
///
/// For skipped entries `destination` equals `source` and `category` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAction {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Option<String>,
    pub outcome: Outcome,
}

impl MoveAction {
    fn skipped(entry: &DirectoryEntry, outcome: Outcome) -> Self {
        Self {
            source: entry.path.clone(),
            destination: entry.path.clone(),
            category: None,
            outcome,
        }
    }

    /// The file name of the source.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Counts of outcomes over a sequence of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub planned: usize,
    pub moved: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Planned or moved files per category, in first-seen order.
    pub by_category: Vec<(String, usize)>,
}

impl Summary {
    pub fn from_actions(actions: &[MoveAction]) -> Self {
        let mut summary = Summary::default();
        for action in actions {
            let outcome = &action.outcome;
            if outcome.is_skipped() {
                summary.skipped += 1;
                continue;
            }
            match outcome {
                Outcome::Planned => summary.planned += 1,
                Outcome::Moved => summary.moved += 1,
                _ => summary.errors += 1,
            }
            if matches!(outcome, Outcome::Planned | Outcome::Moved)
                && let Some(category) = &action.category
            {
                match summary.by_category.iter_mut().find(|(name, _)| name == category) {
                    Some((_, count)) => *count += 1,
                    None => summary.by_category.push((category.clone(), 1)),
                }
            }
        }
        summary
    }

    /// Tallies `actions`, listing categories in the order given by `order`.
    ///
    /// Categories missing from `order` keep their first-seen order at the end.
    pub fn from_actions_ordered(actions: &[MoveAction], order: &[String]) -> Self {
        let mut summary = Self::from_actions(actions);
        summary.by_category.sort_by_key(|(name, _)| {
            order
                .iter()
                .position(|candidate| candidate == name)
                .unwrap_or(order.len())
        });
        summary
    }

    /// Planned or moved files in `category`.
    pub fn category_count(&self, category: &str) -> usize {
        self.by_category
            .iter()
            .find(|(name, _)| name == category)
            .map_or(0, |(_, count)| *count)
    }
}

/// The result of planning a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    directory: PathBuf,
    actions: Vec<MoveAction>,
    category_order: Vec<String>,
}

impl Plan {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Actions in file-name order.
    pub fn actions(&self) -> &[MoveAction] {
        &self.actions
    }

    /// Number of actions with outcome [`Outcome::Planned`].
    pub fn planned_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.outcome == Outcome::Planned)
            .count()
    }

    /// Counts by outcome, categories in configuration order.
    pub fn summary(&self) -> Summary {
        Summary::from_actions_ordered(&self.actions, &self.category_order)
    }
}

/// The result of executing a plan.
#[derive(Debug, Clone)]
pub struct Report {
    pub directory: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub actions: Vec<MoveAction>,
    category_order: Vec<String>,
}

impl Report {
    pub fn summary(&self) -> Summary {
        Summary::from_actions_ordered(&self.actions, &self.category_order)
    }

    /// Returns true if no action ended in an error.
    pub fn is_complete_success(&self) -> bool {
        !self
            .actions
            .iter()
            .any(|a| matches!(a.outcome, Outcome::Error(_)))
    }
}

/// Failures that abort a whole run, as opposed to per-file errors.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("failed to read directory {}: {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("directory {} disappeared after {completed} of {total} actions", .path.display())]
    DirectoryVanished {
        path: PathBuf,
        completed: usize,
        total: usize,
    },
}

/// Result type for organize runs.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Assigns a directory entry to a category by its extension.
///
/// Pure and deterministic. Returns the fallback category when no rule
/// matches, and `None` only for extensionless entries under
/// [`ExtensionlessPolicy::Skip`](crate::category::ExtensionlessPolicy::Skip).
pub fn classify<'a>(entry: &DirectoryEntry, config: &'a Configuration) -> Option<&'a str> {
    config.classify_name(&entry.name)
}

/// Decides the action for a single entry of `directory`.
fn plan_entry(
    directory: &Path,
    entry: &DirectoryEntry,
    config: &Configuration,
    ignore: &IgnoreRules,
    is_protected: bool,
) -> MoveAction {
    if entry.is_hidden {
        return MoveAction::skipped(entry, Outcome::SkippedHidden);
    }

    if entry.is_dir {
        let outcome = if config.is_category_name(&entry.name) {
            Outcome::SkippedCategoryFolder
        } else {
            Outcome::SkippedIsDirectory
        };
        return MoveAction::skipped(entry, outcome);
    }

    if is_protected || ignore.is_ignored(&entry.name) {
        return MoveAction::skipped(entry, Outcome::SkippedIgnored);
    }

    match classify(entry, config) {
        Some(category) => {
            let file_name = entry.path.file_name().map(PathBuf::from).unwrap_or_else(|| {
                // Listings always carry a file name; keep the lossy one otherwise.
                PathBuf::from(&entry.name)
            });
            MoveAction {
                source: entry.path.clone(),
                destination: directory.join(category).join(file_name),
                category: Some(category.to_string()),
                outcome: Outcome::Planned,
            }
        }
        None => MoveAction::skipped(entry, Outcome::SkippedNoExtension),
    }
}

/// Plans and executes the organization of a directory.
pub struct Organizer<F: FileSystem = StdFileSystem> {
    fs: F,
    protected: Vec<PathBuf>,
}

impl Organizer<StdFileSystem> {
    /// Creates an organizer working on the real filesystem.
    pub fn new() -> Self {
        Self::with_fs(StdFileSystem)
    }
}

impl Default for Organizer<StdFileSystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> Organizer<F> {
    /// Creates an organizer over a custom filesystem.
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs,
            protected: Vec::new(),
        }
    }

    /// Never moves the file at `path`, such as the active configuration or
    /// log file. Entries are matched by canonical path.
    pub fn protecting(mut self, path: impl Into<PathBuf>) -> Self {
        self.protected.push(path.into());
        self
    }

    fn is_protected(&self, entry: &DirectoryEntry, protected: &[PathBuf]) -> bool {
        if protected.is_empty() || entry.is_dir {
            return false;
        }
        self.fs
            .canonicalize(&entry.path)
            .is_ok_and(|path| protected.contains(&path))
    }

    /// Builds the move plan for `directory`.
    ///
    /// Entries are listed non-recursively and handled in name order. Each
    /// entry gets exactly one action: hidden entries, directories, category
    /// folders, ignored files and (by policy) extensionless files are skipped;
    /// every other file is planned into `directory/<category>/<name>`.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::ReadDirectory`] if the listing fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::category::Configuration;
    /// use sortdir::file_organizer::Organizer;
    /// use sortdir::filters::IgnoreRules;
    /// use std::path::Path;
    ///
    /// let organizer = Organizer::new();
    /// let plan = organizer
    ///     .plan(Path::new("/home/user/Downloads"), &Configuration::default(), &IgnoreRules::default())
    ///     .expect("directory should be readable");
    /// for action in plan.actions() {
    ///     println!("{} -> {} ({})", action.source.display(), action.destination.display(), action.outcome);
    /// }
    /// ```
    pub fn plan(
        &self,
        directory: &Path,
        config: &Configuration,
        ignore: &IgnoreRules,
    ) -> OrganizeResult<Plan> {
        let mut entries =
            self.fs
                .read_dir(directory)
                .map_err(|e| OrganizeError::ReadDirectory {
                    path: directory.to_path_buf(),
                    source: e,
                })?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        // Protected files that do not exist yet cannot be listed either.
        let protected: Vec<PathBuf> = self
            .protected
            .iter()
            .filter_map(|path| self.fs.canonicalize(path).ok())
            .collect();

        let actions = entries
            .iter()
            .map(|entry| {
                let is_protected = self.is_protected(entry, &protected);
                if is_protected {
                    tracing::debug!(file = %entry.path.display(), "leaving protected file in place");
                }
                plan_entry(directory, entry, config, ignore, is_protected)
            })
            .collect();

        let mut category_order: Vec<String> =
            config.rules().iter().map(|rule| rule.name().to_string()).collect();
        category_order.push(FALLBACK_CATEGORY.to_string());

        Ok(Plan {
            directory: directory.to_path_buf(),
            actions,
            category_order,
        })
    }

    /// Executes a plan.
    ///
    /// See [`Organizer::execute_with_progress`].
    pub fn execute(&self, plan: Plan) -> OrganizeResult<Report> {
        self.execute_with_progress(plan, |_| {})
    }

    /// Executes a plan, calling `on_action` after each action is settled.
    ///
    /// Every `Planned` action becomes `Moved` or `Error(reason)`; all other
    /// actions pass through unchanged. A failed move never stops the batch.
    /// The category folder is created on first use. An occupied destination
    /// yields `Error("destination exists")` and the file is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::NotADirectory`] if the plan's directory is gone
    /// before the run starts, and [`OrganizeError::DirectoryVanished`] if it
    /// disappears during the run.
    pub fn execute_with_progress<C>(&self, plan: Plan, mut on_action: C) -> OrganizeResult<Report>
    where
        C: FnMut(&MoveAction),
    {
        let Plan {
            directory,
            actions,
            category_order,
        } = plan;

        if !self.fs.is_dir(&directory) {
            return Err(OrganizeError::NotADirectory(directory));
        }

        let started_at = Utc::now();
        let total = actions.len();
        let mut results = Vec::with_capacity(total);

        for (completed, mut action) in actions.into_iter().enumerate() {
            if action.outcome == Outcome::Planned {
                action.outcome = self.move_planned(&action);

                if matches!(action.outcome, Outcome::Error(_)) && !self.fs.is_dir(&directory) {
                    tracing::error!(directory = %directory.display(), "target directory disappeared");
                    return Err(OrganizeError::DirectoryVanished {
                        path: directory,
                        completed,
                        total,
                    });
                }
            }
            on_action(&action);
            results.push(action);
        }

        Ok(Report {
            directory,
            started_at,
            finished_at: Utc::now(),
            actions: results,
            category_order,
        })
    }

    fn move_planned(&self, action: &MoveAction) -> Outcome {
        if let Some(category_dir) = action.destination.parent()
            && !self.fs.is_dir(category_dir)
            && let Err(e) = self.fs.create_dir_all(category_dir)
        {
            tracing::error!(
                directory = %category_dir.display(),
                error = %e,
                "failed to create category folder"
            );
            return Outcome::Error(format!(
                "failed to create {}: {}",
                category_dir.display(),
                e
            ));
        }

        if self.fs.exists(&action.destination) {
            tracing::warn!(
                source = %action.source.display(),
                destination = %action.destination.display(),
                "destination exists, leaving file in place"
            );
            return Outcome::Error(DESTINATION_EXISTS.to_string());
        }

        match self.fs.move_file(&action.source, &action.destination) {
            Ok(()) => {
                tracing::info!(
                    source = %action.source.display(),
                    destination = %action.destination.display(),
                    "moved"
                );
                Outcome::Moved
            }
            Err(e) => {
                tracing::error!(source = %action.source.display(), error = %e, "move failed");
                Outcome::Error(e.to_string())
            }
        }
    }
}
