/// Category rules and extension lookup.
///
/// A [`Configuration`] is an ordered list of [`CategoryRule`]s plus the implicit
/// fallback category. Every extension belongs to at most one category; the
/// lookup index is rebuilt from the rules whenever they change.
///
/// # Examples
///
/// ```
/// use sortdir::category::Configuration;
///
/// let config = Configuration::default();
/// assert_eq!(config.classify_name("photo.JPG"), Some("Images"));
/// assert_eq!(config.classify_name("report.pdf"), Some("Documents"));
/// assert_eq!(config.classify_name("notes.xyz"), Some("Other"));
/// ```
use std::collections::HashMap;
use thiserror::Error;

/// Destination for files whose extension matches no rule.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Errors raised when an edit would break the configuration invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigEditError {
    #[error("category '{0}' already exists")]
    DuplicateCategory(String),
    #[error("category '{0}' does not exist")]
    UnknownCategory(String),
    #[error("invalid category name '{0}': must be a non-empty single path component")]
    InvalidCategoryName(String),
    #[error("invalid extension '{0}'")]
    InvalidExtension(String),
    #[error("extension '{extension}' already belongs to category '{owner}'")]
    ExtensionTaken { extension: String, owner: String },
}

/// How files without an extension are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionlessPolicy {
    /// Extensionless files go to the fallback category.
    #[default]
    Fallback,
    /// Extensionless files are left in place.
    Skip,
}

/// A named category and the extensions it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    name: String,
    extensions: Vec<String>,
}

impl CategoryRule {
    /// The category name, which is also its folder name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized extensions (lowercase, leading dot) in definition order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

/// Normalizes a user-supplied extension to lowercase with a leading dot.
///
/// Returns `None` for empty input or input containing path separators.
///
/// ```
/// use sortdir::category::normalize_extension;
///
/// assert_eq!(normalize_extension("JPG").as_deref(), Some(".jpg"));
/// assert_eq!(normalize_extension(" .Tar.GZ ").as_deref(), Some(".tar.gz"));
/// assert_eq!(normalize_extension("."), None);
/// ```
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.chars().any(char::is_whitespace)
    {
        return None;
    }
    if trimmed.starts_with('.') {
        Some(trimmed)
    } else {
        Some(format!(".{}", trimmed))
    }
}

fn validate_category_name(name: &str) -> Result<String, ConfigEditError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(ConfigEditError::InvalidCategoryName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Candidate extensions of a file name, longest first.
///
/// `backup.tar.gz` yields `.tar.gz` then `.gz`. Leading dots of the name are
/// not separators, and a trailing lone dot is not an extension.
fn extension_candidates(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let body = lower.trim_start_matches('.');
    body.char_indices()
        .filter(|&(_, c)| c == '.')
        .map(|(i, _)| &body[i..])
        .filter(|candidate| candidate.len() > 1)
        .map(str::to_string)
        .collect()
}

/// The ordered category→extensions mapping used for classification.
#[derive(Debug, Clone)]
pub struct Configuration {
    rules: Vec<CategoryRule>,
    index: HashMap<String, usize>,
    extensionless: ExtensionlessPolicy,
}

impl Configuration {
    /// Creates a configuration with no categories; everything falls back.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
            extensionless: ExtensionlessPolicy::default(),
        }
    }

    /// Builds a configuration from `(name, extensions)` pairs in order.
    ///
    /// An extension claimed by an earlier category is dropped from later ones,
    /// so the first-defined category wins.
    ///
    /// # Errors
    ///
    /// Fails on a repeated or invalid category name, or an invalid extension.
    pub fn from_rules<I, N, E, S>(rules: I) -> Result<Self, ConfigEditError>
    where
        I: IntoIterator<Item = (N, E)>,
        N: AsRef<str>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::empty();
        for (name, extensions) in rules {
            config.add_category(name.as_ref())?;
            let idx = config.rules.len() - 1;
            for raw in extensions {
                let ext = normalize_extension(raw.as_ref())
                    .ok_or_else(|| ConfigEditError::InvalidExtension(raw.as_ref().to_string()))?;
                match config.index.get(&ext) {
                    Some(&owner) if owner == idx => {}
                    Some(&owner) => {
                        tracing::warn!(
                            extension = %ext,
                            kept = %config.rules[owner].name,
                            dropped = %config.rules[idx].name,
                            "extension assigned to more than one category; first wins"
                        );
                    }
                    None => {
                        config.index.insert(ext.clone(), idx);
                        config.rules[idx].extensions.push(ext);
                    }
                }
            }
        }
        Ok(config)
    }

    /// The category rules in definition order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Looks up a category rule by exact name.
    pub fn category(&self, name: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Returns true if `name` is a configured category or the fallback.
    ///
    /// Used to recognize category folders left by a previous run.
    pub fn is_category_name(&self, name: &str) -> bool {
        name == FALLBACK_CATEGORY || self.category(name).is_some()
    }

    pub fn extensionless_policy(&self) -> ExtensionlessPolicy {
        self.extensionless
    }

    pub fn set_extensionless_policy(&mut self, policy: ExtensionlessPolicy) {
        self.extensionless = policy;
    }

    /// Returns the category owning a single extension, if any.
    ///
    /// ```
    /// use sortdir::category::Configuration;
    ///
    /// let config = Configuration::default();
    /// assert_eq!(config.category_for_extension("MP3"), Some("Audio"));
    /// assert_eq!(config.category_for_extension(".unknown"), None);
    /// ```
    pub fn category_for_extension(&self, ext: &str) -> Option<&str> {
        let ext = normalize_extension(ext)?;
        self.index
            .get(&ext)
            .map(|&idx| self.rules[idx].name.as_str())
    }

    /// Classifies a file name.
    ///
    /// Tries every dotted suffix of the name, longest first; the first one
    /// present in the index decides. Unmatched names go to the fallback
    /// category. Extensionless names go to the fallback category, or return
    /// `None` when the policy is [`ExtensionlessPolicy::Skip`].
    pub fn classify_name(&self, name: &str) -> Option<&str> {
        let candidates = extension_candidates(name);
        if candidates.is_empty() {
            return match self.extensionless {
                ExtensionlessPolicy::Fallback => Some(FALLBACK_CATEGORY),
                ExtensionlessPolicy::Skip => None,
            };
        }

        let matched = candidates
            .iter()
            .find_map(|candidate| self.index.get(candidate))
            .map(|&idx| self.rules[idx].name.as_str());

        Some(matched.unwrap_or(FALLBACK_CATEGORY))
    }

    /// Appends a new, empty category.
    pub fn add_category(&mut self, name: &str) -> Result<(), ConfigEditError> {
        let name = validate_category_name(name)?;
        if self.category(&name).is_some() {
            return Err(ConfigEditError::DuplicateCategory(name));
        }
        self.rules.push(CategoryRule {
            name,
            extensions: Vec::new(),
        });
        Ok(())
    }

    /// Removes a category and releases its extensions.
    pub fn remove_category(&mut self, name: &str) -> Result<CategoryRule, ConfigEditError> {
        let pos = self.position(name)?;
        let removed = self.rules.remove(pos);
        self.rebuild_index();
        Ok(removed)
    }

    /// Adds an extension to a category. Adding one it already owns is a no-op.
    pub fn add_extension(&mut self, category: &str, ext: &str) -> Result<(), ConfigEditError> {
        let pos = self.position(category)?;
        let ext = normalize_extension(ext)
            .ok_or_else(|| ConfigEditError::InvalidExtension(ext.to_string()))?;
        match self.index.get(&ext) {
            Some(&owner) if owner == pos => Ok(()),
            Some(&owner) => Err(ConfigEditError::ExtensionTaken {
                extension: ext,
                owner: self.rules[owner].name.clone(),
            }),
            None => {
                self.index.insert(ext.clone(), pos);
                self.rules[pos].extensions.push(ext);
                Ok(())
            }
        }
    }

    /// Removes an extension from a category. Returns whether it was present.
    pub fn remove_extension(&mut self, category: &str, ext: &str) -> Result<bool, ConfigEditError> {
        let pos = self.position(category)?;
        let Some(ext) = normalize_extension(ext) else {
            return Ok(false);
        };
        let before = self.rules[pos].extensions.len();
        self.rules[pos].extensions.retain(|e| *e != ext);
        let removed = self.rules[pos].extensions.len() != before;
        if removed {
            self.index.remove(&ext);
        }
        Ok(removed)
    }

    /// Replaces the extension list of a category.
    ///
    /// Fails without changing anything if an extension is invalid or owned by
    /// another category. Repeats within `extensions` are collapsed.
    pub fn set_extensions<S: AsRef<str>>(
        &mut self,
        category: &str,
        extensions: &[S],
    ) -> Result<(), ConfigEditError> {
        let pos = self.position(category)?;
        let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
        for raw in extensions {
            let ext = normalize_extension(raw.as_ref())
                .ok_or_else(|| ConfigEditError::InvalidExtension(raw.as_ref().to_string()))?;
            if let Some(&owner) = self.index.get(&ext)
                && owner != pos
            {
                return Err(ConfigEditError::ExtensionTaken {
                    extension: ext,
                    owner: self.rules[owner].name.clone(),
                });
            }
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        self.rules[pos].extensions = normalized;
        self.rebuild_index();
        Ok(())
    }

    fn position(&self, name: &str) -> Result<usize, ConfigEditError> {
        self.rules
            .iter()
            .position(|rule| rule.name == name)
            .ok_or_else(|| ConfigEditError::UnknownCategory(name.to_string()))
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (idx, rule) in self.rules.iter().enumerate() {
            for ext in &rule.extensions {
                self.index.entry(ext.clone()).or_insert(idx);
            }
        }
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules && self.extensionless == other.extensionless
    }
}

impl Eq for Configuration {}

impl Default for Configuration {
    /// The built-in mapping used when no configuration file can be loaded.
    fn default() -> Self {
        let rules: [(&str, &[&str]); 9] = [
            (
                "Images",
                &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp"],
            ),
            (
                "Documents",
                &[".pdf", ".docx", ".txt", ".xlsx", ".pptx", ".odt", ".rtf", ".csv"],
            ),
            ("Audio", &[".mp3", ".wav", ".aac", ".flac", ".ogg", ".m4a"]),
            (
                "Videos",
                &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm"],
            ),
            ("Archives", &[".zip", ".rar", ".tar", ".gz", ".7z", ".bz2"]),
            (
                "Scripts",
                &[".py", ".js", ".sh", ".bat", ".rb", ".php", ".html", ".css"],
            ),
            ("Executables", &[".exe", ".msi", ".dmg", ".app"]),
            ("Fonts", &[".ttf", ".otf", ".woff", ".woff2"]),
            ("Torrents", &[".torrent"]),
        ];

        let mut config = Self::empty();
        for (name, extensions) in rules {
            config.rules.push(CategoryRule {
                name: name.to_string(),
                extensions: extensions.iter().map(|e| e.to_string()).collect(),
            });
        }
        config.rebuild_index();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images_and_docs() -> Configuration {
        Configuration::from_rules([("Images", vec![".jpg"]), ("Documents", vec![".pdf"])]).unwrap()
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".PNG").as_deref(), Some(".png"));
        assert_eq!(normalize_extension("png").as_deref(), Some(".png"));
        assert_eq!(normalize_extension(""), None);
        assert_eq!(normalize_extension("   "), None);
        assert_eq!(normalize_extension("a/b"), None);
    }

    #[test]
    fn test_extension_candidates() {
        assert_eq!(extension_candidates("backup.tar.gz"), vec![".tar.gz", ".gz"]);
        assert_eq!(extension_candidates("photo.JPG"), vec![".jpg"]);
        assert!(extension_candidates("README").is_empty());
        assert!(extension_candidates("trailing.").is_empty());
        assert!(extension_candidates(".bashrc").is_empty());
        assert_eq!(extension_candidates(".config.json"), vec![".json"]);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let config = images_and_docs();
        assert_eq!(config.classify_name("photo.JPG"), Some("Images"));
        assert_eq!(config.classify_name("Report.Pdf"), Some("Documents"));
    }

    #[test]
    fn test_classify_unknown_falls_back() {
        let config = images_and_docs();
        assert_eq!(config.classify_name("song.mp3"), Some(FALLBACK_CATEGORY));
    }

    #[test]
    fn test_classify_extensionless_policy() {
        let mut config = images_and_docs();
        assert_eq!(config.extensionless_policy(), ExtensionlessPolicy::Fallback);
        assert_eq!(config.classify_name("Makefile"), Some(FALLBACK_CATEGORY));

        config.set_extensionless_policy(ExtensionlessPolicy::Skip);
        assert_eq!(config.extensionless_policy(), ExtensionlessPolicy::Skip);
        assert_eq!(config.classify_name("Makefile"), None);
        // Files with an unknown extension still fall back under Skip.
        assert_eq!(config.classify_name("data.bin"), Some(FALLBACK_CATEGORY));
    }

    #[test]
    fn test_classify_prefers_longest_suffix() {
        let config =
            Configuration::from_rules([("Archives", vec![".gz"]), ("Backups", vec![".tar.gz"])])
                .unwrap();
        assert_eq!(config.classify_name("site.tar.gz"), Some("Backups"));
        assert_eq!(config.classify_name("log.gz"), Some("Archives"));
    }

    #[test]
    fn test_first_defined_category_wins() {
        let config = Configuration::from_rules([
            ("Documents", vec![".txt", ".pdf"]),
            ("Notes", vec![".TXT", ".md"]),
        ])
        .unwrap();

        assert_eq!(config.classify_name("todo.txt"), Some("Documents"));
        assert_eq!(config.category("Notes").unwrap().extensions(), &[".md"]);
    }

    #[test]
    fn test_from_rules_rejects_duplicate_category() {
        let result = Configuration::from_rules([("Images", vec![".jpg"]), ("Images", vec![".png"])]);
        assert_eq!(
            result.unwrap_err(),
            ConfigEditError::DuplicateCategory("Images".to_string())
        );
    }

    #[test]
    fn test_from_rules_rejects_invalid_extension() {
        let result = Configuration::from_rules([("Images", vec![""])]);
        assert!(matches!(result, Err(ConfigEditError::InvalidExtension(_))));
    }

    #[test]
    fn test_default_has_no_shared_extensions() {
        let config = Configuration::default();
        let total: usize = config.rules().iter().map(|r| r.extensions().len()).sum();
        assert_eq!(total, config.index.len());
        assert_eq!(config.rules()[0].name(), "Images");
    }

    #[test]
    fn test_is_category_name_includes_fallback() {
        let config = images_and_docs();
        assert!(config.is_category_name("Images"));
        assert!(config.is_category_name("Other"));
        assert!(!config.is_category_name("images"));
        assert!(!config.is_category_name("Music"));
    }

    #[test]
    fn test_add_and_remove_category() {
        let mut config = images_and_docs();
        config.add_category("Music").unwrap();
        assert_eq!(
            config.add_category("Music"),
            Err(ConfigEditError::DuplicateCategory("Music".to_string()))
        );
        assert!(matches!(
            config.add_category("a/b"),
            Err(ConfigEditError::InvalidCategoryName(_))
        ));

        let removed = config.remove_category("Images").unwrap();
        assert_eq!(removed.extensions(), &[".jpg"]);
        assert_eq!(config.classify_name("x.jpg"), Some(FALLBACK_CATEGORY));
        assert_eq!(config.rules()[0].name(), "Documents");
    }

    #[test]
    fn test_add_extension_rejects_taken() {
        let mut config = images_and_docs();
        config.add_extension("Images", "PNG").unwrap();
        config.add_extension("Images", ".png").unwrap();
        assert_eq!(config.category("Images").unwrap().extensions(), &[".jpg", ".png"]);

        let err = config.add_extension("Documents", ".jpg").unwrap_err();
        assert_eq!(
            err,
            ConfigEditError::ExtensionTaken {
                extension: ".jpg".to_string(),
                owner: "Images".to_string(),
            }
        );
        assert!(matches!(
            config.add_extension("Missing", ".x"),
            Err(ConfigEditError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_remove_extension() {
        let mut config = images_and_docs();
        assert!(config.remove_extension("Images", "JPG").unwrap());
        assert!(!config.remove_extension("Images", ".jpg").unwrap());
        assert_eq!(config.category_for_extension(".jpg"), None);
    }

    #[test]
    fn test_set_extensions_is_atomic() {
        let mut config = images_and_docs();
        let err = config.set_extensions("Images", &["png", "pdf"]).unwrap_err();
        assert!(matches!(err, ConfigEditError::ExtensionTaken { .. }));
        assert_eq!(config.category("Images").unwrap().extensions(), &[".jpg"]);

        config.set_extensions("Images", &["png", "PNG", "gif"]).unwrap();
        assert_eq!(config.category("Images").unwrap().extensions(), &[".png", ".gif"]);
        assert_eq!(config.category_for_extension("jpg"), None);
        assert_eq!(config.category_for_extension("gif"), Some("Images"));
    }
}
