use sortdir::cli::{CliError, OrganizeCommand, RunOutput, Settings, run_cli_with_config};
/// Integration tests for sortdir
///
/// These tests run the complete organize workflow against real temporary
/// directories.
///
/// Test categories:
/// 1. Dry runs
/// 2. Live runs and repeated runs
/// 3. Collisions and per-file failures
/// 4. Configuration and ignore rules
/// 5. Edge cases and error scenarios
use sortdir::{
    ConfigStore, Configuration, ExtensionlessPolicy, IgnoreRules, OrganizeError, Organizer,
    Outcome, Plan, Report,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory to organize, plus a separate directory holding the
/// configuration files so they are never organized themselves.
struct TestFixture {
    target: TempDir,
    settings_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let fixture = TestFixture {
            target: TempDir::new().expect("Failed to create temp directory"),
            settings_dir: TempDir::new().expect("Failed to create temp directory"),
        };
        fixture.write_ignore_config("");
        fixture
    }

    /// Fixture whose category file holds `json`.
    fn with_config(json: &str) -> Self {
        let fixture = Self::new();
        fs::write(fixture.config_path(), json).expect("Failed to write config");
        fixture
    }

    fn path(&self) -> &Path {
        self.target.path()
    }

    fn config_path(&self) -> PathBuf {
        self.settings_dir.path().join("config.json")
    }

    fn ignore_path(&self) -> PathBuf {
        self.settings_dir.path().join("ignore.toml")
    }

    fn write_ignore_config(&self, toml: &str) {
        fs::write(self.ignore_path(), toml).expect("Failed to write ignore config");
    }

    fn settings(&self) -> Settings {
        Settings {
            config_path: self.config_path(),
            ignore_config: Some(self.ignore_path()),
            log_file: None,
        }
    }

    fn create_text_file(&self, name: &str, content: &str) {
        fs::write(self.path().join(name), content).expect("Failed to create file");
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir_all(self.path().join(name)).expect("Failed to create subdirectory");
    }

    fn preview(&self) -> Plan {
        self.preview_with(OrganizeCommand {
            dry_run: true,
            ..Default::default()
        })
    }

    fn preview_with(&self, command: OrganizeCommand) -> Plan {
        match run_cli_with_config(command, self.path(), &self.settings()) {
            Ok(RunOutput::Preview(plan)) => plan,
            other => panic!("expected a preview, got {:?}", other),
        }
    }

    fn organize(&self) -> Report {
        match run_cli_with_config(OrganizeCommand::default(), self.path(), &self.settings()) {
            Ok(RunOutput::Executed(report)) => report,
            other => panic!("expected a report, got {:?}", other),
        }
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// Count files directly in the directory.
    fn count_files(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .count()
    }

    /// Count directories directly in the directory.
    fn count_dirs(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .count()
    }
}

fn outcome_of<'a>(actions: &'a [sortdir::MoveAction], name: &str) -> &'a Outcome {
    &actions
        .iter()
        .find(|a| a.file_name() == name)
        .unwrap_or_else(|| panic!("no action for {}", name))
        .outcome
}

const IMAGES_AND_DOCS: &str = r#"{"Images": [".jpg"], "Documents": [".pdf"]}"#;

// ============================================================================
// Test Suite 1: Dry Runs
// ============================================================================

#[test]
fn test_dry_run_example_directory() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_text_file("photo.JPG", "jpeg");
    fixture.create_text_file("report.pdf", "pdf");
    fixture.create_text_file(".hidden", "secret");
    fixture.create_subdir("Images");

    let plan = fixture.preview();
    let actions = plan.actions();

    assert_eq!(actions.len(), 4);
    assert_eq!(outcome_of(actions, "photo.JPG"), &Outcome::Planned);
    assert_eq!(outcome_of(actions, "report.pdf"), &Outcome::Planned);
    assert_eq!(outcome_of(actions, ".hidden"), &Outcome::SkippedHidden);
    assert_eq!(outcome_of(actions, "Images"), &Outcome::SkippedCategoryFolder);

    let photo = actions.iter().find(|a| a.file_name() == "photo.JPG").unwrap();
    assert_eq!(photo.destination, fixture.path().join("Images").join("photo.JPG"));
    let report = actions.iter().find(|a| a.file_name() == "report.pdf").unwrap();
    assert_eq!(report.destination, fixture.path().join("Documents").join("report.pdf"));
}

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_text_file("photo.jpg", "jpeg");
    fixture.create_text_file("report.pdf", "pdf");

    let plan = fixture.preview();
    assert_eq!(plan.planned_count(), 2);

    fixture.assert_file_exists("photo.jpg");
    fixture.assert_file_exists("report.pdf");
    assert_eq!(fixture.count_dirs(), 0, "Dry run should not create directories");
}

// ============================================================================
// Test Suite 2: Live Runs
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    let report = fixture.organize();

    assert!(report.actions.is_empty());
    assert!(report.is_complete_success());
    assert_eq!(fixture.count_dirs(), 0, "Should have no subdirectories");
}

#[test]
fn test_organize_mixed_file_types_with_defaults() {
    let fixture = TestFixture::new();
    for name in [
        "photo1.png",
        "photo2.JPEG",
        "report.pdf",
        "archive.zip",
        "song.mp3",
        "setup.exe",
        "notes.unknownext",
    ] {
        fixture.create_text_file(name, name);
    }

    let report = fixture.organize();

    let summary = report.summary();
    assert_eq!(summary.moved, 7);
    assert_eq!(summary.errors, 0);

    fixture.assert_file_exists("Images/photo1.png");
    fixture.assert_file_exists("Images/photo2.JPEG");
    fixture.assert_file_exists("Documents/report.pdf");
    fixture.assert_file_exists("Archives/archive.zip");
    fixture.assert_file_exists("Audio/song.mp3");
    fixture.assert_file_exists("Executables/setup.exe");
    fixture.assert_file_exists("Other/notes.unknownext");
    assert_eq!(fixture.count_files(), 0);
    assert_eq!(fixture.read("Audio/song.mp3"), "song.mp3");
}

#[test]
fn test_organize_creates_only_needed_folders() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_text_file("photo.jpg", "jpeg");

    fixture.organize();

    assert_eq!(fixture.count_dirs(), 1);
    fixture.assert_file_exists("Images/photo.jpg");
}

#[test]
fn test_second_run_is_noop() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_text_file("photo.jpg", "jpeg");
    fixture.create_text_file("report.pdf", "pdf");
    fixture.create_text_file("data.bin", "bin");

    let first = fixture.organize();
    assert_eq!(first.summary().moved, 3);

    let second = fixture.preview();
    assert_eq!(second.planned_count(), 0);
    assert!(
        second
            .actions()
            .iter()
            .all(|a| a.outcome == Outcome::SkippedCategoryFolder),
        "only category folders should remain: {:?}",
        second.actions()
    );

    let third = fixture.organize();
    assert_eq!(third.summary().moved, 0);
    fixture.assert_file_exists("Images/photo.jpg");
    fixture.assert_file_exists("Other/data.bin");
}

#[test]
fn test_subdirectories_are_not_recursed() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_subdir("trip");
    fixture.create_text_file("trip/beach.jpg", "jpeg");

    let report = fixture.organize();

    assert_eq!(outcome_of(&report.actions, "trip"), &Outcome::SkippedIsDirectory);
    fixture.assert_file_exists("trip/beach.jpg");
    fixture.assert_file_not_exists("Images");
}

// ============================================================================
// Test Suite 3: Collisions and Failures
// ============================================================================

#[test]
fn test_collision_is_reported_not_overwritten() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_subdir("Documents");
    fixture.create_text_file("Documents/report.pdf", "old report");
    fixture.create_text_file("report.pdf", "new report");
    fixture.create_text_file("photo.jpg", "jpeg");

    let report = fixture.organize();

    let collided = report
        .actions
        .iter()
        .find(|a| a.file_name() == "report.pdf")
        .unwrap();
    assert_eq!(
        collided.outcome,
        Outcome::Error("destination exists".to_string())
    );
    assert_eq!(outcome_of(&report.actions, "photo.jpg"), &Outcome::Moved);
    assert!(!report.is_complete_success());

    assert_eq!(fixture.read("Documents/report.pdf"), "old report");
    assert_eq!(fixture.read("report.pdf"), "new report");
}

#[test]
fn test_file_removed_between_plan_and_execute() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.jpg", "a");
    fixture.create_text_file("b.jpg", "b");
    fixture.create_text_file("c.pdf", "c");

    let config = Configuration::from_rules([("Images", vec![".jpg"]), ("Documents", vec![".pdf"])])
        .unwrap();
    let organizer = Organizer::new();
    let plan = organizer
        .plan(fixture.path(), &config, &IgnoreRules::none())
        .unwrap();

    fs::remove_file(fixture.path().join("b.jpg")).unwrap();
    let report = organizer.execute(plan).unwrap();

    assert_eq!(outcome_of(&report.actions, "a.jpg"), &Outcome::Moved);
    assert!(matches!(
        outcome_of(&report.actions, "b.jpg"),
        Outcome::Error(_)
    ));
    assert_eq!(outcome_of(&report.actions, "c.pdf"), &Outcome::Moved);
    fixture.assert_file_exists("Images/a.jpg");
    fixture.assert_file_exists("Documents/c.pdf");
}

#[test]
fn test_directory_removed_before_execute() {
    let fixture = TestFixture::new();
    let target = fixture.path().join("inbox");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("a.jpg"), "a").unwrap();

    let organizer = Organizer::new();
    let plan = organizer
        .plan(&target, &Configuration::default(), &IgnoreRules::none())
        .unwrap();
    fs::remove_dir_all(&target).unwrap();

    let result = organizer.execute(plan);
    assert!(matches!(result, Err(OrganizeError::NotADirectory(_))));
}

// ============================================================================
// Test Suite 4: Configuration and Ignore Rules
// ============================================================================

#[test]
fn test_first_run_writes_default_config() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.png", "png");

    fixture.organize();

    let stored = ConfigStore::load(&fixture.config_path()).expect("config should be written");
    assert_eq!(stored, Configuration::default());
    fixture.assert_file_exists("Images/photo.png");
}

#[test]
fn test_malformed_config_falls_back_to_defaults() {
    let fixture = TestFixture::with_config(r#"{"Images": "not a list"}"#);
    fixture.create_text_file("song.mp3", "mp3");

    let report = fixture.organize();

    assert_eq!(outcome_of(&report.actions, "song.mp3"), &Outcome::Moved);
    fixture.assert_file_exists("Audio/song.mp3");
    assert_eq!(
        fs::read_to_string(fixture.config_path()).unwrap(),
        r#"{"Images": "not a list"}"#
    );
}

#[test]
fn test_edited_config_round_trips_and_applies() {
    let fixture = TestFixture::new();
    let mut config = ConfigStore::default();
    config.add_category("Ebooks").unwrap();
    config.set_extensions("Ebooks", &[".epub", ".mobi"]).unwrap();
    ConfigStore::save(&config, &fixture.config_path()).unwrap();

    assert_eq!(ConfigStore::load(&fixture.config_path()).unwrap(), config);

    fixture.create_text_file("novel.EPUB", "book");
    fixture.organize();
    fixture.assert_file_exists("Ebooks/novel.EPUB");
}

#[test]
fn test_config_file_inside_target_is_left_in_place() {
    let fixture = TestFixture::new();
    let settings = Settings {
        config_path: fixture.path().join("config.json"),
        ..fixture.settings()
    };
    fixture.create_text_file("config.json", r#"{"Ebooks": [".epub"]}"#);
    fixture.create_text_file("book.epub", "book");

    let organize = || match run_cli_with_config(OrganizeCommand::default(), fixture.path(), &settings)
    {
        Ok(RunOutput::Executed(report)) => report,
        other => panic!("expected a report, got {:?}", other),
    };

    let first = organize();
    assert_eq!(outcome_of(&first.actions, "config.json"), &Outcome::SkippedIgnored);
    assert_eq!(outcome_of(&first.actions, "book.epub"), &Outcome::Moved);
    fixture.assert_file_exists("config.json");
    fixture.assert_file_exists("Ebooks/book.epub");

    let second = organize();
    assert_eq!(second.summary().moved, 0);
    assert!(second.is_complete_success());
    assert_eq!(outcome_of(&second.actions, "Ebooks"), &Outcome::SkippedCategoryFolder);

    // The user's categories are still the ones in use.
    fixture.create_text_file("novel.epub", "book");
    let third = organize();
    assert_eq!(outcome_of(&third.actions, "novel.epub"), &Outcome::Moved);
    fixture.assert_file_exists("Ebooks/novel.epub");
    assert_eq!(fixture.read("config.json"), r#"{"Ebooks": [".epub"]}"#);
}

#[test]
fn test_default_config_written_inside_target_is_left_in_place() {
    let fixture = TestFixture::new();
    let settings = Settings {
        config_path: fixture.path().join("config.json"),
        ..fixture.settings()
    };
    fixture.create_text_file("photo.png", "png");

    let plan = match run_cli_with_config(
        OrganizeCommand {
            dry_run: true,
            ..Default::default()
        },
        fixture.path(),
        &settings,
    ) {
        Ok(RunOutput::Preview(plan)) => plan,
        other => panic!("expected a preview, got {:?}", other),
    };

    assert_eq!(outcome_of(plan.actions(), "config.json"), &Outcome::SkippedIgnored);
    assert_eq!(outcome_of(plan.actions(), "photo.png"), &Outcome::Planned);
}

#[test]
fn test_log_file_inside_target_is_left_in_place() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    let settings = Settings {
        log_file: Some(fixture.path().join("sortdir.log")),
        ..fixture.settings()
    };
    fixture.create_text_file("sortdir.log", "previous run\n");
    fixture.create_text_file("notes.txt", "notes");

    let report = match run_cli_with_config(OrganizeCommand::default(), fixture.path(), &settings) {
        Ok(RunOutput::Executed(report)) => report,
        other => panic!("expected a report, got {:?}", other),
    };

    assert_eq!(outcome_of(&report.actions, "sortdir.log"), &Outcome::SkippedIgnored);
    fixture.assert_file_exists("sortdir.log");
    fixture.assert_file_exists("Other/notes.txt");
}

#[test]
fn test_default_ignore_list_and_custom_rules() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.write_ignore_config(
        r#"
[ignore]
extensions = ["part"]
patterns = ["~$*"]
"#,
    );
    fixture.create_text_file("desktop.ini", "ini");
    fixture.create_text_file("movie.mkv.part", "partial");
    fixture.create_text_file("~$report.pdf", "lock");
    fixture.create_text_file("report.pdf", "pdf");

    let report = fixture.organize();

    assert_eq!(outcome_of(&report.actions, "desktop.ini"), &Outcome::SkippedIgnored);
    assert_eq!(outcome_of(&report.actions, "movie.mkv.part"), &Outcome::SkippedIgnored);
    assert_eq!(outcome_of(&report.actions, "~$report.pdf"), &Outcome::SkippedIgnored);
    assert_eq!(outcome_of(&report.actions, "report.pdf"), &Outcome::Moved);
    fixture.assert_file_exists("desktop.ini");
    fixture.assert_file_exists("movie.mkv.part");
}

#[test]
fn test_invalid_ignore_config_is_an_error() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.write_ignore_config("[ignore]\npatterns = [\"[unclosed\"]\n");
    fixture.create_text_file("report.pdf", "pdf");

    let result = run_cli_with_config(OrganizeCommand::default(), fixture.path(), &fixture.settings());

    assert!(matches!(result, Err(CliError::Filters(_))));
    fixture.assert_file_exists("report.pdf");
}

#[test]
fn test_skip_extensionless_policy() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_text_file("Makefile", "all:");
    fixture.create_text_file("LICENSE", "MIT");

    let plan = fixture.preview_with(OrganizeCommand {
        dry_run: true,
        extensionless: ExtensionlessPolicy::Skip,
    });
    assert_eq!(outcome_of(plan.actions(), "Makefile"), &Outcome::SkippedNoExtension);

    let report = fixture.organize();
    assert_eq!(outcome_of(&report.actions, "LICENSE"), &Outcome::Moved);
    fixture.assert_file_exists("Other/LICENSE");
}

// ============================================================================
// Test Suite 5: Edge Cases
// ============================================================================

#[test]
fn test_missing_directory_is_reported() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("does-not-exist");

    let result = run_cli_with_config(OrganizeCommand::default(), &missing, &fixture.settings());

    assert!(matches!(
        result,
        Err(CliError::Organize(OrganizeError::ReadDirectory { .. }))
    ));
}

#[test]
fn test_multi_dot_and_uppercase_names() {
    let fixture = TestFixture::new();
    fixture.create_text_file("backup.2024.TAR.GZ", "gz");
    fixture.create_text_file("My Photo.Final.JPG", "jpg");

    fixture.organize();

    fixture.assert_file_exists("Archives/backup.2024.TAR.GZ");
    fixture.assert_file_exists("Images/My Photo.Final.JPG");
}

#[test]
fn test_file_named_like_category_is_organized() {
    let fixture = TestFixture::with_config(IMAGES_AND_DOCS);
    fixture.create_text_file("Images", "just a file");

    let report = fixture.organize();

    assert_eq!(outcome_of(&report.actions, "Images"), &Outcome::Moved);
    fixture.assert_file_exists("Other/Images");
}
