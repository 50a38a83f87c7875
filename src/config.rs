//! Run configuration and optional TOML settings.
//!
//! A run is described by a [`RunConfig`]: the directory to work in, whether to
//! rename or revert, and the [`Settings`] loaded from disk.
//!
//! # Settings File Format
//!
//! ```toml
//! [scan]
//! skip_hidden = false
//! exclude = ["*.part", "Thumbs.db"]
//!
//! [output]
//! color = true
//! progress = true
//! ```
//!
//! Files that are skipped by `[scan]` are left where they are: they are
//! neither renamed nor quarantined, and do not appear in the manifest.

use crate::error::{RenameError, RenameResult};
use glob::Pattern;
use serde::Deserialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the settings file looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = ".datesortrc.toml";

/// What a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rename matches and quarantine the rest.
    Forward {
        /// If true, only report what would happen.
        dry_run: bool,
    },
    /// Undo a previous forward run from its manifest.
    Revert,
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target_dir: PathBuf,
    pub mode: Mode,
    pub settings: Settings,
}

impl RunConfig {
    pub fn new(target_dir: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            target_dir: target_dir.into(),
            mode,
            settings: Settings::default(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}

/// Settings loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Which listed files take part in a forward run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScanSettings {
    /// Leave files whose name starts with "." untouched.
    #[serde(default)]
    pub skip_hidden: bool,

    /// Glob patterns matched against the filename; matches are left untouched.
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_true")]
    pub progress: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults.
    ///
    /// Looks in this order:
    /// 1. `settings_path`, if given
    /// 2. `.datesortrc.toml` in the current directory
    /// 3. `~/.config/datesort/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if any file
    /// that is found cannot be read or parsed.
    pub fn load(settings_path: Option<&Path>) -> RenameResult<Self> {
        if let Some(path) = settings_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_settings = PathBuf::from(home)
                .join(".config")
                .join("datesort")
                .join("config.toml");
            if home_settings.exists() {
                return Self::load_from_file(&home_settings);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> RenameResult<Self> {
        if !path.exists() {
            return Err(RenameError::Config {
                reason: format!("settings file not found: {}", path.display()),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| RenameError::Config {
            reason: format!("could not read {}: {}", path.display(), e),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> RenameResult<Self> {
        toml::from_str(content).map_err(|e| RenameError::Config {
            reason: e.to_string(),
        })
    }

    /// Compiles the scan rules.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude pattern is not a valid glob.
    pub fn scan_filter(&self) -> RenameResult<ScanFilter> {
        ScanFilter::new(&self.scan)
    }
}

/// Compiled scan rules.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    skip_hidden: bool,
    exclude: Vec<Pattern>,
}

impl ScanFilter {
    fn new(scan: &ScanSettings) -> RenameResult<Self> {
        let exclude = scan
            .exclude
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| RenameError::Config {
                    reason: format!("invalid exclude pattern '{}': {}", pattern, e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: scan.skip_hidden,
            exclude,
        })
    }

    /// Returns true if `name` should take part in the run.
    ///
    /// Globs see a lossy UTF-8 form of the name, so a pattern can still match
    /// the readable part of a name that is not valid UTF-8.
    pub fn should_include(&self, name: impl AsRef<OsStr>) -> bool {
        let name = name.as_ref();
        if self.skip_hidden && name.as_encoded_bytes().starts_with(b".") {
            return false;
        }
        let name = name.to_string_lossy();
        !self.exclude.iter().any(|pattern| pattern.matches(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_include_everything() {
        let filter = Settings::default().scan_filter().unwrap();
        assert!(filter.should_include(".DS_Store"));
        assert!(filter.should_include("notes.txt"));
        assert!(filter.should_include("20230101_1.jpg"));
    }

    #[test]
    fn test_default_output_enables_color_and_progress() {
        let settings = Settings::default();
        assert!(settings.output.color);
        assert!(settings.output.progress);
    }

    #[test]
    fn test_parse_full_settings() {
        let settings = Settings::from_toml(
            r#"
            [scan]
            skip_hidden = true
            exclude = ["*.part"]

            [output]
            color = false
            "#,
        )
        .unwrap();

        assert!(settings.scan.skip_hidden);
        assert_eq!(settings.scan.exclude, vec!["*.part"]);
        assert!(!settings.output.color);
        assert!(settings.output.progress);
    }

    #[test]
    fn test_empty_settings_are_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Settings::from_toml("[scan\nskip_hidden = true").unwrap_err();
        assert!(matches!(err, RenameError::Config { .. }));
    }

    #[test]
    fn test_skip_hidden() {
        let settings = Settings::from_toml("[scan]\nskip_hidden = true").unwrap();
        let filter = settings.scan_filter().unwrap();
        assert!(!filter.should_include(".DS_Store"));
        assert!(filter.should_include("notes.txt"));
    }

    #[test]
    fn test_exclude_globs() {
        let settings = Settings::from_toml(
            r#"
            [scan]
            exclude = ["*.part", "Thumbs.db"]
            "#,
        )
        .unwrap();
        let filter = settings.scan_filter().unwrap();

        assert!(!filter.should_include("20230101_1.jpg.part"));
        assert!(!filter.should_include("Thumbs.db"));
        assert!(filter.should_include("20230101_1.jpg"));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let settings = Settings::from_toml("[scan]\nexclude = [\"[abc\"]").unwrap();
        assert!(settings.scan_filter().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "[output]\nprogress = false\n").expect("Failed to write settings");

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(!settings.output.progress);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = Settings::load(Some(Path::new("/non/existent/settings.toml")));
        assert!(matches!(result, Err(RenameError::Config { .. })));
    }

    #[test]
    fn test_run_config_builder() {
        let config = RunConfig::new("photos", Mode::Revert);
        assert_eq!(config.target_dir, PathBuf::from("photos"));
        assert_eq!(config.mode, Mode::Revert);
        assert_eq!(config.settings, Settings::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_filter_handles_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let settings =
            Settings::from_toml("[scan]\nskip_hidden = true\nexclude = [\"*.part\"]").unwrap();
        let filter = settings.scan_filter().unwrap();

        assert!(!filter.should_include(OsStr::from_bytes(b".hidden\xff")));
        assert!(!filter.should_include(OsStr::from_bytes(b"scan\xff.part")));
        assert!(filter.should_include(OsStr::from_bytes(b"scan\xff.txt")));
    }
}
