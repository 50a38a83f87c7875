//! Renames date-stamped files in place.
//!
//! Each listed name is classified by the matcher. Matches are renamed to
//! their readable form and logged to the manifest; everything else is handed
//! back for quarantine. A failed rename aborts the pass. The manifest still
//! holds every rename that completed before it.
//!
//! Two sources that map to the same readable name are not detected: the second
//! rename replaces the first file, as the platform's `rename` does.

use crate::error::{RenameError, RenameResult};
use crate::fs::FileSystem;
use crate::manifest::{ManifestRecord, ManifestWriter};
use crate::matcher;
use crate::output::{Event, Reporter};
use crate::transform;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};

/// What the rename pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    /// Records of the renames performed, in order.
    pub renamed: Vec<ManifestRecord>,
    /// Names that did not match, in listing order.
    pub unmatched: Vec<OsString>,
}

/// A rename or quarantine move that a dry run would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedMove {
    Rename { from: PathBuf, to: PathBuf },
    Quarantine { from: PathBuf, to: PathBuf },
}

/// New name for `name`, or `None` if it is not date-stamped.
///
/// A name that is not valid UTF-8 never matches. Fails only when a matched
/// name carries an impossible date.
pub fn readable_name(name: &OsStr) -> RenameResult<Option<String>> {
    let Some(parts) = name.to_str().and_then(matcher::decompose) else {
        return Ok(None);
    };
    transform::transform(&parts).map(Some)
}

/// Renames every matching name in `names` inside `target_dir`.
///
/// # Arguments
///
/// * `fs` - Filesystem the renames go through
/// * `target_dir` - Directory the names were listed from
/// * `names` - Bare file names, in the order they should be processed
/// * `manifest` - Receives one record per completed rename, before the next name is tried
/// * `reporter` - Receives a `Renamed` or `Unmatched` event per name
///
/// # Returns
///
/// The records written and the names that did not match, which are left in
/// place for the quarantine pass.
///
/// # Errors
///
/// Stops at the first name whose date is impossible (`InvalidDate`), whose
/// rename fails (`RenameFailed`) or whose record cannot be written
/// (`WriteManifest`). Everything renamed before that point is already in the
/// manifest.
///
/// # Examples
///
/// ```
/// use datesort::fs::{FileSystem, MemoryFileSystem};
/// use datesort::manifest::ManifestWriter;
/// use datesort::output::MemoryReporter;
/// use datesort::rename::rename_matches;
/// use std::ffi::OsString;
/// use std::path::Path;
///
/// let mut fs = MemoryFileSystem::new();
/// fs.add_file("/photos/20230415_12.jpg", "jpeg");
/// fs.add_file("/photos/notes.txt", "text");
/// let names = fs.list_files(Path::new("/photos")).unwrap();
/// let mut manifest = ManifestWriter::new(Vec::new());
///
/// let outcome = rename_matches(
///     &mut fs,
///     Path::new("/photos"),
///     &names,
///     &mut manifest,
///     &mut MemoryReporter::new(),
/// )
/// .unwrap();
///
/// assert!(fs.is_file("/photos/April_15_2023--12.jpg"));
/// assert_eq!(outcome.unmatched, vec![OsString::from("notes.txt")]);
/// assert_eq!(manifest.len(), 1);
/// ```
pub fn rename_matches<F, W>(
    fs: &mut F,
    target_dir: &Path,
    names: &[OsString],
    manifest: &mut ManifestWriter<W>,
    reporter: &mut dyn Reporter,
) -> RenameResult<RenameOutcome>
where
    F: FileSystem + ?Sized,
    W: Write,
{
    let mut outcome = RenameOutcome::default();
    reporter.begin(names.len());

    for name in names {
        let Some(new_name) = readable_name(name)? else {
            reporter.report(Event::Unmatched {
                name: name.to_string_lossy().into_owned(),
            });
            outcome.unmatched.push(name.clone());
            continue;
        };

        let old_path = target_dir.join(name);
        let new_path = target_dir.join(&new_name);
        fs.rename(&old_path, &new_path)
            .map_err(|e| RenameError::RenameFailed {
                from: old_path.clone(),
                to: new_path.clone(),
                source: e,
            })?;

        let record = ManifestRecord::new(old_path, new_path);
        manifest.append(&record)?;
        reporter.report(Event::Renamed {
            from: record.original_path.clone(),
            to: record.new_path.clone(),
        });
        outcome.renamed.push(record);
    }

    reporter.finish();
    Ok(outcome)
}

/// Works out what a forward run would do without touching anything.
pub fn plan(
    target_dir: &Path,
    quarantine_dir: &Path,
    names: &[OsString],
) -> RenameResult<Vec<PlannedMove>> {
    names
        .iter()
        .map(|name| {
            let from = target_dir.join(name);
            Ok(match readable_name(name)? {
                Some(new_name) => PlannedMove::Rename {
                    from,
                    to: target_dir.join(new_name),
                },
                None => PlannedMove::Quarantine {
                    from,
                    to: quarantine_dir.join(name),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::manifest::Manifest;
    use crate::output::MemoryReporter;

    fn names(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    fn photos(files: &[&str]) -> MemoryFileSystem {
        let mut fs = MemoryFileSystem::new();
        for file in files {
            fs.add_file(Path::new("/photos").join(file), file.as_bytes());
        }
        fs
    }

    #[test]
    fn test_renames_matches_and_collects_non_matches() {
        let listing = ["20230101_1.jpg", "20230101_2.jpg", "notes.txt"];
        let mut fs = photos(&listing);
        let mut manifest = ManifestWriter::new(Vec::new());
        let mut reporter = MemoryReporter::new();

        let outcome = rename_matches(
            &mut fs,
            Path::new("/photos"),
            &names(&listing),
            &mut manifest,
            &mut reporter,
        )
        .unwrap();

        assert_eq!(outcome.renamed.len(), 2);
        assert_eq!(outcome.unmatched, vec!["notes.txt"]);
        assert!(fs.is_file("/photos/January_01_2023--1.jpg"));
        assert!(fs.is_file("/photos/January_01_2023--2.jpg"));
        assert!(fs.is_file("/photos/notes.txt"));
        assert_eq!(
            fs.contents("/photos/January_01_2023--1.jpg"),
            Some(&b"20230101_1.jpg"[..])
        );
        assert_eq!(reporter.unmatched(), vec!["notes.txt"]);
    }

    #[test]
    fn test_manifest_records_renames_in_order() {
        let listing = ["20230415_12.jpg", "20221231_3.jpg"];
        let mut fs = photos(&listing);
        let mut manifest = ManifestWriter::new(Vec::new());

        rename_matches(
            &mut fs,
            Path::new("/photos"),
            &names(&listing),
            &mut manifest,
            &mut MemoryReporter::new(),
        )
        .unwrap();

        let bytes = manifest.into_inner().unwrap();
        let parsed = Manifest::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(
            parsed.records,
            vec![
                ManifestRecord::new("/photos/20230415_12.jpg", "/photos/April_15_2023--12.jpg"),
                ManifestRecord::new("/photos/20221231_3.jpg", "/photos/December_31_2022--3.jpg"),
            ]
        );
    }

    #[test]
    fn test_rename_failure_aborts_and_keeps_earlier_records() {
        let listing = ["20230101_1.jpg", "20230102_2.jpg", "20230103_3.jpg"];
        let mut fs = photos(&listing);
        fs.fail_on("/photos/20230102_2.jpg");
        let mut manifest = ManifestWriter::new(Vec::new());

        let err = rename_matches(
            &mut fs,
            Path::new("/photos"),
            &names(&listing),
            &mut manifest,
            &mut MemoryReporter::new(),
        )
        .unwrap_err();

        assert!(matches!(err, RenameError::RenameFailed { .. }));
        assert!(err.is_fatal());
        assert_eq!(manifest.len(), 1);
        assert!(fs.is_file("/photos/January_01_2023--1.jpg"));
        assert!(fs.is_file("/photos/20230102_2.jpg"));
        assert!(fs.is_file("/photos/20230103_3.jpg"));
    }

    #[test]
    fn test_invalid_date_aborts_pass() {
        let listing = ["20230101_1.jpg", "20231345_2.jpg", "20230103_3.jpg"];
        let mut fs = photos(&listing);
        let mut manifest = ManifestWriter::new(Vec::new());

        let err = rename_matches(
            &mut fs,
            Path::new("/photos"),
            &names(&listing),
            &mut manifest,
            &mut MemoryReporter::new(),
        )
        .unwrap_err();

        assert!(matches!(err, RenameError::InvalidDate { .. }));
        assert_eq!(manifest.len(), 1);
        assert!(fs.is_file("/photos/20231345_2.jpg"));
        assert!(fs.is_file("/photos/20230103_3.jpg"));
    }

    #[test]
    fn test_colliding_names_overwrite_silently() {
        // A file already carries the readable name the match maps to.
        let mut fs = MemoryFileSystem::new();
        fs.add_file("/photos/20230101_1.jpg", "first");
        fs.add_file("/photos/January_01_2023--1.jpg", "existing");
        let mut manifest = ManifestWriter::new(Vec::new());

        rename_matches(
            &mut fs,
            Path::new("/photos"),
            &names(&["20230101_1.jpg"]),
            &mut manifest,
            &mut MemoryReporter::new(),
        )
        .unwrap();

        assert_eq!(
            fs.contents("/photos/January_01_2023--1.jpg"),
            Some(&b"first"[..])
        );
        assert_eq!(fs.files().len(), 1);
    }

    #[test]
    fn test_readable_name() {
        assert_eq!(
            readable_name(OsStr::new("20230415_12.jpg"))
                .unwrap()
                .as_deref(),
            Some("April_15_2023--12.jpg")
        );
        assert_eq!(
            readable_name(OsStr::new("April_15_2023--12.jpg")).unwrap(),
            None
        );
    }

    #[test]
    fn test_plan_touches_nothing() {
        let plan = plan(
            Path::new("/photos"),
            Path::new("/photos/uncategorized"),
            &names(&["20230101_1.jpg", "notes.txt"]),
        )
        .unwrap();

        assert_eq!(
            plan,
            vec![
                PlannedMove::Rename {
                    from: PathBuf::from("/photos/20230101_1.jpg"),
                    to: PathBuf::from("/photos/January_01_2023--1.jpg"),
                },
                PlannedMove::Quarantine {
                    from: PathBuf::from("/photos/notes.txt"),
                    to: PathBuf::from("/photos/uncategorized/notes.txt"),
                },
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_unmatched_and_kept_intact() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"20230101_1\xff.jpg");
        let mut fs = MemoryFileSystem::new();
        fs.add_file(Path::new("/photos").join(raw), "bytes");
        let mut manifest = ManifestWriter::new(Vec::new());
        let mut reporter = MemoryReporter::new();

        let outcome = rename_matches(
            &mut fs,
            Path::new("/photos"),
            &[raw.to_os_string()],
            &mut manifest,
            &mut reporter,
        )
        .unwrap();

        assert!(outcome.renamed.is_empty());
        assert_eq!(outcome.unmatched, vec![raw.to_os_string()]);
        assert_eq!(reporter.unmatched().len(), 1);
        assert!(fs.is_file(Path::new("/photos").join(raw)));
    }
}
