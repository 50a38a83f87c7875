//! Reverting a forward run from its manifest.
//!
//! Every recorded move is undone in the order it was written, moving each
//! file from its new path back to its original one. Quarantined files are
//! therefore out of the quarantine directory before it is removed.

use crate::error::{RenameError, RenameResult};
use crate::fs::FileSystem;
use crate::manifest::Manifest;
use crate::output::{Event, Reporter};
use std::path::{Path, PathBuf};

/// Represents the result of a revert.
#[derive(Debug, Default)]
pub struct RevertReport {
    /// Number of files moved back to their original path.
    pub restored_files: usize,
    /// Records that could not be reverted, keyed by the path the file was expected at.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Whether the quarantine directory and manifest were removed.
    pub cleaned_up: bool,
}

impl RevertReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len()
    }

    /// Returns true if every record was reverted.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty()
    }
}

/// Reverts every record in `manifest`, then removes the quarantine directory
/// and the manifest file.
///
/// A record that cannot be reverted is reported and skipped; records already
/// reverted stay reverted. When any record fails, the quarantine directory and
/// manifest are left in place so the revert can be retried once the problem
/// is fixed. A retry re-attempts every record, including those whose files
/// were already moved back, and those attempts show up as failures.
///
/// # Errors
///
/// Only cleanup is fatal: a quarantine directory that cannot be removed (for
/// example because it holds files the manifest does not know about) or a
/// manifest that cannot be deleted. Both come back as
/// [`RenameError::CleanupFailed`], which carries the report of the restores
/// that did happen and the underlying error.
///
/// # Examples
///
/// ```no_run
/// use datesort::error::RenameError;
/// use datesort::fs::OsFileSystem;
/// use datesort::manifest::{Manifest, manifest_path};
/// use datesort::output::ConsoleReporter;
/// use datesort::quarantine::quarantine_path;
/// use datesort::revert::revert;
/// use std::path::Path;
///
/// let dir = Path::new("/path/to/photos");
/// let manifest = Manifest::load(&manifest_path(dir)).unwrap();
/// let report = revert(
///     &mut OsFileSystem,
///     &manifest,
///     &quarantine_path(dir),
///     &manifest_path(dir),
///     &mut ConsoleReporter::new(false, false),
/// );
/// match report {
///     Ok(report) => println!("Restored {} files", report.restored_files),
///     Err(RenameError::CleanupFailed { report, source }) => {
///         eprintln!("Restored {} files, then: {}", report.restored_files, source)
///     }
///     Err(e) => eprintln!("Revert failed: {}", e),
/// }
/// ```
pub fn revert<F: FileSystem + ?Sized>(
    fs: &mut F,
    manifest: &Manifest,
    quarantine_dir: &Path,
    manifest_file: &Path,
    reporter: &mut dyn Reporter,
) -> RenameResult<RevertReport> {
    let mut report = RevertReport::default();
    reporter.begin(manifest.len());

    for record in manifest.iter() {
        match fs.rename(&record.new_path, &record.original_path) {
            Ok(()) => {
                report.restored_files += 1;
                reporter.report(Event::Restored {
                    from: record.new_path.clone(),
                    to: record.original_path.clone(),
                });
            }
            Err(e) => {
                report
                    .failed_restores
                    .push((record.new_path.clone(), e.to_string()));
                reporter.report(Event::Failed(RenameError::RestoreFailed {
                    from: record.new_path.clone(),
                    to: record.original_path.clone(),
                    source: e,
                }));
            }
        }
    }

    reporter.finish();

    if !report.is_complete_success() {
        return Ok(report);
    }

    if let Err(source) = clean_up(fs, quarantine_dir, manifest_file) {
        return Err(RenameError::CleanupFailed {
            report: Box::new(report),
            source: Box::new(source),
        });
    }

    report.cleaned_up = true;
    Ok(report)
}

fn clean_up<F: FileSystem + ?Sized>(
    fs: &mut F,
    quarantine_dir: &Path,
    manifest_file: &Path,
) -> RenameResult<()> {
    if fs.exists(quarantine_dir) {
        fs.remove_dir(quarantine_dir)
            .map_err(|e| RenameError::RemoveQuarantine {
                path: quarantine_dir.to_path_buf(),
                source: e,
            })?;
    }

    if fs.exists(manifest_file) {
        fs.remove_file(manifest_file)
            .map_err(|e| RenameError::RemoveManifest {
                path: manifest_file.to_path_buf(),
                source: e,
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::manifest::ManifestRecord;
    use crate::output::MemoryReporter;

    const QUARANTINE: &str = "/photos/uncategorized";
    const MANIFEST: &str = "/photos/manifest.csv";

    /// State after a forward run over `20230101_1.jpg` and `notes.txt`.
    fn after_forward_run() -> (MemoryFileSystem, Manifest) {
        let mut fs = MemoryFileSystem::new();
        fs.add_file("/photos/January_01_2023--1.jpg", "photo");
        fs.add_file("/photos/uncategorized/notes.txt", "notes");
        fs.add_file(MANIFEST, "");

        let manifest = Manifest {
            records: vec![
                ManifestRecord::new("/photos/20230101_1.jpg", "/photos/January_01_2023--1.jpg"),
                ManifestRecord::new("/photos/notes.txt", "/photos/uncategorized/notes.txt"),
            ],
        };
        (fs, manifest)
    }

    fn run(fs: &mut MemoryFileSystem, manifest: &Manifest) -> RenameResult<RevertReport> {
        revert(
            fs,
            manifest,
            Path::new(QUARANTINE),
            Path::new(MANIFEST),
            &mut MemoryReporter::new(),
        )
    }

    #[test]
    fn test_revert_restores_and_cleans_up() {
        let (mut fs, manifest) = after_forward_run();

        let report = run(&mut fs, &manifest).unwrap();

        assert_eq!(report.restored_files, 2);
        assert!(report.is_complete_success());
        assert!(report.cleaned_up);
        assert_eq!(
            fs.files(),
            vec![
                PathBuf::from("/photos/20230101_1.jpg"),
                PathBuf::from("/photos/notes.txt"),
            ]
        );
        assert_eq!(fs.contents("/photos/20230101_1.jpg"), Some(&b"photo"[..]));
        assert!(!fs.exists(Path::new(QUARANTINE)));
        assert!(!fs.exists(Path::new(MANIFEST)));
    }

    #[test]
    fn test_revert_follows_recorded_order() {
        let (mut fs, manifest) = after_forward_run();
        let mut reporter = MemoryReporter::new();

        revert(
            &mut fs,
            &manifest,
            Path::new(QUARANTINE),
            Path::new(MANIFEST),
            &mut reporter,
        )
        .unwrap();

        let restored: Vec<_> = reporter
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Restored { to, .. } => Some(to.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            restored,
            vec![
                PathBuf::from("/photos/20230101_1.jpg"),
                PathBuf::from("/photos/notes.txt"),
            ]
        );
    }

    #[test]
    fn test_failed_record_keeps_manifest_and_quarantine() {
        let (mut fs, manifest) = after_forward_run();
        fs.fail_on("/photos/uncategorized/notes.txt");

        let report = run(&mut fs, &manifest).unwrap();

        assert_eq!(report.restored_files, 1);
        assert_eq!(report.failed_restores.len(), 1);
        assert_eq!(report.total_processed(), 2);
        assert!(!report.cleaned_up);
        assert!(fs.is_file("/photos/20230101_1.jpg"));
        assert!(fs.is_dir(QUARANTINE));
        assert!(fs.is_file(MANIFEST));
    }

    #[test]
    fn test_second_revert_reports_already_restored_records() {
        let (mut fs, manifest) = after_forward_run();
        fs.fail_on("/photos/uncategorized/notes.txt");
        run(&mut fs, &manifest).unwrap();

        // The manifest was not pruned, so the first record is attempted again.
        let report = run(&mut fs, &manifest).unwrap();

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.failed_restores.len(), 2);
        assert_eq!(
            report.failed_restores[0].0,
            PathBuf::from("/photos/January_01_2023--1.jpg")
        );
    }

    #[test]
    fn test_non_empty_quarantine_is_fatal() {
        let (mut fs, manifest) = after_forward_run();
        fs.add_file("/photos/uncategorized/stray.txt", "added later");

        let err = run(&mut fs, &manifest).unwrap_err();

        let RenameError::CleanupFailed { report, source } = err else {
            panic!("expected a cleanup failure");
        };
        assert!(matches!(*source, RenameError::RemoveQuarantine { .. }));
        assert_eq!(report.restored_files, 2);
        assert!(report.is_complete_success());
        assert!(!report.cleaned_up);
        assert!(fs.is_file("/photos/20230101_1.jpg"));
        assert!(fs.is_file("/photos/notes.txt"));
        assert!(fs.is_file(MANIFEST));
    }

    #[test]
    fn test_undeletable_manifest_still_reports_restores() {
        let (mut fs, manifest) = after_forward_run();
        fs.fail_on(MANIFEST);

        let err = run(&mut fs, &manifest).unwrap_err();

        let RenameError::CleanupFailed { report, source } = err else {
            panic!("expected a cleanup failure");
        };
        assert!(matches!(*source, RenameError::RemoveManifest { .. }));
        assert_eq!(report.restored_files, 2);
        assert!(!fs.exists(Path::new(QUARANTINE)));
        assert!(fs.is_file(MANIFEST));
    }

    #[test]
    fn test_empty_manifest_only_cleans_up() {
        let mut fs = MemoryFileSystem::new();
        fs.add_dir(QUARANTINE);
        fs.add_file(MANIFEST, "");

        let report = run(&mut fs, &Manifest::default()).unwrap();

        assert_eq!(report.restored_files, 0);
        assert!(report.cleaned_up);
        assert!(!fs.exists(Path::new(QUARANTINE)));
        assert!(!fs.exists(Path::new(MANIFEST)));
    }
}
