//! Moves files that did not match into the quarantine directory.
//!
//! Basenames are preserved. A file that cannot be moved is reported and left
//! where it is; the rest of the collection is still processed.

use crate::error::{RenameError, RenameResult};
use crate::fs::FileSystem;
use crate::manifest::{ManifestRecord, ManifestWriter};
use crate::output::{Event, Reporter};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixed name of the quarantine directory inside the target directory.
pub const QUARANTINE_DIR_NAME: &str = "uncategorized";

/// Returns the quarantine directory for a target directory.
pub fn quarantine_path(target_dir: &Path) -> PathBuf {
    target_dir.join(QUARANTINE_DIR_NAME)
}

/// Creates the quarantine directory if it does not exist yet.
pub fn ensure_quarantine<F: FileSystem + ?Sized>(fs: &mut F, dir: &Path) -> RenameResult<()> {
    fs.create_dir_all(dir)
        .map_err(|e| RenameError::CreateQuarantine {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// What the quarantine pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuarantineOutcome {
    pub moved: Vec<ManifestRecord>,
    /// Names that could not be moved and remain in the target directory.
    pub failed: Vec<OsString>,
}

/// Moves each name in `unmatched` from `target_dir` into `quarantine_dir`.
///
/// # Arguments
///
/// * `fs` - Filesystem the moves go through
/// * `target_dir` - Directory the names currently live in
/// * `quarantine_dir` - Destination, which must already exist (see [`ensure_quarantine`])
/// * `unmatched` - Bare file names, usually [`RenameOutcome::unmatched`](crate::rename::RenameOutcome)
/// * `manifest` - Receives one record per completed move
/// * `reporter` - Receives a `Quarantined` or `Failed` event per name
///
/// # Returns
///
/// The records written, and the names whose move failed. Those files stay in
/// `target_dir` and have no manifest record.
///
/// # Errors
///
/// Individual move failures are reported as recoverable and skipped. Only a
/// manifest write failure (`WriteManifest`) ends the pass early.
///
/// # Examples
///
/// ```
/// use datesort::fs::MemoryFileSystem;
/// use datesort::manifest::ManifestWriter;
/// use datesort::output::MemoryReporter;
/// use datesort::quarantine::{ensure_quarantine, quarantine, quarantine_path};
/// use std::ffi::OsString;
/// use std::path::Path;
///
/// let target = Path::new("/photos");
/// let mut fs = MemoryFileSystem::new();
/// fs.add_file("/photos/notes.txt", "text");
/// let dir = quarantine_path(target);
/// ensure_quarantine(&mut fs, &dir).unwrap();
/// let mut manifest = ManifestWriter::new(Vec::new());
///
/// let outcome = quarantine(
///     &mut fs,
///     target,
///     &dir,
///     &[OsString::from("notes.txt")],
///     &mut manifest,
///     &mut MemoryReporter::new(),
/// )
/// .unwrap();
///
/// assert!(fs.is_file("/photos/uncategorized/notes.txt"));
/// assert_eq!(outcome.moved.len(), 1);
/// ```
pub fn quarantine<F, W>(
    fs: &mut F,
    target_dir: &Path,
    quarantine_dir: &Path,
    unmatched: &[OsString],
    manifest: &mut ManifestWriter<W>,
    reporter: &mut dyn Reporter,
) -> RenameResult<QuarantineOutcome>
where
    F: FileSystem + ?Sized,
    W: Write,
{
    let mut outcome = QuarantineOutcome::default();
    reporter.begin(unmatched.len());

    for name in unmatched {
        let old_path = target_dir.join(name);
        let new_path = quarantine_dir.join(name);

        if let Err(e) = fs.rename(&old_path, &new_path) {
            reporter.report(Event::Failed(RenameError::MoveFailed {
                from: old_path,
                to: new_path,
                source: e,
            }));
            outcome.failed.push(name.clone());
            continue;
        }

        let record = ManifestRecord::new(old_path, new_path);
        manifest.append(&record)?;
        reporter.report(Event::Quarantined {
            from: record.original_path.clone(),
            to: record.new_path.clone(),
        });
        outcome.moved.push(record);
    }

    reporter.finish();
    Ok(outcome)
}
