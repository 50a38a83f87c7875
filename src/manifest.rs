//! The manifest: an append-only log of completed moves.
//!
//! Each row is `original_path,new_path` with standard CSV quoting and no
//! header. A row is only written after its move has succeeded on disk, and
//! rows are flushed one at a time so the file never claims more than what
//! happened. Reverting replays the rows in the order they were written.
//!
//! Paths are stored as their raw bytes on Unix, so a name that is not valid
//! UTF-8 comes back byte for byte. Other platforms only accept UTF-8 paths.

use crate::error::{RenameError, RenameResult};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Fixed name of the manifest inside the target directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.csv";

/// Returns the manifest path for a target directory.
pub fn manifest_path(target_dir: &Path) -> PathBuf {
    target_dir.join(MANIFEST_FILE_NAME)
}

/// One completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
}

impl ManifestRecord {
    pub fn new(original_path: impl Into<PathBuf>, new_path: impl Into<PathBuf>) -> Self {
        Self {
            original_path: original_path.into(),
            new_path: new_path.into(),
        }
    }
}

/// Appends records to a manifest sink.
pub struct ManifestWriter<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl<W: Write> ManifestWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
            written: 0,
        }
    }

    /// Writes one record and flushes it through to the sink.
    ///
    /// # Arguments
    ///
    /// * `record` - A move that has already completed on disk
    ///
    /// # Errors
    ///
    /// Returns `WriteManifest` if the row cannot be written or flushed, or if
    /// a path cannot be stored on this platform.
    ///
    /// # Examples
    ///
    /// ```
    /// use datesort::manifest::{ManifestRecord, ManifestWriter};
    ///
    /// let mut writer = ManifestWriter::new(Vec::new());
    /// writer
    ///     .append(&ManifestRecord::new("photos/a,b.txt", "photos/uncategorized/a,b.txt"))
    ///     .unwrap();
    ///
    /// let bytes = writer.into_inner().unwrap();
    /// assert_eq!(bytes, b"\"photos/a,b.txt\",\"photos/uncategorized/a,b.txt\"\n");
    /// ```
    pub fn append(&mut self, record: &ManifestRecord) -> RenameResult<()> {
        let row = [
            path_bytes(&record.original_path)?,
            path_bytes(&record.new_path)?,
        ];
        self.writer
            .write_record(row)
            .map_err(|e| RenameError::WriteManifest { source: e.into() })?;
        self.writer
            .flush()
            .map_err(|e| RenameError::WriteManifest { source: e })?;
        self.written += 1;
        Ok(())
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Flushes and hands back the underlying sink.
    pub fn into_inner(self) -> RenameResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| RenameError::WriteManifest {
                source: e.into_error(),
            })
    }
}

impl ManifestWriter<File> {
    /// Creates (or truncates) the manifest file at `path`.
    pub fn create(path: &Path) -> RenameResult<Self> {
        let file = File::create(path).map_err(|e| RenameError::CreateManifest {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(file))
    }

    /// Flushes buffered rows and syncs the file to storage.
    pub fn sync(self) -> RenameResult<()> {
        let file = self.into_inner()?;
        file.sync_all()
            .map_err(|e| RenameError::SyncManifest { source: e })
    }
}

/// A manifest read back from disk, in recorded order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub records: Vec<ManifestRecord>,
}

impl Manifest {
    /// Loads the manifest file at `path`.
    pub fn load(path: &Path) -> RenameResult<Self> {
        let file = File::open(path).map_err(|e| RenameError::ReadManifest {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_reader(file)
    }

    /// Parses every row, failing on the first malformed one.
    ///
    /// Nothing is returned from a manifest with a bad row; a partial record
    /// sequence would revert an arbitrary prefix of the run.
    ///
    /// # Arguments
    ///
    /// * `reader` - Headerless two-column CSV, as written by [`ManifestWriter`]
    ///
    /// # Errors
    ///
    /// Returns `DecodeManifest` with the 1-based line of the first row that
    /// is not valid CSV, does not have exactly two columns, or has an empty
    /// path.
    ///
    /// # Examples
    ///
    /// ```
    /// use datesort::manifest::{Manifest, ManifestRecord};
    ///
    /// let text = "photos/20230101_1.jpg,photos/January_01_2023--1.jpg\n";
    /// let manifest = Manifest::from_reader(text.as_bytes()).unwrap();
    /// assert_eq!(
    ///     manifest.records,
    ///     vec![ManifestRecord::new("photos/20230101_1.jpg", "photos/January_01_2023--1.jpg")]
    /// );
    ///
    /// assert!(Manifest::from_reader("one-column\n".as_bytes()).is_err());
    /// ```
    pub fn from_reader<R: Read>(reader: R) -> RenameResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in reader.byte_records().enumerate() {
            let fallback_line = index as u64 + 1;
            let row = row.map_err(|e| RenameError::DecodeManifest {
                line: e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line),
                reason: e.to_string(),
            })?;
            let line = row.position().map(|p| p.line()).unwrap_or(fallback_line);

            if row.len() != 2 {
                return Err(RenameError::DecodeManifest {
                    line,
                    reason: format!("expected 2 columns, found {}", row.len()),
                });
            }

            let (original, new) = (&row[0], &row[1]);
            if original.is_empty() || new.is_empty() {
                return Err(RenameError::DecodeManifest {
                    line,
                    reason: "empty path".to_string(),
                });
            }

            let decode = |field: &[u8]| {
                path_from_bytes(field).ok_or_else(|| RenameError::DecodeManifest {
                    line,
                    reason: "path is not valid UTF-8".to_string(),
                })
            };
            records.push(ManifestRecord::new(decode(original)?, decode(new)?));
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestRecord> {
        self.records.iter()
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> RenameResult<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Ok(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> RenameResult<&[u8]> {
    path.to_str()
        .map(str::as_bytes)
        .ok_or_else(|| RenameError::WriteManifest {
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} is not valid UTF-8", path.display()),
            ),
        })
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(bytes).ok().map(PathBuf::from)
}
