//! Error type shared by every stage of a run.
//!
//! Each variant is either fatal (the run stops and the error travels up to
//! `main`) or recoverable (the item is skipped, the error is reported and the
//! run carries on). [`RenameError::severity`] tells the two apart.

use crate::revert::RevertReport;
use std::io;
use std::path::PathBuf;

/// How a [`RenameError`] affects the run it occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the whole run.
    Fatal,
    /// Report, skip the item, continue.
    Recoverable,
}

/// Errors that can occur while renaming, quarantining or reverting.
#[derive(Debug)]
pub enum RenameError {
    /// The target directory could not be listed.
    ReadDirectory { path: PathBuf, source: io::Error },
    /// The quarantine directory could not be created.
    CreateQuarantine { path: PathBuf, source: io::Error },
    /// The manifest file could not be created.
    CreateManifest { path: PathBuf, source: io::Error },
    /// Appending a record to the manifest failed.
    WriteManifest { source: io::Error },
    /// Flushing the manifest to storage failed.
    SyncManifest { source: io::Error },
    /// The manifest file could not be opened or read.
    ReadManifest { path: PathBuf, source: io::Error },
    /// A manifest row is malformed.
    DecodeManifest { line: u64, reason: String },
    /// A name admitted by the matcher carries a date that is not a real `YYYYMMDD` day.
    InvalidDate {
        token: String,
        source: chrono::ParseError,
    },
    /// Renaming a matched file in place failed.
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Moving an unmatched file into quarantine failed.
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Moving a file back to its recorded original path failed.
    RestoreFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// The quarantine directory could not be removed after a revert.
    RemoveQuarantine { path: PathBuf, source: io::Error },
    /// The manifest could not be deleted after a revert.
    RemoveManifest { path: PathBuf, source: io::Error },
    /// Every record was restored but removing the quarantine directory or
    /// the manifest failed. `report` holds what the revert did get done.
    CleanupFailed {
        report: Box<RevertReport>,
        source: Box<RenameError>,
    },
    /// The settings file is missing or invalid.
    Config { reason: String },
}

impl RenameError {
    /// Classifies the error as fatal or recoverable.
    pub fn severity(&self) -> Severity {
        match self {
            Self::MoveFailed { .. } | Self::RestoreFailed { .. } => Severity::Recoverable,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl std::fmt::Display for RenameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadDirectory { path, source } => {
                write!(f, "Unable to read directory {}: {}", path.display(), source)
            }
            Self::CreateQuarantine { path, source } => {
                write!(
                    f,
                    "Could not create quarantine directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::CreateManifest { path, source } => {
                write!(
                    f,
                    "Could not create manifest {}: {}",
                    path.display(),
                    source
                )
            }
            Self::WriteManifest { source } => write!(f, "Could not write to manifest: {}", source),
            Self::SyncManifest { source } => write!(f, "Could not sync manifest: {}", source),
            Self::ReadManifest { path, source } => {
                write!(f, "Could not read manifest {}: {}", path.display(), source)
            }
            Self::DecodeManifest { line, reason } => {
                write!(f, "Malformed manifest at line {}: {}", line, reason)
            }
            Self::InvalidDate { token, source } => {
                write!(f, "Could not parse date '{}' as YYYYMMDD: {}", token, source)
            }
            Self::RenameFailed { from, to, source } => {
                write!(
                    f,
                    "Unable to rename {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::MoveFailed { from, to, source } => {
                write!(
                    f,
                    "Unable to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::RestoreFailed { from, to, source } => {
                write!(
                    f,
                    "Unable to restore {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::RemoveQuarantine { path, source } => {
                write!(
                    f,
                    "Could not remove quarantine directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::RemoveManifest { path, source } => {
                write!(f, "Could not delete manifest {}: {}", path.display(), source)
            }
            Self::Config { reason } => write!(f, "Invalid configuration: {}", reason),
            Self::CleanupFailed { report, source } => {
                write!(
                    f,
                    "{} ({} file(s) were restored before cleanup failed)",
                    source, report.restored_files
                )
            }
        }
    }
}

impl std::error::Error for RenameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadDirectory { source, .. }
            | Self::CreateQuarantine { source, .. }
            | Self::CreateManifest { source, .. }
            | Self::WriteManifest { source }
            | Self::SyncManifest { source }
            | Self::ReadManifest { source, .. }
            | Self::RenameFailed { source, .. }
            | Self::MoveFailed { source, .. }
            | Self::RestoreFailed { source, .. }
            | Self::RemoveQuarantine { source, .. }
            | Self::RemoveManifest { source, .. } => Some(source),
            Self::InvalidDate { source, .. } => Some(source),
            Self::CleanupFailed { source, .. } => Some(source.as_ref()),
            Self::DecodeManifest { .. } | Self::Config { .. } => None,
        }
    }
}

/// Result type for rename operations.
pub type RenameResult<T> = Result<T, RenameError>;
