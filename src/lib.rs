//! datesort - rename date-stamped photos and quarantine everything else
//!
//! Files named `YYYYMMDD_<id>.jpg` are renamed in place to
//! `<Month>_<DD>_<YYYY>--<id>.jpg`. Every other file is moved into an
//! `uncategorized` subdirectory. Each move is logged to `manifest.csv` so the
//! whole run can be reverted later.

pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod manifest;
pub mod matcher;
pub mod output;
pub mod quarantine;
pub mod rename;
pub mod revert;
pub mod transform;

pub use cli::{Cli, ForwardSummary, RunSummary, run, run_cli};
pub use config::{Mode, RunConfig, Settings};
pub use error::{RenameError, RenameResult, Severity};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use manifest::{Manifest, ManifestRecord, ManifestWriter};
pub use output::{ConsoleReporter, Event, MemoryReporter, Reporter};
pub use revert::RevertReport;
