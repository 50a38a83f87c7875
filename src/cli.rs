//! Command-line interface and run orchestration.
//!
//! This module handles:
//! - Argument parsing
//! - Listing the target directory
//! - Forward runs, dry runs and reverts
//! - Summary output

use crate::config::{Mode, RunConfig, ScanFilter, Settings};
use crate::error::{RenameError, RenameResult};
use crate::fs::{FileSystem, OsFileSystem};
use crate::manifest::{MANIFEST_FILE_NAME, Manifest, ManifestWriter, manifest_path};
use crate::output::{ConsoleReporter, Event, OutputFormatter, Reporter};
use crate::quarantine::{QUARANTINE_DIR_NAME, ensure_quarantine, quarantine, quarantine_path};
use crate::rename::{PlannedMove, plan, rename_matches};
use crate::revert::{RevertReport, revert};
use clap::Parser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Rename date-stamped photos to readable names and quarantine everything else.
#[derive(Parser, Debug)]
#[command(name = "datesort")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory where files to rename are found
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub target_dir: PathBuf,

    /// Undo a previous run using the manifest in the target directory
    #[arg(long, conflicts_with = "dry_run")]
    pub revert: bool,

    /// Show what would be renamed and quarantined without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Settings file (default: .datesortrc.toml, then ~/.config/datesort/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Only print warnings, failures and the summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.revert {
            Mode::Revert
        } else {
            Mode::Forward {
                dry_run: self.dry_run,
            }
        }
    }

    /// Loads settings and builds the run configuration.
    pub fn run_config(&self) -> RenameResult<RunConfig> {
        let settings = Settings::load(self.config.as_deref())?;
        Ok(RunConfig::new(self.target_dir.clone(), self.mode()).with_settings(settings))
    }
}

/// Counts from a forward run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForwardSummary {
    pub renamed: usize,
    pub quarantined: usize,
    /// Unmatched names that could not be moved into quarantine.
    pub failed: Vec<OsString>,
    /// Names left untouched by the scan settings.
    pub excluded: usize,
}

impl ForwardSummary {
    /// Number of records written to the manifest.
    pub fn recorded(&self) -> usize {
        self.renamed + self.quarantined
    }
}

/// The outcome of one run.
#[derive(Debug)]
pub enum RunSummary {
    Forward(ForwardSummary),
    DryRun(Vec<PlannedMove>),
    Revert(RevertReport),
}

/// Runs the command described by `cli` and prints its summary.
pub fn run_cli(cli: Cli) -> RenameResult<()> {
    let config = cli.run_config()?;

    if cli.no_color || !config.settings.output.color {
        colored::control::set_override(false);
    }

    let mut reporter = ConsoleReporter::new(config.settings.output.progress, cli.quiet);
    let target = config.target_dir.display().to_string();

    match config.mode {
        Mode::Forward { dry_run: false } => {
            OutputFormatter::info(&format!("Renaming files in: {}", target))
        }
        Mode::Forward { dry_run: true } => {
            OutputFormatter::dry_run_notice(&format!("Analyzing files in: {}", target))
        }
        Mode::Revert => OutputFormatter::info(&format!("Reverting previous run in: {}", target)),
    }

    let summary = match run(&config, &mut reporter) {
        Ok(summary) => summary,
        Err(RenameError::CleanupFailed { report, source }) => {
            print_revert_summary(&report);
            return Err(*source);
        }
        Err(e) => return Err(e),
    };

    match summary {
        RunSummary::Forward(summary) => print_forward_summary(&summary, &config.target_dir),
        RunSummary::DryRun(moves) => print_dry_run_summary(&moves, &config.target_dir),
        RunSummary::Revert(report) => print_revert_summary(&report),
    }

    Ok(())
}

/// Runs `config` against the real filesystem.
pub fn run(config: &RunConfig, reporter: &mut dyn Reporter) -> RenameResult<RunSummary> {
    match config.mode {
        Mode::Forward { dry_run: false } => forward_run(config, reporter).map(RunSummary::Forward),
        Mode::Forward { dry_run: true } => dry_run(config, reporter).map(RunSummary::DryRun),
        Mode::Revert => revert_run(config, reporter).map(RunSummary::Revert),
    }
}

/// Renames matches in place, quarantines the rest and writes the manifest.
///
/// The directory is listed first. The quarantine directory is created next,
/// so a target that cannot hold it fails before any manifest is written. The
/// manifest is synced to storage before returning.
pub fn forward_run(
    config: &RunConfig,
    reporter: &mut dyn Reporter,
) -> RenameResult<ForwardSummary> {
    let mut fs = OsFileSystem;
    let target_dir = config.target_dir.as_path();
    let filter = config.settings.scan_filter()?;

    let (names, excluded) = list_candidates(&fs, target_dir, &filter, reporter)?;

    let quarantine_dir = quarantine_path(target_dir);
    ensure_quarantine(&mut fs, &quarantine_dir)?;
    let mut manifest = ManifestWriter::create(&manifest_path(target_dir))?;

    let renamed = rename_matches(&mut fs, target_dir, &names, &mut manifest, reporter)?;
    let quarantined = quarantine(
        &mut fs,
        target_dir,
        &quarantine_dir,
        &renamed.unmatched,
        &mut manifest,
        reporter,
    )?;

    manifest.sync()?;

    Ok(ForwardSummary {
        renamed: renamed.renamed.len(),
        quarantined: quarantined.moved.len(),
        failed: quarantined.failed,
        excluded,
    })
}

/// Reports what a forward run would do. Nothing is created or moved.
pub fn dry_run(
    config: &RunConfig,
    reporter: &mut dyn Reporter,
) -> RenameResult<Vec<PlannedMove>> {
    let target_dir = config.target_dir.as_path();
    let filter = config.settings.scan_filter()?;

    let (names, _) = list_candidates(&OsFileSystem, target_dir, &filter, reporter)?;
    let moves = plan(target_dir, &quarantine_path(target_dir), &names)?;

    reporter.begin(moves.len());
    for planned in &moves {
        reporter.report(match planned.clone() {
            PlannedMove::Rename { from, to } => Event::WouldRename { from, to },
            PlannedMove::Quarantine { from, to } => Event::WouldQuarantine { from, to },
        });
    }
    reporter.finish();

    Ok(moves)
}

/// Reverts the run recorded in the target directory's manifest.
pub fn revert_run(
    config: &RunConfig,
    reporter: &mut dyn Reporter,
) -> RenameResult<RevertReport> {
    let target_dir = config.target_dir.as_path();
    let manifest_file = manifest_path(target_dir);
    let manifest = Manifest::load(&manifest_file)?;

    revert(
        &mut OsFileSystem,
        &manifest,
        &quarantine_path(target_dir),
        &manifest_file,
        reporter,
    )
}

/// Lists the files a forward run should consider.
///
/// The manifest itself is never a candidate. Names rejected by `filter` are
/// reported as excluded and counted. Returns the candidates in listing order
/// with the number excluded.
pub fn list_candidates<F: FileSystem + ?Sized>(
    fs: &F,
    target_dir: &Path,
    filter: &ScanFilter,
    reporter: &mut dyn Reporter,
) -> RenameResult<(Vec<OsString>, usize)> {
    let listing = fs
        .list_files(target_dir)
        .map_err(|e| RenameError::ReadDirectory {
            path: target_dir.to_path_buf(),
            source: e,
        })?;

    let mut names = Vec::with_capacity(listing.len());
    let mut excluded = 0;
    for name in listing {
        if name == MANIFEST_FILE_NAME || name == QUARANTINE_DIR_NAME {
            continue;
        }
        if filter.should_include(&name) {
            names.push(name);
        } else {
            excluded += 1;
            reporter.report(Event::Excluded {
                name: name.to_string_lossy().into_owned(),
            });
        }
    }

    Ok((names, excluded))
}

fn print_forward_summary(summary: &ForwardSummary, target_dir: &Path) {
    let mut rows = vec![
        ("Renamed", summary.renamed),
        ("Quarantined", summary.quarantined),
        ("Failed", summary.failed.len()),
    ];
    if summary.excluded > 0 {
        rows.push(("Excluded", summary.excluded));
    }
    OutputFormatter::summary_table(&rows);

    if !summary.failed.is_empty() {
        OutputFormatter::warning("These files could not be quarantined and were left in place:");
        for name in &summary.failed {
            OutputFormatter::warning(&format!("  - {}", name.to_string_lossy()));
        }
    }

    OutputFormatter::success(&format!(
        "Recorded {} moves. Use 'datesort --target-dir {} --revert' to undo.",
        summary.recorded(),
        target_dir.display()
    ));
}

fn print_dry_run_summary(moves: &[PlannedMove], target_dir: &Path) {
    let renames = moves
        .iter()
        .filter(|m| matches!(m, PlannedMove::Rename { .. }))
        .count();
    OutputFormatter::summary_table(&[
        ("Would rename", renames),
        ("Would quarantine", moves.len() - renames),
    ]);
    OutputFormatter::success("Dry run complete. No files were modified.");
    OutputFormatter::plain(&format!(
        "Run 'datesort --target-dir {}' (without --dry-run) to rename.",
        target_dir.display()
    ));
}

fn print_revert_summary(report: &RevertReport) {
    OutputFormatter::summary_table(&[
        ("Restored", report.restored_files),
        ("Failed", report.failed_restores.len()),
    ]);

    if report.is_complete_success() {
        if report.cleaned_up {
            OutputFormatter::success("Revert complete. Manifest and quarantine directory removed.");
        } else {
            OutputFormatter::warning("Every file was restored, but cleanup did not finish.");
        }
        return;
    }

    for (path, reason) in &report.failed_restores {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }
    OutputFormatter::warning("Manifest was NOT deleted due to failures.");
    OutputFormatter::warning("Fix the issues above and revert again.");
}
