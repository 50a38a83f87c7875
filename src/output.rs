//! Output formatting and reporting.
//!
//! The engines never print. They emit [`Event`]s into a [`Reporter`], and the
//! reporter decides what the operator sees. [`ConsoleReporter`] renders events
//! with colors and a progress bar; [`MemoryReporter`] keeps them for tests.

use crate::error::RenameError;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Stdout, Write};
use std::path::PathBuf;

/// Something that happened to one file during a run.
#[derive(Debug)]
pub enum Event {
    /// A matched file was renamed in place.
    Renamed { from: PathBuf, to: PathBuf },
    /// A name did not match the date-stamped pattern.
    Unmatched { name: String },
    /// An unmatched file was moved into quarantine.
    Quarantined { from: PathBuf, to: PathBuf },
    /// A file was moved back to its original path.
    Restored { from: PathBuf, to: PathBuf },
    /// A file was left untouched by the scan settings.
    Excluded { name: String },
    /// Dry run: a matched file would be renamed.
    WouldRename { from: PathBuf, to: PathBuf },
    /// Dry run: an unmatched file would be quarantined.
    WouldQuarantine { from: PathBuf, to: PathBuf },
    /// A per-item failure that did not stop the run.
    Failed(RenameError),
}

/// Receives events from a run.
pub trait Reporter {
    /// Called once before a pass over `total` items.
    fn begin(&mut self, _total: usize) {}

    fn report(&mut self, event: Event);

    /// Called once after the pass.
    fn finish(&mut self) {}
}

/// Renders events to a line-oriented sink, stdout by default.
///
/// While a progress bar is drawn, each line is written with the bar
/// suspended so the two never interleave.
pub struct ConsoleReporter<W: Write = Stdout> {
    out: W,
    progress: Option<ProgressBar>,
    show_progress: bool,
    quiet: bool,
}

impl ConsoleReporter {
    /// Creates a reporter that writes to stdout. `show_progress` draws a bar
    /// during each pass; `quiet` hides per-file success lines but still shows
    /// warnings and failures.
    pub fn new(show_progress: bool, quiet: bool) -> Self {
        Self::with_writer(io::stdout(), show_progress, quiet)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W, show_progress: bool, quiet: bool) -> Self {
        Self {
            out,
            progress: None,
            show_progress,
            quiet,
        }
    }

    /// Returns the sink, dropping any bar still drawn.
    pub fn into_inner(mut self) -> W {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        self.out
    }

    fn line(&mut self, text: String) {
        let out = &mut self.out;
        // A closed stdout is not worth aborting a half-finished run over.
        let _ = match &self.progress {
            Some(pb) => pb.suspend(|| writeln!(out, "{}", text)),
            None => writeln!(out, "{}", text),
        };
    }

    fn tick(&self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn begin(&mut self, total: usize) {
        if self.show_progress && total > 0 {
            self.progress = Some(OutputFormatter::create_progress_bar(total as u64));
        }
    }

    fn report(&mut self, event: Event) {
        match event {
            Event::Renamed { from, to } => {
                if !self.quiet {
                    self.line(format!(
                        "{} {} → {}",
                        "✓".green(),
                        from.display(),
                        to.display()
                    ));
                }
                self.tick();
            }
            Event::Unmatched { name } => {
                if !self.quiet {
                    self.line(format!(
                        "{} `{}` didn't match the date pattern",
                        "⚠".yellow(),
                        name
                    ));
                }
                self.tick();
            }
            Event::Quarantined { from, to } => {
                if !self.quiet {
                    self.line(format!(
                        "{} {} → {}",
                        "⚠".yellow(),
                        from.display(),
                        to.display()
                    ));
                }
                self.tick();
            }
            Event::Restored { from, to } => {
                if !self.quiet {
                    self.line(format!(
                        "{} {} → {}",
                        "✓".green(),
                        from.display(),
                        to.display()
                    ));
                }
                self.tick();
            }
            Event::Excluded { name } => {
                if !self.quiet {
                    self.line(format!("  skipped {}", name).dimmed().to_string());
                }
                self.tick();
            }
            Event::WouldRename { from, to } => {
                self.line(
                    format!("[DRY RUN] {} → {}", from.display(), to.display())
                        .yellow()
                        .to_string(),
                );
                self.tick();
            }
            Event::WouldQuarantine { from, to } => {
                self.line(
                    format!("[DRY RUN] {} → {}", from.display(), to.display())
                        .yellow()
                        .to_string(),
                );
                self.tick();
            }
            Event::Failed(error) => {
                self.line(format!("{} {}", "✗".red(), error));
                self.tick();
            }
        }
    }

    fn finish(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub events: Vec<Event>,
    pub passes: usize,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<&RenameError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Failed(error) => Some(error),
                _ => None,
            })
            .collect()
    }

    pub fn unmatched(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Unmatched { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn begin(&mut self, _total: usize) {
        self.passes += 1;
    }

    fn report(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// One-off styled messages outside of a pass.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a pass over `total` files.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a two-column summary table of labelled counts.
    ///
    /// ```no_run
    /// use datesort::output::OutputFormatter;
    ///
    /// OutputFormatter::summary_table(&[("Renamed", 2), ("Quarantined", 1)]);
    /// ```
    pub fn summary_table(rows: &[(&str, usize)]) {
        Self::header("SUMMARY");

        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(6);

        println!("{:<width$} | {}", "Action".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (label, count) in rows {
            let count_text = if *count == 0 {
                count.to_string().normal()
            } else {
                count.to_string().green()
            };
            println!("{:<width$} | {}", label, count_text, width = width);
        }
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
