//! Text report, progress spinner and run summary.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use pagelint_core::naming::format_size;
use pagelint_core::{Finding, RunReport, RunStats};
use std::io::{self, Write};
use std::time::Duration;

/// Spinner fed by the report stream, one tick per folder.
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} folder(s) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("scanning...");
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Write the findings and non-standard files of a run.
///
/// Each finding gets a section listing the affected episodes, followed by
/// every non-standard file with its dimensions and size.
pub fn write_report<W: Write>(out: &mut W, report: &RunReport, styled: bool) -> io::Result<()> {
    let heading = Style::new().bold().yellow().force_styling(styled);
    let dim = Style::new().dim().force_styling(styled);
    let ok = Style::new().green().force_styling(styled);

    let findings = report.findings();
    if report.is_clean() {
        writeln!(out, "{}", ok.apply_to("No findings."))?;
    }

    for finding in Finding::ALL {
        let Some(episodes) = findings.get(&finding) else {
            continue;
        };
        writeln!(out, "{}", heading.apply_to(finding.description()))?;
        for episode in episodes {
            writeln!(out, "  {}", episode)?;
        }
        writeln!(out)?;
    }

    let mut non_standard = report.non_standard_files().peekable();
    if non_standard.peek().is_some() {
        writeln!(out, "{}", heading.apply_to("Non-standard files"))?;
        for file in non_standard {
            writeln!(
                out,
                "  {}  {}x{}  {}",
                file.path.display(),
                file.width,
                file.height,
                dim.apply_to(format_size(file.size))
            )?;
        }
        writeln!(out)?;
    }

    let failed: Vec<_> = report
        .folders
        .iter()
        .filter(|f| f.decode_failures > 0)
        .collect();
    if !failed.is_empty() {
        writeln!(out, "{}", heading.apply_to("Unreadable files"))?;
        for folder in failed {
            writeln!(out, "  {}: {}", folder.episode, folder.decode_failures)?;
        }
    }
    Ok(())
}

/// Print a formatted summary table to stderr.
pub fn print_summary(stats: &RunStats, resize: bool) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Folders:      {:>8}", stats.folders);
    eprintln!("    Files:        {:>8}", stats.files);
    if stats.renamed > 0 {
        eprintln!("    Renamed:      {:>8}", stats.renamed);
    }
    if stats.decode_failures > 0 {
        eprintln!("    Unreadable:   {:>8}", stats.decode_failures);
    }
    if resize {
        eprintln!("  ------------------------------------");
        eprintln!("    Candidates:   {:>8}", stats.resize_candidates);
        eprintln!("    Resized:      {:>8}", stats.resized);
        if stats.best_effort > 0 {
            eprintln!("    Best effort:  {:>8}", stats.best_effort);
        }
        eprintln!("    Written:      {:>8}", stats.persisted);
        if stats.bytes_written > 0 {
            eprintln!("    Bytes:        {:>8}", format_size(stats.bytes_written));
        }
        if stats.persist_failures > 0 {
            eprintln!("    Failed:       {:>8}", stats.persist_failures);
        }
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("  ====================================");
}
