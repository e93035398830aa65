use std::time::Duration;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use hgcollect_runtime::{CollectProgress, RunSummary};

pub fn print_run_start(total: usize, workers: usize) {
    println!(
        "Collecting {} repositories ({} worker{})",
        total,
        workers,
        if workers == 1 { "" } else { "s" }
    );
}

pub fn print_progress(progress: &CollectProgress, verbose: bool) {
    match progress {
        CollectProgress::RepoDispatched { index, total, repo } => {
            if verbose {
                println!("[{}/{}] collecting {}", index, total, repo.display());
            }
        }
        CollectProgress::RepoCompleted {
            repo,
            records,
            errors,
        } => {
            if verbose {
                println!(
                    "done {} ({} records, {} errors)",
                    repo.display(),
                    records,
                    errors
                );
            }
        }
        CollectProgress::PersistFailed { repo, message } => {
            if std::io::stderr().is_terminal() {
                eprintln!(
                    "{} persisting {}: {}",
                    "error".red().bold(),
                    repo.display(),
                    message
                );
            } else {
                eprintln!("error persisting {}: {}", repo.display(), message);
            }
        }
    }
}

pub fn print_summary(summary: &RunSummary, elapsed: Duration) {
    let colored = std::io::stdout().is_terminal();

    println!();
    println!(
        "Collected {} records and {} error events from {} repositories in {:.2?}",
        count(summary.records, colored, Tone::Good),
        count(summary.errors, colored, Tone::Warn),
        summary.repos,
        elapsed
    );
    if summary.persist_failures > 0 {
        let line = format!(
            "{} repositories failed to persist; see stderr above",
            summary.persist_failures
        );
        if colored {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
    }
}

pub fn print_summary_json(summary: &RunSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

enum Tone {
    Good,
    Warn,
}

fn count(n: usize, colored: bool, tone: Tone) -> String {
    if !colored {
        return n.to_string();
    }
    match tone {
        Tone::Good => n.to_string().green().to_string(),
        // Zero errors is not worth a warning color.
        Tone::Warn if n == 0 => n.to_string(),
        Tone::Warn => n.to_string().yellow().to_string(),
    }
}
