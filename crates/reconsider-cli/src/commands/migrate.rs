use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use reconsider_core::{Direction, TimingReport};
use reconsider_runner::ReconsiderError;

use crate::utils::{load_reconsider, open_store, save_store};

pub async fn cmd_up(store_path: &Path, exclude: Vec<String>) -> Result<()> {
    run(store_path, Direction::Up, exclude).await
}

pub async fn cmd_down(store_path: &Path, exclude: Vec<String>) -> Result<()> {
    run(store_path, Direction::Down, exclude).await
}

async fn run(store_path: &Path, direction: Direction, exclude: Vec<String>) -> Result<()> {
    let store = open_store(store_path)?;
    let recon = load_reconsider(store.clone())?;
    let exclude: Vec<&str> = exclude.iter().map(String::as_str).collect();

    let result = match direction {
        Direction::Up => recon.migrate_up(&exclude).await,
        Direction::Down => recon.migrate_down(&exclude).await,
    };
    // Completed migrations stay recorded even when a later one fails.
    let saved = save_store(&store, store_path);

    let report = settle(result, saved)?;
    print_report(&report, direction);
    Ok(())
}

/// Merge the migration outcome with the store save. When both fail the
/// migration error leads and the save failure is its cause.
fn settle(
    result: Result<TimingReport, ReconsiderError>,
    saved: Result<()>,
) -> Result<TimingReport> {
    match (result, saved) {
        (Ok(report), Ok(())) => Ok(report),
        (Err(e), Ok(())) => Err(e.into()),
        (Ok(_), Err(save)) => Err(save),
        (Err(e), Err(save)) => {
            tracing::error!("{e}");
            Err(save.context(e.to_string()))
        }
    }
}

fn print_report(report: &TimingReport, direction: Direction) {
    if report.is_empty() {
        println!("{}", "Nothing to do.".bright_white());
        return;
    }

    let verb = match direction {
        Direction::Up => "Applied",
        Direction::Down => "Reverted",
    };
    println!("{}", format!("{verb}:").bright_cyan().bold());
    for timing in report {
        println!(
            "  {} {}",
            timing.id.bright_green(),
            format!("{:.3}s", timing.elapsed_secs()).bright_black()
        );
    }
    println!(
        "{} {}",
        "Total:".cyan(),
        format!("{:.3}s", report.total().as_secs_f64()).bright_white()
    );
}
