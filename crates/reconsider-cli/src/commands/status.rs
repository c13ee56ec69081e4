use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use reconsider_core::{MigrationDescriptor, timestamp};

use crate::utils::{load_reconsider, open_store};

pub async fn cmd_status(store_path: &Path) -> Result<()> {
    let store = open_store(store_path)?;
    let recon = load_reconsider(store)?;
    let config = recon.config();

    println!("{}", "Configuration:".bright_cyan().bold());
    println!("  {} {}", "Database:".cyan(), recon.db_name().bright_white());
    println!(
        "  {} {}",
        "Migrations table:".cyan(),
        config.table_name().bright_white()
    );
    println!(
        "  {} {}",
        "Migrations directory:".cyan(),
        format!("{}", config.source_dir().display()).bright_white()
    );
    println!(
        "  {} {}",
        "Store:".cyan(),
        format!("{}", store_path.display()).bright_white()
    );
    println!();

    let migrations = recon.status().await?;
    let pending = migrations.iter().filter(|m| m.is_pending()).count();
    println!(
        "{} {} ({} {})",
        "Migrations:".bright_cyan().bold(),
        migrations.len().to_string().bright_yellow(),
        pending.to_string().bright_yellow(),
        "pending".bright_white()
    );
    for migration in &migrations {
        println!("  {}", describe(migration));
    }

    Ok(())
}

fn describe(migration: &MigrationDescriptor) -> String {
    match migration.completed {
        Some(at) => format!(
            "{} {} {}",
            "✓".bright_green(),
            migration.id.bright_white(),
            timestamp::format(&at).bright_black()
        ),
        None => format!("{} {}", "•".bright_yellow(), migration.id.bright_white()),
    }
}
