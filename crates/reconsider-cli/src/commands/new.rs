use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use reconsider_config::FileFormat;
use reconsider_core::{MigrationScript, MigrationSource};
use reconsider_loader::{DirectorySource, load_config};

use crate::utils::next_migration_id;

pub async fn cmd_new(message: String, format: Option<FileFormat>) -> Result<()> {
    let config = load_config()?;
    let dir = config.source_dir();
    if !dir.exists() {
        fs::create_dir_all(dir).context("create migrations directory")?;
    }

    let existing = DirectorySource::new(dir).list().await?;
    let id = next_migration_id(existing.iter().map(String::as_str), &message);
    let format = format.unwrap_or(config.migration_format());
    let path = dir.join(format!("{id}.{}", format.extension()));
    if path.exists() {
        bail!("migration file already exists: {}", path.display());
    }

    write_script(&path, &MigrationScript::template(Some(message)), format)?;
    println!("Created migration: {}", path.display());
    Ok(())
}

fn write_script(path: &Path, script: &MigrationScript, format: FileFormat) -> Result<()> {
    let text = match format {
        FileFormat::Json => serde_json::to_string_pretty(script).context("serialize migration")?,
        FileFormat::Yaml | FileFormat::Yml => {
            serde_yaml::to_string(script).context("serialize migration")?
        }
    };
    fs::write(path, text).with_context(|| format!("write file: {}", path.display()))
}
