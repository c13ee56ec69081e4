use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use reconsider_config::ReconsiderConfig;
use reconsider_core::MigrationScript;
use schemars::schema_for;

pub fn cmd_schema(out: PathBuf) -> Result<()> {
    if !out.exists() {
        fs::create_dir_all(&out).with_context(|| format!("create dir {}", out.display()))?;
    }

    let migration_path = out.join("migration.schema.json");
    let config_path = out.join("config.schema.json");

    fs::write(
        &migration_path,
        serde_json::to_string_pretty(&schema_for!(MigrationScript))
            .context("serialize migration schema")?,
    )
    .with_context(|| format!("write {}", migration_path.display()))?;

    fs::write(
        &config_path,
        serde_json::to_string_pretty(&schema_for!(ReconsiderConfig))
            .context("serialize config schema")?,
    )
    .with_context(|| format!("write {}", config_path.display()))?;

    println!("Wrote schemas:");
    println!("  {}", migration_path.display());
    println!("  {}", config_path.display());
    Ok(())
}
