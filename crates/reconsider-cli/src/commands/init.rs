use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use reconsider_config::ReconsiderConfig;
use reconsider_loader::CONFIG_FILE;

pub fn cmd_init(db: Option<String>) -> Result<()> {
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() {
        bail!("{CONFIG_FILE} already exists");
    }

    let config = ReconsiderConfig {
        db,
        ..Default::default()
    };
    let json = serde_json::to_string_pretty(&config).context("serialize default config")?;
    fs::write(&path, json).with_context(|| format!("write {CONFIG_FILE}"))?;
    fs::create_dir_all(config.source_dir()).context("create migrations directory")?;

    println!("created {:?}", path);
    if config.db().is_none() {
        println!("set \"db\" in {CONFIG_FILE} before running migrations");
    }
    Ok(())
}
