use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reconsider_config::ReconsiderConfig;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "reconsider.json";

/// Load reconsider.json config from current directory.
pub fn load_config() -> Result<ReconsiderConfig> {
    let path = PathBuf::from(CONFIG_FILE);
    if !path.exists() {
        anyhow::bail!("{CONFIG_FILE} not found. Run 'reconsider init' first.");
    }
    read_config(&path)
}

/// Load config from a specific path.
pub fn load_config_from_path(path: PathBuf) -> Result<ReconsiderConfig> {
    if !path.exists() {
        anyhow::bail!("{CONFIG_FILE} not found at: {}", path.display());
    }
    read_config(&path)
}

/// Load config from project root, with fallback to defaults.
///
/// A relative `sourceDir` is resolved against `project_root` when one is given.
pub fn load_config_or_default(project_root: Option<PathBuf>) -> Result<ReconsiderConfig> {
    let config_path = match &project_root {
        Some(root) => root.join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    };

    let mut config = if config_path.exists() {
        load_config_from_path(config_path)?
    } else {
        ReconsiderConfig::default()
    };

    if let Some(root) = project_root {
        if config.source_dir.is_relative() {
            config.source_dir = root.join(&config.source_dir);
        }
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<ReconsiderConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let config: ReconsiderConfig = serde_json::from_str(&content)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    struct CwdGuard {
        original: PathBuf,
    }

    impl CwdGuard {
        fn new(dir: &Path) -> Self {
            let original = env::current_dir().unwrap();
            env::set_current_dir(dir).unwrap();
            Self { original }
        }
    }

    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = env::set_current_dir(&self.original);
        }
    }

    #[test]
    #[serial_test::serial]
    fn load_config_requires_file() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());

        let err = load_config().unwrap_err();
        assert!(err.to_string().contains("reconsider init"));
    }

    #[test]
    #[serial_test::serial]
    fn load_config_reads_current_directory() {
        let tmp = tempdir().unwrap();
        let _guard = CwdGuard::new(tmp.path());
        fs::write(CONFIG_FILE, r#"{"db": "app", "tableName": "ledger"}"#).unwrap();

        let config = load_config().unwrap();
        assert_eq!(config.db(), Some("app"));
        assert_eq!(config.table_name(), "ledger");
    }

    #[test]
    fn load_config_from_path_reports_parse_errors() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();

        let err = load_config_from_path(path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn load_config_from_missing_path_fails() {
        let tmp = tempdir().unwrap();
        assert!(load_config_from_path(tmp.path().join(CONFIG_FILE)).is_err());
    }

    #[test]
    fn load_config_or_default_resolves_source_dir() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"{"db": "app", "sourceDir": "db/migrations"}"#,
        )
        .unwrap();

        let config = load_config_or_default(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.source_dir(), tmp.path().join("db/migrations"));
    }

    #[test]
    fn load_config_or_default_without_file() {
        let tmp = tempdir().unwrap();
        let config = load_config_or_default(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.db(), None);
        assert_eq!(config.source_dir(), tmp.path().join("migrations"));
    }
}
