use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reconsider_config::{FileFormat, ReconsiderConfig};
use reconsider_core::{Migration, MigrationLoadError, MigrationScript, MigrationSource, SourceError};
use tokio::fs;

/// Migrations stored as JSON or YAML scripts in one directory.
///
/// The id of a migration is its file name without extension. Ids are listed in
/// file-name order; when two files share a stem the first one wins.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &ReconsiderConfig) -> Self {
        Self::new(config.source_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Migration files as `(id, path)` pairs, sorted by file name.
    async fn entries(&self) -> Result<Vec<(String, PathBuf)>, SourceError> {
        let io_err = |source| SourceError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            let is_file = fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            let ext = path.extension().and_then(|s| s.to_str());
            if ext.and_then(FileFormat::from_extension).is_none() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((stem.to_string(), path.clone()));
            }
        }

        files.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
        let mut seen = std::collections::HashSet::new();
        files.retain(|(id, _)| seen.insert(id.clone()));
        Ok(files)
    }
}

/// Parse a migration script, choosing the format from the file extension.
pub fn parse_script(path: &Path, content: &str) -> Result<MigrationScript, MigrationLoadError> {
    let parse_err = |message: String| MigrationLoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let format = path
        .extension()
        .and_then(|s| s.to_str())
        .and_then(FileFormat::from_extension)
        .ok_or_else(|| parse_err("unsupported file extension".into()))?;

    match format {
        FileFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        FileFormat::Yaml | FileFormat::Yml => {
            serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))
        }
    }
}

#[async_trait]
impl MigrationSource for DirectorySource {
    async fn list(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.entries().await?.into_iter().map(|(id, _)| id).collect())
    }

    async fn load(&self, id: &str) -> Result<Arc<dyn Migration>, MigrationLoadError> {
        let path = self
            .entries()
            .await?
            .into_iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, path)| path)
            .ok_or_else(|| MigrationLoadError::NotFound(id.to_string()))?;

        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| MigrationLoadError::Io {
                path: path.clone(),
                source,
            })?;
        let migration = parse_script(&path, &content)?.into_migration(id)?;
        Ok(Arc::new(migration))
    }
}
