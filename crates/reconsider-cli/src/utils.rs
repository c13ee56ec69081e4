use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use reconsider_core::{Logger, TracingLogger};
use reconsider_loader::load_config;
use reconsider_memory::MemoryDatabase;
use reconsider_runner::Reconsider;
use tracing_subscriber::EnvFilter;

/// Default location of the file-backed store.
pub const DEFAULT_STORE: &str = ".reconsider/store.json";

/// Install the tracing subscriber; `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "reconsider=trace" } else { "reconsider=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

pub fn open_store(path: &Path) -> Result<Arc<MemoryDatabase>> {
    let store = MemoryDatabase::load(path)
        .with_context(|| format!("open store: {}", path.display()))?;
    Ok(Arc::new(store))
}

pub fn save_store(store: &MemoryDatabase, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("save store: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "store saved");
    Ok(())
}

/// Build an engine from reconsider.json in the current directory, logging through tracing.
pub fn load_reconsider(store: Arc<MemoryDatabase>) -> Result<Reconsider> {
    let config = load_config()?;
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    Ok(Reconsider::new(store, config, logger)?)
}

/// Lowercase `message`, replacing anything but letters and digits with single dashes.
pub fn sanitize_comment(message: &str) -> String {
    message
        .to_lowercase()
        .chars()
        .map(|ch| if ch.is_alphanumeric() || ch == ' ' { ch } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Id for a new migration: the next two-digit sequence number after the
/// highest numeric prefix among `existing`, then the sanitized message.
pub fn next_migration_id<'a>(existing: impl IntoIterator<Item = &'a str>, message: &str) -> String {
    let next = existing
        .into_iter()
        .filter_map(|id| {
            let digits: String = id.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .map_or(1, |n| n + 1);

    let slug = sanitize_comment(message);
    if slug.is_empty() {
        format!("{next:02}")
    } else {
        format!("{next:02}-{slug}")
    }
}
