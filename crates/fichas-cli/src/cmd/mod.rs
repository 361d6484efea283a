pub mod export;
pub mod ficha;
pub mod ingest;
pub mod init;
pub mod serve;
pub mod summary;

use anyhow::Context;
use fichas_core::config::Config;
use fichas_core::SqliteFichaStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolved invocation context shared by every subcommand.
pub struct Ctx {
    pub root: PathBuf,
    /// `--db` / `FICHAS_DB` override of the configured database.
    pub db: Option<PathBuf>,
    pub json: bool,
}

impl Ctx {
    pub fn config(&self) -> anyhow::Result<Config> {
        Config::load(&self.root).context("failed to load .fichas/config.yaml")
    }

    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.db {
            Some(p) => Ok(fichas_core::paths::database_path(&self.root, p)),
            None => Ok(self.config()?.database_path(&self.root)),
        }
    }

    pub fn open_store(&self) -> anyhow::Result<Arc<SqliteFichaStore>> {
        let path = self.database_path()?;
        let store = SqliteFichaStore::open(&path)
            .with_context(|| format!("failed to open ficha store at {}", path.display()))?;
        Ok(Arc::new(store))
    }
}

pub(crate) fn display_opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

pub(crate) fn rel(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
