use std::path::{Path, PathBuf};

pub const FICHAS_DIR: &str = ".fichas";
pub const CONFIG_FILE: &str = ".fichas/config.yaml";
pub const DEFAULT_DATABASE: &str = ".fichas/fichas.db";

pub fn fichas_dir(root: &Path) -> PathBuf {
    root.join(FICHAS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured database path against the project root.
pub fn database_path(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}
