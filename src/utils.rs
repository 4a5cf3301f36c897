use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{fs, path::Path, path::PathBuf};
use tracing::warn;

pub const DATA_DIR_ENV: &str = "JAZZ_NYC_DATA_DIR";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let root = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => data_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("jazz-nyc"),
    };
    if let Err(err) = fs::create_dir_all(&root) {
        warn!("failed to create data root {:?}: {err}", root);
    }
    root
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn database_path() -> PathBuf {
    data_root().join("jazz-nyc.sqlite")
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() {
            return;
        }
        if let Err(err) = fs::create_dir_all(parent) {
            warn!("failed to create parent {:?}: {err}", parent);
        }
    }
}

/// Collapse runs of whitespace into single spaces.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
