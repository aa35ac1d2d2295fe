use std::path::PathBuf;

use directories::ProjectDirs;

const DATA_DIR_ENV: &str = "HOUSEHOLD_DATA_DIR";

/// Directory holding the SQLite database and uploaded photos.
///
/// `HOUSEHOLD_DATA_DIR` wins; otherwise the platform data directory, and as a
/// last resort `./data` relative to the working directory.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return PathBuf::from("dev_data");
    }

    ProjectDirs::from("app", "household", "household")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn database_path() -> PathBuf {
    data_dir().join("db.sqlite")
}

pub fn photos_dir() -> PathBuf {
    data_dir().join("photos")
}
