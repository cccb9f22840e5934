// Filesystem locations that do not come from config.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Directory for `homeroom.log`: the platform data directory when one can be
/// determined, else `./logs`.
pub fn log_dir() -> PathBuf {
    match ProjectDirs::from("", "", "homeroom") {
        Some(dirs) => dirs.data_dir().join("logs"),
        None => PathBuf::from("logs"),
    }
}
