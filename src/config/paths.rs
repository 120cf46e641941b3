//! Where `lingua-feedback` keeps its settings.
//!
//! The settings file is `<platform config dir>/lingua-feedback/settings.toml`,
//! resolved through `dirs::config_dir()`. A platform without a config dir
//! (some containers) gets `./lingua-feedback/settings.toml`.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "lingua-feedback";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        Self::under(&dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Layout rooted at `base` instead of the platform config dir.
    pub fn under(base: &Path) -> Self {
        let config_dir = base.join(APP_DIR);
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
