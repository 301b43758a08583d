use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::naming::NamingScheme;
use crate::{Result, VerctrlError};

/// Default config file name in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "verctrl.json";

/// Default backup directory, relative to the working directory
pub const DEFAULT_BACKUP_DIR: &str = ".verctrl_backups";

/// Default number of artifacts kept per tracked file
pub const DEFAULT_KEEP_HISTORY: i64 = 5;

/// Persisted verctrl configuration (`verctrl.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tracked files, relative to the working directory
    pub files: Vec<String>,
    /// Directory that receives backup artifacts
    pub backup_dir: PathBuf,
    /// One of `version`, `timestamp`, `simple`.
    /// Kept as a string so a bad value only fails when a backup runs.
    pub naming_scheme: String,
    /// Artifacts kept per tracked file; `<= 0` disables rotation
    #[serde(default = "default_keep_history")]
    pub keep_history: i64,
    /// Truncate the original after a successful backup
    #[serde(default)]
    pub create_new_file: bool,
}

fn default_keep_history() -> i64 {
    DEFAULT_KEEP_HISTORY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files: vec![],
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            naming_scheme: NamingScheme::Version.as_str().to_string(),
            keep_history: DEFAULT_KEEP_HISTORY,
            create_new_file: false,
        }
    }
}

impl Config {
    /// Load a config file. A missing file, malformed JSON or a missing
    /// required key are all errors.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VerctrlError::ConfigNotFound(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| VerctrlError::Config(format!("{}: {}", path.display(), e)))?;

        debug!(
            "Loaded config {} ({} tracked files)",
            path.display(),
            config.files.len()
        );
        Ok(config)
    }

    /// Write the config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the configured naming scheme
    pub fn scheme(&self) -> Result<NamingScheme> {
        self.naming_scheme.parse()
    }

    /// Backup directory resolved against `root`
    pub fn backup_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.backup_dir)
    }

    /// Union `files` into the tracked set. Returns the number of new entries.
    pub fn merge_files<I, S>(&mut self, files: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = self.files.drain(..).collect();
        let before = set.len();
        set.extend(files.into_iter().map(Into::into));
        let added = set.len() - before;
        self.files = set.into_iter().collect();
        added
    }

    /// Replace the tracked set with `files`
    pub fn replace_files<I, S>(&mut self, files: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = files.into_iter().map(Into::into).collect();
        self.files = set.into_iter().collect();
    }
}
