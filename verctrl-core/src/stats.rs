use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::backup::list_backups;
use crate::config::Config;
use crate::naming::split_name;
use crate::{Result, VerctrlError};

/// How many extensions the report lists
const TOP_EXTENSIONS: usize = 5;

/// Summary of tracked files and the backup directory
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub tracked: usize,
    pub existing: usize,
    pub missing: usize,
    /// Combined size of the existing tracked files
    pub tracked_bytes: u64,
    /// Most common suffixes among existing tracked files, with counts
    pub top_extensions: Vec<(String, usize)>,
    pub backup_dir: PathBuf,
    /// `None` when the backup directory does not exist yet
    pub backups: Option<BackupStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupStats {
    pub count: usize,
    pub total_bytes: u64,
    pub oldest: Option<SystemTime>,
    pub newest: Option<SystemTime>,
}

impl Stats {
    pub fn collect(root: &Path, config: &Config) -> Result<Self> {
        let mut existing = 0;
        let mut tracked_bytes = 0;
        let mut extensions: HashMap<String, usize> = HashMap::new();

        for file in &config.files {
            let path = root.join(file);
            let Ok(metadata) = path.metadata() else {
                continue;
            };

            existing += 1;
            tracked_bytes += metadata.len();

            let (_, suffix) = split_name(Path::new(file));
            let key = if suffix.is_empty() {
                "(no extension)".to_string()
            } else {
                suffix
            };
            *extensions.entry(key).or_insert(0) += 1;
        }

        let mut top_extensions: Vec<_> = extensions.into_iter().collect();
        top_extensions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_extensions.truncate(TOP_EXTENSIONS);

        let backup_dir = config.backup_dir_in(root);
        let backups = match list_backups(&backup_dir) {
            Ok(entries) => Some(BackupStats {
                count: entries.len(),
                total_bytes: entries.iter().map(|e| e.size).sum(),
                oldest: entries.iter().map(|e| e.modified).min(),
                newest: entries.iter().map(|e| e.modified).max(),
            }),
            Err(VerctrlError::BackupDirMissing(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            tracked: config.files.len(),
            existing,
            missing: config.files.len() - existing,
            tracked_bytes,
            top_extensions,
            backup_dir,
            backups,
        })
    }
}
