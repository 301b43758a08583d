//! Backup, listing and restore of tracked files

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::{debug, error, warn};

use crate::naming::{cmp_recency, next_backup_name, ArtifactName, NamingScheme};
use crate::{Config, Result, VerctrlError};

/// One successfully backed up file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// Tracked path as written in the config
    pub source: String,
    pub artifact: PathBuf,
    pub bytes: u64,
    /// The original was emptied after the copy
    pub truncated: bool,
}

/// Outcome of a backup run
#[derive(Debug, Clone, Default)]
pub struct BackupReport {
    pub backed_up: Vec<BackupRecord>,
    /// Tracked files that did not exist
    pub missing: Vec<String>,
    /// Tracked files whose copy failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl BackupReport {
    pub fn is_empty(&self) -> bool {
        self.backed_up.is_empty()
    }
}

/// Back up every tracked file into `backup_dir`.
///
/// `files` are resolved against `root`. Missing files and failed copies are
/// reported and skipped; only a backup directory that cannot be created is
/// an error. With `create_empty_replacement`, each original is truncated
/// once its copy has succeeded.
pub fn backup_all(
    root: &Path,
    files: &[String],
    backup_dir: &Path,
    scheme: NamingScheme,
    create_empty_replacement: bool,
) -> Result<BackupReport> {
    fs::create_dir_all(backup_dir)?;

    let mut report = BackupReport::default();

    for file in files {
        let source = root.join(file);
        if !source.exists() {
            warn!("File not found: {}", file);
            report.missing.push(file.clone());
            continue;
        }

        match backup_one(file, &source, backup_dir, scheme, create_empty_replacement) {
            Ok(record) => report.backed_up.push(record),
            Err(e) => {
                error!("Failed to backup {}: {}", file, e);
                report.failed.push((file.clone(), e.to_string()));
            }
        }
    }

    if report.is_empty() {
        warn!("No files were backed up");
    }

    Ok(report)
}

/// Back up the files tracked by `config`, relative to `root`.
/// The naming scheme is resolved first, so an unknown scheme fails before
/// the backup directory is created or anything is copied.
pub fn backup_with_config(root: &Path, config: &Config) -> Result<BackupReport> {
    let scheme = config.scheme()?;
    backup_all(
        root,
        &config.files,
        &config.backup_dir_in(root),
        scheme,
        config.create_new_file,
    )
}

fn backup_one(
    file: &str,
    source: &Path,
    backup_dir: &Path,
    scheme: NamingScheme,
    create_empty_replacement: bool,
) -> Result<BackupRecord> {
    let artifact = next_backup_name(Path::new(file), backup_dir, scheme)?;
    let bytes = copy_preserving_times(source, &artifact)?;
    debug!("Backed up: {} -> {} ({} bytes)", file, display_name(&artifact), bytes);

    let mut truncated = false;
    if create_empty_replacement {
        match File::create(source) {
            Ok(_) => {
                debug!("Created new empty file: {}", file);
                truncated = true;
            }
            Err(e) => error!("Backed up {} but could not empty it: {}", file, e),
        }
    }

    Ok(BackupRecord {
        source: file.to_string(),
        artifact,
        bytes,
        truncated,
    })
}

/// Copy contents and permissions, then carry over access/modification times
fn copy_preserving_times(from: &Path, to: &Path) -> Result<u64> {
    let metadata = fs::metadata(from)?;
    let bytes = fs::copy(from, to)?;

    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    // read-only copies still accept new times from their owner
    let dest = File::options()
        .write(true)
        .open(to)
        .or_else(|_| File::open(to))?;
    dest.set_times(times)?;

    Ok(bytes)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A file in the backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl BackupEntry {
    pub fn modified_local(&self) -> DateTime<Local> {
        DateTime::<Local>::from(self.modified)
    }

    /// Stem, tag and suffix, if a naming scheme produced this name
    pub fn artifact_name(&self) -> Option<ArtifactName> {
        ArtifactName::parse(&self.name)
    }
}

/// All regular files in `backup_dir`, newest first
pub fn list_backups(backup_dir: &Path) -> Result<Vec<BackupEntry>> {
    if !backup_dir.is_dir() {
        return Err(VerctrlError::BackupDirMissing(backup_dir.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let entry = entry?;
        let metadata = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        entries.push(BackupEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    entries.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| cmp_recency(&b.name, &a.name))
    });
    Ok(entries)
}

/// The tracked file an artifact was made from: the first entry of
/// `files` whose stem and suffix the artifact name carries.
pub fn restore_target<'a>(backup_name: &str, files: &'a [String]) -> Option<&'a str> {
    let artifact = ArtifactName::parse(backup_name)?;
    let target = files
        .iter()
        .find(|f| artifact.belongs_to(Path::new(f.as_str())))
        .map(String::as_str);

    debug!("Restore target for {}: {:?}", backup_name, target);
    target
}

/// Copy artifact `backup_name` from `backup_dir` over `target`.
/// Returns the number of bytes restored.
pub fn restore(backup_dir: &Path, backup_name: &str, target: &Path) -> Result<u64> {
    let bare = Path::new(backup_name).file_name().and_then(|n| n.to_str());
    if bare != Some(backup_name) {
        return Err(VerctrlError::BackupNotFound(backup_name.to_string()));
    }

    let artifact = backup_dir.join(backup_name);
    if !artifact.is_file() {
        return Err(VerctrlError::BackupNotFound(backup_name.to_string()));
    }

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = copy_preserving_times(&artifact, target)?;
    debug!("Restored: {} -> {}", backup_name, target.display());
    Ok(bytes)
}
