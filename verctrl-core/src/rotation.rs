//! Retention of backup artifacts
//!
//! Every tracked file owns the family of artifacts matching
//! `<stem>-*<suffix>`, whichever scheme produced them. Only the newest
//! `keep_history` members of a family survive a rotation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::naming::{cmp_recency, family_pattern};
use crate::Result;

/// Outcome of a rotation pass
#[derive(Debug, Clone, Default)]
pub struct RotationReport {
    pub removed: Vec<PathBuf>,
    /// Artifacts that could not be deleted, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

/// Delete artifacts beyond the newest `keep_history` of each tracked file.
/// `keep_history <= 0` disables rotation.
pub fn rotate(files: &[String], backup_dir: &Path, keep_history: i64) -> Result<RotationReport> {
    let mut report = RotationReport::default();

    if keep_history <= 0 {
        debug!("Rotation disabled (keep_history = {})", keep_history);
        return Ok(report);
    }
    if !backup_dir.is_dir() {
        return Ok(report);
    }

    let keep = usize::try_from(keep_history).unwrap_or(usize::MAX);

    for file in files {
        let family = artifacts_for(Path::new(file), backup_dir)?;

        for (artifact, _) in family.into_iter().skip(keep) {
            let name = file_name(&artifact);

            match fs::remove_file(&artifact) {
                Ok(()) => {
                    debug!("Removed old backup: {}", name);
                    report.removed.push(artifact);
                }
                Err(e) => {
                    warn!("Failed to remove {}: {}", name, e);
                    report.failed.push((artifact, e.to_string()));
                }
            }
        }
    }

    Ok(report)
}

/// Artifacts of one tracked file, newest first
pub fn artifacts_for(tracked: &Path, backup_dir: &Path) -> Result<Vec<(PathBuf, SystemTime)>> {
    let pattern = family_pattern(tracked)?;
    let mut artifacts = Vec::new();

    for entry in fs::read_dir(backup_dir)? {
        let entry = entry?;
        if !pattern.matches(&entry.file_name().to_string_lossy()) {
            continue;
        }

        match entry.metadata() {
            Ok(m) if m.is_file() => {
                let modified = m.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                artifacts.push((entry.path(), modified));
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
        }
    }

    // artifacts share the source mtime when the file did not change
    artifacts.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| cmp_recency(&file_name(&b.0), &file_name(&a.0)))
    });
    Ok(artifacts)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
