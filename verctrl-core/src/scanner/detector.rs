use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::ignore::ExclusionRules;
use super::strategy::DetectionStrategy;
use crate::Result;

/// Walks a project tree and proposes files to track
///
/// Excluded directories are pruned during the walk, so nothing below
/// them is ever visited. The root itself is never excluded.
pub struct FileDetector {
    root: PathBuf,
    rules: ExclusionRules,
}

impl FileDetector {
    pub fn new(root: impl Into<PathBuf>, rules: ExclusionRules) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorted, `/`-separated paths relative to the root
    pub fn detect(&self, strategy: &DetectionStrategy) -> Result<Vec<String>> {
        self.detect_at(strategy, SystemTime::now())
    }

    /// [`detect`](Self::detect) with an explicit clock for recency
    pub fn detect_at(&self, strategy: &DetectionStrategy, now: SystemTime) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )
            .into());
        }

        let mut detected = BTreeSet::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.prune(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            // symlinks count when they resolve to a regular file
            let file_type = entry.file_type();
            if !(file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())) {
                continue;
            }

            let Some(rel) = self.relative(entry.path()) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy();

            if self.rules.excludes_file(&rel, &name) {
                debug!("Excluded file: {}", rel);
                continue;
            }

            let modified = || fs::metadata(entry.path()).ok().and_then(|m| m.modified().ok());
            if strategy.accepts(entry.path(), modified, now) {
                detected.insert(rel);
            }
        }

        Ok(detected.into_iter().collect())
    }

    fn prune(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }

        let Some(rel) = self.relative(entry.path()) else {
            return false;
        };
        let name = entry.file_name().to_string_lossy();

        let excluded = self.rules.excludes_dir(&rel, &name);
        if excluded {
            debug!("Excluded directory: {}/", rel);
        }
        excluded
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    #[test]
    fn test_relative_paths_use_forward_slashes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/b/c.txt");

        let detector = FileDetector::new(dir.path(), ExclusionRules::defaults().unwrap());
        let files = detector.detect(&DetectionStrategy::Unfiltered).unwrap();
        assert_eq!(files, vec!["a/b/c.txt"]);
    }

    #[test]
    fn test_hidden_root_is_not_pruned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join(".project");
        write(&root, "main.rs");

        let detector = FileDetector::new(&root, ExclusionRules::defaults().unwrap());
        assert_eq!(detector.detect(&DetectionStrategy::AnySource).unwrap(), vec!["main.rs"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRules::defaults().unwrap();
        let detector = FileDetector::new(dir.path().join("nope"), rules);
        assert!(detector.detect(&DetectionStrategy::Unfiltered).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_symlinks_are_reported() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "real/lib.rs");
        symlink(dir.path().join("real/lib.rs"), dir.path().join("alias.rs")).unwrap();
        symlink(dir.path().join("real"), dir.path().join("linked_dir")).unwrap();
        symlink(dir.path().join("gone.rs"), dir.path().join("dangling.rs")).unwrap();

        let detector = FileDetector::new(dir.path(), ExclusionRules::defaults().unwrap());
        let files = detector.detect(&DetectionStrategy::Unfiltered).unwrap();
        assert_eq!(files, vec!["alias.rs", "real/lib.rs"]);
    }
}
