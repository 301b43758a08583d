use std::collections::HashSet;
use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::{is_binary_file, Result};

/// Names and globs that are always excluded, for files and directories alike
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // === VERSION CONTROL ===
    ".git", ".svn", ".hg", ".bzr",
    // === DEPENDENCIES ===
    "node_modules", "bower_components", "vendor",
    // === PYTHON ===
    "__pycache__", "*.pyc", "*.pyo", "*.pyd", ".Python",
    "venv", ".venv", "env", ".env", "ENV",
    "*.egg-info", ".pytest_cache",
    // === BUILD OUTPUT ===
    "dist", "build",
    // === IDE ===
    ".idea", ".vscode", ".vs", "*.swp", "*.swo", "*~",
    // === SYSTEM ===
    ".DS_Store", "Thumbs.db", "desktop.ini",
    // === BINARIES ===
    "*.o", "*.so", "*.dylib", "*.dll", "*.exe",
    // === LOGS ===
    "*.log", "logs",
    // === BACKUPS ===
    ".verctrl_backups", "*.bak", "*.backup", "*.old",
    // === TEMP & CACHES ===
    "tmp", "temp", ".tmp", ".cache",
];

/// Patterns read from a gitignore-style file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreFile {
    /// Patterns applied to files and directories
    pub patterns: Vec<String>,
    /// Patterns written with a trailing `/`, applied to directories only.
    /// Stored without the slash.
    pub dir_patterns: Vec<String>,
    /// `!` lines. Parsed and kept, but never applied.
    pub negations: Vec<String>,
}

impl IgnoreFile {
    /// Load an ignore file. A missing file yields no patterns; an
    /// unreadable one is reported and also yields no patterns.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No ignore file at {}", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Self {
        let mut ignore = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('!') {
                ignore.negations.push(line.to_string());
            } else if let Some(dir) = line.strip_suffix('/') {
                ignore.dir_patterns.push(dir.to_string());
            } else {
                ignore.patterns.push(line.to_string());
            }
        }

        if !ignore.negations.is_empty() {
            warn!(
                "{} negation pattern(s) are not supported and will be ignored",
                ignore.negations.len()
            );
        }

        ignore
    }
}

/// The complete exclusion rule set of one detection run
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    names: HashSet<&'static str>,
    name_globs: GlobSet,
    ignore: GlobSet,
    ignore_dirs: GlobSet,
    negations: Vec<String>,
}

impl ExclusionRules {
    /// Build the rules from [`DEFAULT_EXCLUDES`] plus `ignore`.
    /// Ignore lines that are not valid globs are reported and skipped.
    pub fn new(ignore: IgnoreFile) -> Result<Self> {
        let (globs, names): (Vec<&'static str>, Vec<&'static str>) =
            DEFAULT_EXCLUDES.iter().copied().partition(|p| is_glob(p));

        Ok(Self {
            names: names.into_iter().collect(),
            name_globs: build_globset(&globs)?,
            ignore: build_lenient_globset(&ignore.patterns)?,
            ignore_dirs: build_lenient_globset(&ignore.dir_patterns)?,
            negations: ignore.negations,
        })
    }

    /// Only the built-in defaults
    pub fn defaults() -> Result<Self> {
        Self::new(IgnoreFile::default())
    }

    /// Negation lines seen in the ignore file (never applied)
    pub fn negations(&self) -> &[String] {
        &self.negations
    }

    /// Whether a directory (and so its whole subtree) is excluded.
    /// `rel` is the `/`-separated path below the detection root.
    pub fn excludes_dir(&self, rel: &str, name: &str) -> bool {
        self.matches_default(name)
            || name.starts_with('.')
            || self.ignore_dirs.is_match(rel)
            || self.ignore_dirs.is_match(name)
            || self.matches_ignore(rel, name)
    }

    /// Whether a file is excluded by name, ignore pattern, or binary extension
    pub fn excludes_file(&self, rel: &str, name: &str) -> bool {
        self.matches_default(name) || self.matches_ignore(rel, name) || has_binary_extension(name)
    }

    fn matches_default(&self, name: &str) -> bool {
        self.names.contains(name) || self.name_globs.is_match(name)
    }

    fn matches_ignore(&self, rel: &str, name: &str) -> bool {
        self.ignore.is_match(rel)
            || self.ignore.is_match(name)
            || rel.split('/').any(|segment| self.ignore.is_match(segment))
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn has_binary_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(is_binary_file)
        .unwrap_or(false)
}

/// Build a GlobSet from a slice of pattern strings
pub fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Like [`build_globset`], but skips patterns that fail to compile
fn build_lenient_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!("Skipping ignore pattern '{}': {}", pattern, e),
        }
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VerctrlError;
    use tempfile::TempDir;

    #[test]
    fn test_parse_ignore_file() {
        let ignore = IgnoreFile::parse(
            "# comment\n\n*.tmp\n  secrets.json  \nout/\n!keep.tmp\n",
        );

        assert_eq!(ignore.patterns, vec!["*.tmp", "secrets.json"]);
        assert_eq!(ignore.dir_patterns, vec!["out"]);
        assert_eq!(ignore.negations, vec!["!keep.tmp"]);
    }

    #[test]
    fn test_load_missing_ignore_file() {
        let dir = TempDir::new().unwrap();
        let ignore = IgnoreFile::load(&dir.path().join(".gitignore"));
        assert_eq!(ignore, IgnoreFile::default());
    }

    #[test]
    fn test_load_unreadable_ignore_file() {
        // A directory where the file should be cannot be read as text
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitignore");
        fs::create_dir(&path).unwrap();

        assert_eq!(IgnoreFile::load(&path), IgnoreFile::default());
    }

    #[test]
    fn test_default_excludes_by_name() {
        let rules = ExclusionRules::defaults().unwrap();

        assert!(rules.excludes_dir("node_modules", "node_modules"));
        assert!(rules.excludes_dir("src/vendor", "vendor"));
        assert!(rules.excludes_dir("build", "build"));
        assert!(!rules.excludes_dir("src", "src"));

        assert!(rules.excludes_file("Thumbs.db", "Thumbs.db"));
        assert!(rules.excludes_file("notes.txt.bak", "notes.txt.bak"));
        assert!(rules.excludes_file("src/mod.pyc", "mod.pyc"));
        assert!(rules.excludes_file("trace~", "trace~"));
        assert!(!rules.excludes_file("src/app.py", "app.py"));
    }

    #[test]
    fn test_hidden_directories_are_excluded() {
        let rules = ExclusionRules::defaults().unwrap();

        assert!(rules.excludes_dir(".github", ".github"));
        assert!(rules.excludes_dir("src/.hidden", ".hidden"));
        assert!(!rules.excludes_file(".editorconfig", ".editorconfig"));
    }

    #[test]
    fn test_binary_extensions_are_excluded() {
        let rules = ExclusionRules::defaults().unwrap();

        assert!(rules.excludes_file("assets/logo.png", "logo.png"));
        assert!(rules.excludes_file("docs/Manual.PDF", "Manual.PDF"));
        assert!(!rules.excludes_file("docs/manual.md", "manual.md"));
    }

    #[test]
    fn test_ignore_patterns_match_path_name_and_segments() {
        let ignore = IgnoreFile::parse("*.tmp\ngenerated\nsrc/legacy/*\n");
        let rules = ExclusionRules::new(ignore).unwrap();

        // bare file name
        assert!(rules.excludes_file("a/b/scratch.tmp", "scratch.tmp"));
        // single segment at any depth
        assert!(rules.excludes_dir("a/generated", "generated"));
        assert!(rules.excludes_file("a/generated/x.rs", "x.rs"));
        // full relative path
        assert!(rules.excludes_file("src/legacy/old.rs", "old.rs"));
        assert!(!rules.excludes_file("src/current/new.rs", "new.rs"));
    }

    #[test]
    fn test_trailing_slash_matches_directories_only() {
        let ignore = IgnoreFile::parse("out/\n");
        let rules = ExclusionRules::new(ignore).unwrap();

        assert!(rules.excludes_dir("out", "out"));
        assert!(rules.excludes_dir("web/out", "out"));
        assert!(!rules.excludes_file("out", "out"));
    }

    #[test]
    fn test_negations_are_never_applied() {
        let ignore = IgnoreFile::parse("*.tmp\n!keep.tmp\n");
        let rules = ExclusionRules::new(ignore).unwrap();

        assert_eq!(rules.negations(), &["!keep.tmp".to_string()]);
        assert!(rules.excludes_file("keep.tmp", "keep.tmp"));
    }

    #[test]
    fn test_invalid_ignore_pattern_is_skipped() {
        let ignore = IgnoreFile::parse("[unclosed\n*.tmp\n");
        let rules = ExclusionRules::new(ignore).unwrap();

        assert!(rules.excludes_file("x.tmp", "x.tmp"));
        assert!(!rules.excludes_file("x.rs", "x.rs"));
    }

    #[test]
    fn test_build_globset_star_crosses_directories() {
        let globset = build_globset(&["*.pyc", "*.egg-info", "*.swp"]).unwrap();

        assert!(globset.is_match("module.pyc"));
        assert!(globset.is_match("pkg/__cache__/module.pyc"));
        assert!(globset.is_match("mylib.egg-info"));
        assert!(!globset.is_match("app.py"));

        assert!(matches!(
            build_globset(&["[unclosed"]),
            Err(VerctrlError::InvalidPattern(_))
        ));
    }
}
