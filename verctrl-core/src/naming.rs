//! Backup artifact naming
//!
//! Artifacts live flat in the backup directory and are named after the
//! tracked file's stem and suffix:
//!
//! ```text
//! note.txt  --version-->    note-v3.txt
//!           --timestamp-->  note-20240131-094500.txt
//!           --simple-->     note-old.txt
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime};
use glob::Pattern;
use tracing::debug;

use crate::{Result, VerctrlError};

/// chrono format of the timestamp tag (second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Length of a rendered timestamp tag, e.g. `20240131-094500`
const TIMESTAMP_LEN: usize = 15;

/// How the next artifact of a tracked file is named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingScheme {
    /// `<stem>-v<N><suffix>`, N one past the highest existing version
    Version,
    /// `<stem>-<YYYYMMDD-HHMMSS><suffix>` in local time
    Timestamp,
    /// `<stem>-old<suffix>`, overwritten by every backup
    Simple,
}

impl NamingScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingScheme::Version => "version",
            NamingScheme::Timestamp => "timestamp",
            NamingScheme::Simple => "simple",
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingScheme {
    type Err = VerctrlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "version" => Ok(NamingScheme::Version),
            "timestamp" => Ok(NamingScheme::Timestamp),
            "simple" => Ok(NamingScheme::Simple),
            other => Err(VerctrlError::UnknownNamingScheme(other.to_string())),
        }
    }
}

/// The scheme-specific middle part of an artifact name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactTag {
    Version(u64),
    Timestamp(NaiveDateTime),
    Old,
}

impl fmt::Display for ArtifactTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactTag::Version(n) => write!(f, "v{}", n),
            ArtifactTag::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            ArtifactTag::Old => f.write_str("old"),
        }
    }
}

/// A backup artifact file name split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub stem: String,
    pub tag: ArtifactTag,
    /// Includes the leading dot, empty for extensionless files
    pub suffix: String,
}

impl ArtifactName {
    pub fn new(tracked: &Path, tag: ArtifactTag) -> Self {
        let (stem, suffix) = split_name(tracked);
        Self { stem, tag, suffix }
    }

    /// Recover stem, tag and suffix from an artifact file name.
    /// Returns `None` for names no scheme could have produced.
    pub fn parse(name: &str) -> Option<Self> {
        let (rest, suffix) = split_name(Path::new(name));

        if let Some((stem, ts)) = split_timestamp(&rest) {
            return Some(Self {
                stem: stem.to_string(),
                tag: ArtifactTag::Timestamp(ts),
                suffix,
            });
        }

        let (stem, tag) = rest.rsplit_once('-')?;
        if stem.is_empty() {
            return None;
        }

        let tag = if tag == "old" {
            ArtifactTag::Old
        } else {
            let digits = tag.strip_prefix('v')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            ArtifactTag::Version(digits.parse().ok()?)
        };

        Some(Self {
            stem: stem.to_string(),
            tag,
            suffix,
        })
    }

    /// Whether this artifact was produced from `tracked`
    pub fn belongs_to(&self, tracked: &Path) -> bool {
        let (stem, suffix) = split_name(tracked);
        self.stem == stem && self.suffix == suffix
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.stem, self.tag, self.suffix)
    }
}

fn split_timestamp(rest: &str) -> Option<(&str, NaiveDateTime)> {
    let split = rest.len().checked_sub(TIMESTAMP_LEN + 1)?;
    if split == 0 || rest.as_bytes()[split] != b'-' {
        return None;
    }
    let stem = rest.get(..split)?;
    let ts = NaiveDateTime::parse_from_str(rest.get(split + 1..)?, TIMESTAMP_FORMAT).ok()?;
    Some((stem, ts))
}

/// Split a file name into stem and suffix (`note.txt` -> `note`, `.txt`)
pub(crate) fn split_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, suffix)
}

/// Glob matching every artifact of a tracked file, whatever the scheme.
/// Stem and suffix are escaped so `[`, `*` and `?` in names match literally.
pub(crate) fn family_pattern(tracked: &Path) -> Result<Pattern> {
    let (stem, suffix) = split_name(tracked);
    let pattern = format!("{}-*{}", Pattern::escape(&stem), Pattern::escape(&suffix));
    Ok(Pattern::new(&pattern)?)
}

/// Order two artifact names by the backup they record, older first.
/// Versions compare numerically and timestamps chronologically; anything
/// else falls back to the name.
pub(crate) fn cmp_recency(a: &str, b: &str) -> Ordering {
    let tag = |name: &str| ArtifactName::parse(name).map(|n| n.tag);

    let by_tag = match (tag(a), tag(b)) {
        (Some(ArtifactTag::Version(x)), Some(ArtifactTag::Version(y))) => x.cmp(&y),
        (Some(ArtifactTag::Timestamp(x)), Some(ArtifactTag::Timestamp(y))) => x.cmp(&y),
        _ => Ordering::Equal,
    };
    by_tag.then_with(|| a.cmp(b))
}

/// Compute where the next backup of `tracked` goes
pub fn next_backup_name(
    tracked: &Path,
    backup_dir: &Path,
    scheme: NamingScheme,
) -> Result<PathBuf> {
    next_backup_name_at(tracked, backup_dir, scheme, Local::now())
}

/// [`next_backup_name`] with an explicit clock for the timestamp scheme
pub fn next_backup_name_at(
    tracked: &Path,
    backup_dir: &Path,
    scheme: NamingScheme,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let tag = match scheme {
        NamingScheme::Version => ArtifactTag::Version(next_version(tracked, backup_dir)?),
        NamingScheme::Timestamp => ArtifactTag::Timestamp(now.naive_local()),
        NamingScheme::Simple => ArtifactTag::Old,
    };

    let name = ArtifactName::new(tracked, tag);
    Ok(backup_dir.join(name.to_string()))
}

fn next_version(tracked: &Path, backup_dir: &Path) -> Result<u64> {
    if !backup_dir.is_dir() {
        return Ok(1);
    }

    let (stem, suffix) = split_name(tracked);
    let pattern = Pattern::new(&format!(
        "{}-v*{}",
        Pattern::escape(&stem),
        Pattern::escape(&suffix)
    ))?;

    let mut highest = 0;
    for entry in fs::read_dir(backup_dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if !pattern.matches(&name) {
            continue;
        }

        match ArtifactName::parse(&name) {
            Some(ArtifactName {
                stem: s,
                tag: ArtifactTag::Version(n),
                suffix: x,
            }) if s == stem && x == suffix => highest = highest.max(n),
            _ => debug!("Ignoring {} while numbering {}", name, tracked.display()),
        }
    }

    Ok(highest + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).unwrap();
    }

    fn next(tracked: &str, dir: &Path, scheme: NamingScheme) -> PathBuf {
        next_backup_name(Path::new(tracked), dir, scheme).unwrap()
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!("version".parse::<NamingScheme>().unwrap(), NamingScheme::Version);
        assert_eq!("timestamp".parse::<NamingScheme>().unwrap(), NamingScheme::Timestamp);
        assert_eq!("simple".parse::<NamingScheme>().unwrap(), NamingScheme::Simple);
        assert!(matches!(
            "bogus".parse::<NamingScheme>(),
            Err(VerctrlError::UnknownNamingScheme(_))
        ));
        assert!("Version".parse::<NamingScheme>().is_err());
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name(Path::new("note.txt")), ("note".into(), ".txt".into()));
        assert_eq!(split_name(Path::new("src/app.py")), ("app".into(), ".py".into()));
        assert_eq!(split_name(Path::new("a.tar.gz")), ("a.tar".into(), ".gz".into()));
        assert_eq!(split_name(Path::new("Makefile")), ("Makefile".into(), "".into()));
        assert_eq!(split_name(Path::new(".bashrc")), (".bashrc".into(), "".into()));
    }

    #[test]
    fn test_version_continues_from_existing() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "note-v1.txt");
        touch(dir.path(), "note-v2.txt");

        let name = next("note.txt", dir.path(), NamingScheme::Version);
        assert_eq!(name, dir.path().join("note-v3.txt"));
    }

    #[test]
    fn test_version_starts_at_one() {
        let dir = TempDir::new().unwrap();
        let name = next("note.txt", dir.path(), NamingScheme::Version);
        assert_eq!(name, dir.path().join("note-v1.txt"));

        let missing = dir.path().join("not-there");
        let name = next("note.txt", &missing, NamingScheme::Version);
        assert_eq!(name, missing.join("note-v1.txt"));
    }

    #[test]
    fn test_version_uses_numeric_maximum() {
        let dir = TempDir::new().unwrap();
        for name in ["note-v10.txt", "note-v2.txt", "note-v9.txt"] {
            touch(dir.path(), name);
        }

        let name = next("note.txt", dir.path(), NamingScheme::Version);
        assert_eq!(name, dir.path().join("note-v11.txt"));
    }

    #[test]
    fn test_version_ignores_other_families() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "note-v7.md");
        touch(dir.path(), "note-book-v4.txt");
        touch(dir.path(), "note-vx.txt");
        touch(dir.path(), "note-old.txt");

        let name = next("note.txt", dir.path(), NamingScheme::Version);
        assert_eq!(name, dir.path().join("note-v1.txt"));
    }

    #[test]
    fn test_version_escapes_glob_characters() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "data[1]-v4.csv");
        touch(dir.path(), "data1-v9.csv");

        let name = next("data[1].csv", dir.path(), NamingScheme::Version);
        assert_eq!(name, dir.path().join("data[1]-v5.csv"));
    }

    #[test]
    fn test_timestamp_name() {
        let dir = TempDir::new().unwrap();
        let now = Local.with_ymd_and_hms(2024, 1, 31, 9, 45, 0).unwrap();

        let tracked = Path::new("note.txt");
        let name = next_backup_name_at(tracked, dir.path(), NamingScheme::Timestamp, now).unwrap();
        assert_eq!(name, dir.path().join("note-20240131-094500.txt"));
    }

    #[test]
    fn test_simple_name() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "note-old.txt");

        let name = next("note.txt", dir.path(), NamingScheme::Simple);
        assert_eq!(name, dir.path().join("note-old.txt"));
    }

    #[test]
    fn test_parse_artifact_names() {
        let v = ArtifactName::parse("my-note-v12.txt").unwrap();
        assert_eq!(v.stem, "my-note");
        assert_eq!(v.tag, ArtifactTag::Version(12));
        assert_eq!(v.suffix, ".txt");

        let t = ArtifactName::parse("note-20240131-094500.txt").unwrap();
        assert_eq!(t.stem, "note");
        assert!(matches!(t.tag, ArtifactTag::Timestamp(_)));
        assert_eq!(t.to_string(), "note-20240131-094500.txt");

        let o = ArtifactName::parse("Makefile-old").unwrap();
        assert_eq!(o.stem, "Makefile");
        assert_eq!(o.tag, ArtifactTag::Old);
        assert_eq!(o.suffix, "");

        let gz = ArtifactName::parse("a.tar-v1.gz").unwrap();
        assert!(gz.belongs_to(Path::new("dist/a.tar.gz")));
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert!(ArtifactName::parse("README.md").is_none());
        assert!(ArtifactName::parse("note-vx.txt").is_none());
        assert!(ArtifactName::parse("note-v.txt").is_none());
        assert!(ArtifactName::parse("-v1.txt").is_none());
    }

    #[test]
    fn test_cmp_recency() {
        assert_eq!(cmp_recency("note-v9.txt", "note-v10.txt"), Ordering::Less);
        assert_eq!(cmp_recency("note-v3.txt", "note-v2.txt"), Ordering::Greater);
        assert_eq!(
            cmp_recency("note-20240131-094500.txt", "note-20231231-235959.txt"),
            Ordering::Greater
        );
        assert_eq!(cmp_recency("note-old.txt", "note-old.txt"), Ordering::Equal);
        assert_eq!(cmp_recency("a.txt", "b.txt"), Ordering::Less);
    }

    #[test]
    fn test_family_pattern_is_scheme_agnostic() {
        let pattern = family_pattern(Path::new("note.txt")).unwrap();
        assert!(pattern.matches("note-v1.txt"));
        assert!(pattern.matches("note-20240131-094500.txt"));
        assert!(pattern.matches("note-old.txt"));
        assert!(!pattern.matches("note-v1.md"));
        assert!(!pattern.matches("notes-v1.txt"));
    }
}
