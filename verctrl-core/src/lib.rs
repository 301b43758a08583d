//! verctrl - Lightweight file-level version backups
//!
//! Copies tracked files into a backup directory under a naming scheme,
//! prunes old backups beyond a retention count, and detects which files
//! in a project are worth tracking.

pub mod backup;
pub mod config;
pub mod error;
pub mod naming;
pub mod rotation;
pub mod scanner;
pub mod stats;

pub use backup::{
    backup_all, backup_with_config, list_backups, restore, restore_target, BackupEntry,
    BackupRecord, BackupReport,
};
pub use config::{Config, DEFAULT_BACKUP_DIR, DEFAULT_CONFIG_FILE};
pub use error::{Result, VerctrlError};
pub use naming::{next_backup_name, next_backup_name_at, ArtifactName, ArtifactTag, NamingScheme};
pub use rotation::{artifacts_for, rotate, RotationReport};
pub use scanner::{Category, DetectionStrategy, ExclusionRules, FileDetector, IgnoreFile, Language};
pub use stats::{BackupStats, Stats};

/// Source code, markup, config and script extensions
pub const SOURCE_EXTENSIONS: &[&str] = &[
    // Code
    "py", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "h", "hpp",
    "cs", "go", "rs", "rb", "php", "swift", "kt", "scala",
    // Web
    "html", "css", "scss", "sass", "less", "vue", "svelte",
    // Config
    "json", "yaml", "yml", "toml", "ini", "conf", "config",
    // Docs
    "md", "rst", "txt", "adoc",
    // Scripts
    "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd",
    // Schemas
    "sql", "graphql", "proto",
];

/// Binary and media extensions that are never tracked
pub const BINARY_EXTENSIONS: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "svg",
    // Video
    "mp4", "avi", "mov", "wmv", "flv",
    // Audio
    "mp3", "wav", "ogg", "flac",
    // Archives
    "zip", "tar", "gz", "rar", "7z",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
];

/// Check if a file extension is a source code extension
pub fn is_source_file(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Check if a file extension is a binary/media extension
pub fn is_binary_file(ext: &str) -> bool {
    BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("py"));
        assert!(is_source_file("PY"));
        assert!(is_source_file("rs"));
        assert!(is_source_file("proto"));
        assert!(is_source_file("toml"));
    }

    #[test]
    fn test_is_source_file_unsupported() {
        assert!(!is_source_file("exe"));
        assert!(!is_source_file("png"));
        assert!(!is_source_file("lock"));
        assert!(!is_source_file(""));
    }

    #[test]
    fn test_is_binary_file() {
        assert!(is_binary_file("png"));
        assert!(is_binary_file("JPG"));
        assert!(is_binary_file("svg"));
        assert!(is_binary_file("pdf"));
        assert!(!is_binary_file("rs"));
    }

    #[test]
    fn test_tables_are_disjoint() {
        for ext in SOURCE_EXTENSIONS {
            assert!(!BINARY_EXTENSIONS.contains(ext), "{} is in both tables", ext);
        }
    }
}
