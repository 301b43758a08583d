//! Smart file detection for verctrl
//!
//! Provides:
//! - A fixed default-exclude set plus gitignore-style ignore patterns
//! - Detection strategies (source, recent, language, category, all)
//! - A single pre-order walk that prunes excluded directories

mod detector;
mod ignore;
mod strategy;

pub use detector::FileDetector;
pub use ignore::{build_globset, ExclusionRules, IgnoreFile, DEFAULT_EXCLUDES};
pub use strategy::{
    Category, DetectionStrategy, Language, CONFIG_EXTENSIONS, DOCS_EXTENSIONS, WEB_EXTENSIONS,
};
