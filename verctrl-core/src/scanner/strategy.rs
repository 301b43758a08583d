use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

use crate::{is_source_file, Result, VerctrlError};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Which non-excluded files a detection run keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStrategy {
    /// Every file with a source code extension
    AllSource,
    /// Same filter as `AllSource`; the default "smart" pick
    AnySource,
    /// Files modified within the last `max_age_days` days
    RecentlyModified { max_age_days: u32 },
    /// A single language's extension, compared exactly
    LanguageFiltered(Language),
    /// An extension category such as web files
    CategoryFiltered(Category),
    /// Every non-excluded file
    Unfiltered,
}

impl DetectionStrategy {
    /// Resolve a command-line strategy name.
    /// `max_age_days` is only used by `recent`.
    pub fn from_name(name: &str, max_age_days: u32) -> Result<Self> {
        match name {
            "smart" => Ok(DetectionStrategy::AnySource),
            "source" => Ok(DetectionStrategy::AllSource),
            "recent" => Ok(DetectionStrategy::RecentlyModified { max_age_days }),
            "all" => Ok(DetectionStrategy::Unfiltered),
            other => {
                if let Ok(language) = other.parse() {
                    Ok(DetectionStrategy::LanguageFiltered(language))
                } else if let Ok(category) = other.parse() {
                    Ok(DetectionStrategy::CategoryFiltered(category))
                } else {
                    Err(VerctrlError::InvalidStrategy(other.to_string()))
                }
            }
        }
    }

    /// Positive filter for one file. `modified` is only consulted by
    /// `RecentlyModified`; `None` there means the file is excluded.
    pub fn accepts<F>(&self, path: &Path, modified: F, now: SystemTime) -> bool
    where
        F: FnOnce() -> Option<SystemTime>,
    {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match self {
            DetectionStrategy::AllSource | DetectionStrategy::AnySource => is_source_file(ext),
            DetectionStrategy::RecentlyModified { max_age_days } => match modified() {
                Some(mtime) => age_in_days(now, mtime) <= f64::from(*max_age_days),
                None => false,
            },
            DetectionStrategy::LanguageFiltered(language) => ext == language.extension(),
            DetectionStrategy::CategoryFiltered(category) => category.contains(ext),
            DetectionStrategy::Unfiltered => true,
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStrategy::AllSource => f.write_str("source"),
            DetectionStrategy::AnySource => f.write_str("smart"),
            DetectionStrategy::RecentlyModified { max_age_days } => {
                write!(f, "recent ({} days)", max_age_days)
            }
            DetectionStrategy::LanguageFiltered(language) => write!(f, "{}", language),
            DetectionStrategy::CategoryFiltered(category) => write!(f, "{}", category),
            DetectionStrategy::Unfiltered => f.write_str("all"),
        }
    }
}

/// Age in fractional days; negative for timestamps in the future
fn age_in_days(now: SystemTime, mtime: SystemTime) -> f64 {
    match now.duration_since(mtime) {
        Ok(age) => age.as_secs_f64() / SECONDS_PER_DAY,
        Err(e) => -(e.duration().as_secs_f64() / SECONDS_PER_DAY),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Rust,
    Go,
    Java,
    Ruby,
    JavaScript,
    TypeScript,
}

impl Language {
    pub const ALL: &'static [Language] = &[
        Language::Python,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::Ruby,
        Language::JavaScript,
        Language::TypeScript,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Ruby => "ruby",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    /// The language's file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Rust => "rs",
            Language::Go => "go",
            Language::Java => "java",
            Language::Ruby => "rb",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = VerctrlError;

    fn from_str(s: &str) -> Result<Self> {
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.name() == s)
            .ok_or_else(|| VerctrlError::InvalidStrategy(s.to_string()))
    }
}

/// Extensions of web front-end files
pub const WEB_EXTENSIONS: &[&str] = &["html", "css", "js", "ts", "jsx", "tsx", "vue", "svelte"];

/// Extensions of configuration files
pub const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml", "ini", "conf", "config"];

/// Extensions of documentation files
pub const DOCS_EXTENSIONS: &[&str] = &["md", "rst", "txt", "adoc"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Web,
    Config,
    Docs,
}

impl Category {
    pub const ALL: &'static [Category] = &[Category::Web, Category::Config, Category::Docs];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Web => "web",
            Category::Config => "config",
            Category::Docs => "docs",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Web => WEB_EXTENSIONS,
            Category::Config => CONFIG_EXTENSIONS,
            Category::Docs => DOCS_EXTENSIONS,
        }
    }

    /// Case-insensitive extension membership
    pub fn contains(&self, ext: &str) -> bool {
        self.extensions().contains(&ext.to_lowercase().as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = VerctrlError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| VerctrlError::InvalidStrategy(s.to_string()))
    }
}
