//! verctrl CLI - Track, back up and restore files
//!
//! Usage:
//!   verctrl init
//!   verctrl select <file>...
//!   verctrl detect <strategy> [--days N] [--ignore-file <path>]
//!   verctrl backup
//!   verctrl list
//!   verctrl restore <backup-name> [--to <path>]
//!   verctrl stats

mod prompt;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::SystemTime;
use tracing_subscriber::EnvFilter;
use verctrl_core::{
    backup_with_config, list_backups, restore, restore_target, rotate, Config, DetectionStrategy,
    ExclusionRules, FileDetector, IgnoreFile, Stats, VerctrlError, DEFAULT_CONFIG_FILE,
};

/// Exit status when the operator declines a confirmation
const EXIT_CANCELLED: u8 = 130;

/// How many detected files are listed before asking
const DETECT_PREVIEW: usize = 20;

#[derive(Parser)]
#[command(name = "verctrl")]
#[command(about = "verctrl - Lightweight file-level version backups", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default config file
    Init,

    /// Replace the tracked files with the given list
    Select {
        /// Files to track, relative to the working directory
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Detect files worth tracking and add them to the config
    ///
    /// Strategies: smart, source, recent, all, a language
    /// (python, rust, go, java, ruby, javascript, typescript)
    /// or a category (web, config, docs)
    Detect {
        /// Detection strategy
        #[arg(default_value = "smart")]
        strategy: String,

        /// Age limit in days for the `recent` strategy
        #[arg(long, default_value = "30")]
        days: u32,

        /// gitignore-style file with extra exclusions
        #[arg(long, default_value = ".gitignore")]
        ignore_file: PathBuf,
    },

    /// Back up all tracked files and prune old backups
    Backup,

    /// List all backups
    List,

    /// Restore a backup over its original file
    Restore {
        /// Backup file name, as shown by `list`
        name: String,

        /// Restore to this path instead of the tracked file
        #[arg(long)]
        to: Option<PathBuf>,
    },

    /// Show statistics about tracked files and backups
    Stats,
}

/// Result of a command that may stop at a prompt
enum Outcome {
    Done,
    Cancelled,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let root = std::env::current_dir().context("Failed to determine working directory")?;

    let outcome = match cli.command {
        Commands::Init => init_config(&cli.config, cli.yes)?,
        Commands::Select { files } => select_files(&cli.config, files)?,
        Commands::Detect { strategy, days, ignore_file } => {
            detect_files(&root, &cli.config, &strategy, days, &ignore_file, cli.yes)?
        }
        Commands::Backup => create_backup(&root, &cli.config)?,
        Commands::List => show_backups(&root, &cli.config)?,
        Commands::Restore { name, to } => restore_backup(&root, &cli.config, &name, to, cli.yes)?,
        Commands::Stats => show_stats(&root, &cli.config)?,
    };

    match outcome {
        Outcome::Done => Ok(ExitCode::SUCCESS),
        Outcome::Cancelled => Ok(ExitCode::from(EXIT_CANCELLED)),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    match Config::load(path) {
        Ok(config) => Ok(config),
        Err(VerctrlError::ConfigNotFound(_)) => Err(anyhow!(
            "Config file '{}' not found. Run 'verctrl init' to create one.",
            path.display()
        )),
        Err(e) => Err(e).context("Failed to load config"),
    }
}

fn load_or_create_config(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }

    tracing::warn!("Config file not found. Creating default config...");
    let config = Config::default();
    config.save(path).context("Failed to create config file")?;
    println!("Created config file: {}", path.display());
    Ok(config)
}

fn init_config(path: &Path, yes: bool) -> Result<Outcome> {
    if path.exists() {
        let question = format!("Config file '{}' already exists. Overwrite?", path.display());
        if !prompt::confirm(&question, yes)? {
            println!("Initialization cancelled.");
            return Ok(Outcome::Cancelled);
        }
    }

    Config::default()
        .save(path)
        .context("Failed to create config file")?;

    println!("Created config file: {}", path.display());
    println!("Run 'verctrl detect' or 'verctrl select <files>' to choose files.");
    Ok(Outcome::Done)
}

fn select_files(path: &Path, files: Vec<String>) -> Result<Outcome> {
    let mut config = load_or_create_config(path)?;
    config.replace_files(files);
    config.save(path).context("Failed to save config")?;

    println!("Updated config with {} file(s):", config.files.len());
    print_preview(&config.files, 10);
    Ok(Outcome::Done)
}

fn detect_files(
    root: &Path,
    path: &Path,
    strategy: &str,
    days: u32,
    ignore_file: &Path,
    yes: bool,
) -> Result<Outcome> {
    let strategy = DetectionStrategy::from_name(strategy, days)?;
    let mut config = load_or_create_config(path)?;

    println!("Running smart detection with strategy: {}", strategy);

    let ignore = IgnoreFile::load(&root.join(ignore_file));
    let rules = ExclusionRules::new(ignore).context("Failed to build exclusion rules")?;
    let detected = FileDetector::new(root, rules)
        .detect(&strategy)
        .context("Detection failed")?;

    if detected.is_empty() {
        tracing::warn!("No files detected with this strategy!");
        return Ok(Outcome::Done);
    }

    println!();
    println!("Detected {} file(s):", detected.len());
    print_preview(&detected, DETECT_PREVIEW);
    println!();

    let question = format!("Add these {} files to tracking?", detected.len());
    if !prompt::confirm(&question, yes)? {
        println!("Detection cancelled.");
        return Ok(Outcome::Cancelled);
    }

    let added = config.merge_files(detected);
    config.save(path).context("Failed to save config")?;

    println!();
    println!("Added {} new file(s) to tracking!", added);
    println!("Total tracked files: {}", config.files.len());
    Ok(Outcome::Done)
}

fn create_backup(root: &Path, path: &Path) -> Result<Outcome> {
    let config = load_config(path)?;

    if config.files.is_empty() {
        tracing::warn!("No files specified in config!");
        println!("Run 'verctrl detect' or 'verctrl select <files>' to choose files.");
        return Ok(Outcome::Done);
    }

    let backup_dir = config.backup_dir_in(root);
    let report = backup_with_config(root, &config).context("Backup failed")?;

    for record in &report.backed_up {
        println!(
            "Backed up: {} -> {} ({} bytes)",
            record.source,
            file_name(&record.artifact),
            record.bytes
        );
        if record.truncated {
            println!("Created new empty file: {}", record.source);
        }
    }

    if report.is_empty() {
        return Ok(Outcome::Done);
    }

    println!();
    println!("{} file(s) backed up successfully!", report.backed_up.len());

    let rotation = rotate(&config.files, &backup_dir, config.keep_history)
        .context("Failed to rotate old backups")?;
    for removed in &rotation.removed {
        println!("Removed old backup: {}", file_name(removed));
    }

    Ok(Outcome::Done)
}

fn show_backups(root: &Path, path: &Path) -> Result<Outcome> {
    let config = load_config(path)?;
    let backup_dir = config.backup_dir_in(root);

    let backups = match list_backups(&backup_dir) {
        Ok(backups) => backups,
        Err(VerctrlError::BackupDirMissing(_)) => {
            tracing::warn!("No backup directory found!");
            return Ok(Outcome::Done);
        }
        Err(e) => return Err(e).context("Failed to list backups"),
    };

    if backups.is_empty() {
        tracing::warn!("No backups found!");
        return Ok(Outcome::Done);
    }

    println!();
    println!("Backups in {}:", config.backup_dir.display());
    println!();
    println!("{:<40} {:<12} {:<20}", "Filename", "Size", "Modified");
    println!("{}", "-".repeat(75));

    for backup in &backups {
        println!(
            "{:<40} {:<12} {}",
            backup.name,
            format_size(backup.size),
            format_time(backup.modified)
        );
    }

    println!();
    println!("Total: {} backup(s)", backups.len());
    Ok(Outcome::Done)
}

fn restore_backup(
    root: &Path,
    path: &Path,
    name: &str,
    to: Option<PathBuf>,
    yes: bool,
) -> Result<Outcome> {
    let config = load_config(path)?;
    let backup_dir = config.backup_dir_in(root);

    if !backup_dir.join(name).is_file() {
        return Err(VerctrlError::BackupNotFound(name.to_string()).into());
    }

    let target = match to.or_else(|| restore_target(name, &config.files).map(PathBuf::from)) {
        Some(target) => target,
        None if yes => {
            return Err(anyhow!(
                "Could not determine original file for {}. Pass --to <path>.",
                name
            ))
        }
        None => {
            tracing::warn!("Could not determine original filename.");
            let answer = prompt::ask("Enter target path to restore to: ")?;
            if answer.is_empty() {
                println!("Restore cancelled.");
                return Ok(Outcome::Cancelled);
            }
            PathBuf::from(answer)
        }
    };
    let target = root.join(target);

    if target.exists() {
        let question = format!("Overwrite existing file '{}'?", target.display());
        if !prompt::confirm(&question, yes)? {
            println!("Restore cancelled.");
            return Ok(Outcome::Cancelled);
        }
    }

    restore(&backup_dir, name, &target).context("Failed to restore")?;
    println!("Restored: {} -> {}", name, target.display());
    Ok(Outcome::Done)
}

fn show_stats(root: &Path, path: &Path) -> Result<Outcome> {
    let config = load_config(path)?;
    let stats = Stats::collect(root, &config).context("Failed to collect statistics")?;

    println!();
    println!("{}", "=".repeat(60));
    println!("verctrl Statistics");
    println!("{}", "=".repeat(60));
    println!();
    println!("Tracked Files: {}", stats.tracked);

    if stats.tracked > 0 {
        println!("  Existing:   {}", stats.existing);
        println!("  Missing:    {}", stats.missing);
        println!("  Total Size: {}", format_size(stats.tracked_bytes));

        if !stats.top_extensions.is_empty() {
            println!();
            println!("  Top File Types:");
            for (ext, count) in &stats.top_extensions {
                println!("    {}: {}", ext, count);
            }
        }
    }

    println!();
    println!("Backup Directory: {}", config.backup_dir.display());
    match &stats.backups {
        Some(backups) => {
            println!("  Total Backups: {}", backups.count);
            if backups.count > 0 {
                println!("  Total Size:    {}", format_size(backups.total_bytes));
            }
            if let (Some(oldest), Some(newest)) = (backups.oldest, backups.newest) {
                println!("  Oldest:        {}", format_time(oldest));
                println!("  Newest:        {}", format_time(newest));
            }
        }
        None => println!("  No backup directory found"),
    }

    println!();
    println!("Configuration:");
    println!("  Naming Scheme:   {}", config.naming_scheme);
    println!("  Keep History:    {}", config.keep_history);
    println!("  Create New File: {}", config.create_new_file);
    println!();
    println!("{}", "=".repeat(60));
    println!();

    Ok(Outcome::Done)
}

fn print_preview(files: &[String], limit: usize) {
    for file in files.iter().take(limit) {
        println!("  • {}", file);
    }
    if files.len() > limit {
        println!("  ... and {} more", files.len() - limit);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{} B", bytes)
    } else if size < MB {
        format!("{:.2} KB", size / KB)
    } else if size < GB {
        format!("{:.2} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}
