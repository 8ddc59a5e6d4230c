use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use verbump::config::{check_bump, config_dir, find_config, load_from_path, BumpConfig};
use verbump::persist::{write_all, WriteResult};
use verbump::{diff_all, rewrite_all, NoPatternMatch, PatternSet, RewriteError, RewrittenFileData};

#[derive(Parser)]
#[command(name = "verbump")]
#[command(about = "Rewrite version strings across files using patterns", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to verbump.toml (searched upwards from the current directory if not specified)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show log output (repeat for more detail, RUST_LOG overrides)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the unified diff a bump would produce
    Diff {
        /// Version to bump to
        #[arg(short, long)]
        new_version: String,
    },

    /// Rewrite all configured files to the new version
    Update {
        /// Version to bump to
        #[arg(long)]
        new_version: String,

        /// Dry run - show the diff without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Check that every configured pattern matches its file
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config_path, config) = load_config(cli.config)?;

    match cli.command {
        Commands::Diff { new_version } => cmd_diff(&config_path, &config, &new_version),
        Commands::Update {
            new_version,
            dry_run,
        } => cmd_update(&config_path, &config, &new_version, dry_run),
        Commands::Check => cmd_check(&config_path, &config),
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "off",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<PathBuf>) -> Result<(PathBuf, BumpConfig)> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let cwd = env::current_dir().context("could not determine current directory")?;
            find_config(cwd)?
        }
    };
    let config = load_from_path(&path)?;
    println!("{}", format!("Config: {}", path.display()).dimmed());
    Ok((path, config))
}

fn pattern_set(config_path: &Path, config: &BumpConfig, new_version: &str) -> Result<PatternSet> {
    config
        .pattern_set(config_dir(config_path), new_version)
        .with_context(|| format!("invalid patterns in {}", config_path.display()))
}

/// Rewrite everything, printing every unmatched pattern before failing.
fn rewrite_or_report(set: &PatternSet) -> Result<Vec<RewrittenFileData>> {
    match rewrite_all(set) {
        Ok(records) => Ok(records),
        Err(RewriteError::NoPatternMatch(err)) => {
            report_failures(&err);
            anyhow::bail!(
                "{} pattern(s) in {} file(s) matched nothing",
                err.len(),
                err.files().len()
            )
        }
        Err(err) => Err(err.into()),
    }
}

fn report_failures(err: &NoPatternMatch) {
    for failure in &err.failures {
        eprintln!(
            "{} {}: no match for pattern '{}'",
            "✗".red(),
            failure.path,
            failure.pattern
        );
        if let Some(explanation) = &failure.explanation {
            eprintln!("  {}", explanation.dimmed());
        }
        if let Some((lineno, line)) = &failure.closest_line {
            eprintln!(
                "  {} line {}: {}",
                "closest:".yellow(),
                lineno,
                line.trim()
            );
        }
    }
}

/// Print a combined diff with colored markers.
fn display_diff(text: &str) {
    for line in text.lines() {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with('+') {
            line.green()
        } else {
            line.normal()
        };
        println!("{}", styled);
    }
}

fn cmd_diff(config_path: &Path, config: &BumpConfig, new_version: &str) -> Result<()> {
    check_bump(&config.meta.current_version, new_version)?;
    let set = pattern_set(config_path, config, new_version)?;
    let records = rewrite_or_report(&set)?;

    let text = diff_all(&records);
    if text.is_empty() {
        println!("{}", "No changes".yellow());
    } else {
        display_diff(&text);
    }
    Ok(())
}

fn cmd_update(
    config_path: &Path,
    config: &BumpConfig,
    new_version: &str,
    dry_run: bool,
) -> Result<()> {
    let current = &config.meta.current_version;
    check_bump(current, new_version)?;
    println!("Bump: {} -> {}", current, new_version.bold());

    let set = pattern_set(config_path, config, new_version)?;
    let records = rewrite_or_report(&set)?;

    if dry_run {
        println!("{}", "[DRY RUN - showing what would be written]".cyan());
        display_diff(&diff_all(&records));
        return Ok(());
    }

    let mut written = 0;
    for result in write_all(&records)? {
        match result {
            WriteResult::Written { path, .. } => {
                println!("{} Updated {}", "✓".green(), path.display());
                written += 1;
            }
            WriteResult::Unchanged { path } => {
                println!("{} Unchanged {}", "⊙".yellow(), path.display());
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} updated", format!("{}", written).green());
    println!(
        "  {} unchanged",
        format!("{}", records.len() - written).yellow()
    );
    Ok(())
}

fn cmd_check(config_path: &Path, config: &BumpConfig) -> Result<()> {
    let current = &config.meta.current_version;
    let set = pattern_set(config_path, config, current)?;
    let records = rewrite_or_report(&set)?;

    let pattern_count: usize = set.iter().map(|(_, patterns)| patterns.len()).sum();
    println!(
        "{} {} pattern(s) in {} file(s) match version {}",
        "✓".green(),
        pattern_count,
        records.len(),
        current
    );
    Ok(())
}
