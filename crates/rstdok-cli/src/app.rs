//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use rstdok_core::diagnostics::Diagnostic;
use rstdok_core::{BuildOutcome, InputFormat, LocalFilesystem, ProjectBuilder, ProjectSettings};

/// Settings file looked up in the source directory
pub const CONFIG_FILE: &str = "rstdok.toml";

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

/// Source markup, overriding the settings file
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceFormat {
    /// reStructuredText
    Rst,
    /// Markdown
    Md,
}

impl From<SourceFormat> for InputFormat {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Rst => InputFormat::Rst,
            SourceFormat::Md => InputFormat::Markdown,
        }
    }
}

#[derive(Parser)]
#[command(name = "rstdok")]
#[command(author, version, about = "reStructuredText documentation builder", long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build HTML pages from a source directory
    Build {
        /// Source directory
        #[arg(default_value = ".")]
        source: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "_build/html")]
        output: PathBuf,

        /// Settings file (defaults to rstdok.toml in the source directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source markup
        #[arg(long, value_enum)]
        input_format: Option<SourceFormat>,

        /// Maximum number of parse workers
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Parse documents one after another
        #[arg(long)]
        sequential: bool,

        /// Fail when any warning or error is logged
        #[arg(long)]
        fail_on_log: bool,
    },

    /// Parse and compile a source directory, reporting problems
    Check {
        /// Source directory
        #[arg(default_value = ".")]
        source: PathBuf,

        /// Settings file (defaults to rstdok.toml in the source directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source markup
        #[arg(long, value_enum)]
        input_format: Option<SourceFormat>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Options of the build command
#[derive(Debug, Clone)]
pub struct BuildArgs {
    pub source: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub input_format: Option<SourceFormat>,
    pub jobs: Option<usize>,
    pub sequential: bool,
    pub fail_on_log: bool,
}

impl BuildArgs {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            config: None,
            input_format: None,
            jobs: None,
            sequential: false,
            fail_on_log: false,
        }
    }
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            source,
            output,
            config,
            input_format,
            jobs,
            sequential,
            fail_on_log,
        } => {
            let args = BuildArgs {
                source,
                output,
                config,
                input_format,
                jobs,
                sequential,
                fail_on_log,
            };
            build_command(&args)?;
        }
        Commands::Check {
            source,
            config,
            input_format,
            format,
        } => {
            let diagnostics = check_command(&source, config.as_deref(), input_format, format)?;
            // Exit with error code if there are errors
            if diagnostics.iter().any(|d| d.is_error()) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // a second initialisation (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load settings from `config`, else from `rstdok.toml` in `source`, else
/// defaults
pub fn load_settings(source: &Path, config: Option<&Path>) -> Result<ProjectSettings> {
    let path = match config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = source.join(CONFIG_FILE);
            if !path.exists() {
                return Ok(ProjectSettings::default());
            }
            path
        }
    };
    ProjectSettings::load(&path)
        .with_context(|| format!("Failed to load configuration: {}", path.display()))
}

fn builder_for(
    source: &Path,
    output: &Path,
    mut settings: ProjectSettings,
    input_format: Option<SourceFormat>,
) -> Result<ProjectBuilder> {
    if !source.is_dir() {
        anyhow::bail!("Source directory not found: {}", source.display());
    }
    if let Some(format) = input_format {
        settings.build.input_format = format.into();
    }
    Ok(ProjectBuilder::new(
        settings,
        Arc::new(LocalFilesystem::new(source)),
        Arc::new(LocalFilesystem::new(output)),
    ))
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{}", diag);
    }
}

/// Execute the build command
pub fn build_command(args: &BuildArgs) -> Result<BuildOutcome> {
    let mut settings = load_settings(&args.source, args.config.as_deref())?;
    if let Some(jobs) = args.jobs {
        settings.build.max_workers = jobs.max(1);
    }
    if args.sequential {
        settings.build.parallel = false;
    }
    if args.fail_on_log {
        settings.build.fail_on_log = true;
    }

    println!("rstdok v{}", rstdok_core::VERSION);
    println!("Building: {}", args.source.display());

    let mut builder = builder_for(&args.source, &args.output, settings, args.input_format)?;
    let result = builder.build();
    print_diagnostics(&builder.reporter().diagnostics());
    let outcome = result.with_context(|| format!("Failed to build {}", args.source.display()))?;

    for failure in &outcome.failures {
        println!("  Failed: {} ({})", failure.file, failure.message);
    }
    println!();
    println!("Build complete!");
    println!("  Documents: {}", outcome.documents.len());
    println!("  Written: {} page(s) to {}", outcome.written.len(), args.output.display());
    println!("  Problems: {}", outcome.problems);

    Ok(outcome)
}

/// Execute the check command; returns the collected diagnostics
pub fn check_command(
    source: &Path,
    config: Option<&Path>,
    input_format: Option<SourceFormat>,
    format: OutputFormat,
) -> Result<Vec<Diagnostic>> {
    let settings = load_settings(source, config)?;
    // nothing is written during a check
    let mut builder = builder_for(source, source, settings, input_format)?;
    let result = builder.check();
    let diagnostics = builder.reporter().diagnostics();
    let outcome = match result {
        Ok(outcome) => Some(outcome),
        Err(rstdok_core::Error::FailOnLog(_)) => None,
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to check {}", source.display()));
        }
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&diagnostics)
                .context("Failed to serialize diagnostics to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if diagnostics.is_empty() {
                let documents = outcome.map(|o| o.documents.len()).unwrap_or_default();
                println!("✓ No issues found in {} document(s)", documents);
            } else {
                for diag in &diagnostics {
                    println!("{}", diag);
                    println!();
                }
                let error_count = diagnostics.iter().filter(|d| d.is_error()).count();
                let warning_count = diagnostics.iter().filter(|d| d.is_warning()).count();
                println!(
                    "Found {} error(s) and {} warning(s)",
                    error_count, warning_count
                );
            }
        }
    }

    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_source_format_mapping() {
        assert_eq!(InputFormat::from(SourceFormat::Md), InputFormat::Markdown);
        assert_eq!(InputFormat::from(SourceFormat::Rst), InputFormat::Rst);
    }

    #[test]
    fn test_build_arguments() {
        let cli = Cli::try_parse_from(["rstdok", "build", "docs", "-o", "out", "-j", "3", "--sequential"])
            .unwrap();
        match cli.command {
            Commands::Build {
                source,
                output,
                jobs,
                sequential,
                ..
            } => {
                assert_eq!(source, PathBuf::from("docs"));
                assert_eq!(output, PathBuf::from("out"));
                assert_eq!(jobs, Some(3));
                assert!(sequential);
            }
            Commands::Check { .. } => panic!("expected build"),
        }
    }
}
