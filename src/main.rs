use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notepress::pipeline::{FsStore, Pipeline, route_destination};
use notepress::{Config, DEFAULT_CONFIG};

#[derive(Parser)]
#[command(name = "notepress")]
#[command(about = "Convert Markdown notes to standalone HTML pages")]
struct Cli {
    /// Config file (TOML). Missing file means built-in defaults.
    #[arg(short, long, global = true, default_value = "notepress.toml")]
    config: PathBuf,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single Markdown file
    Render {
        /// Input Markdown file
        input: PathBuf,

        /// Output HTML file (defaults to input name with .html extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert documents from a source directory and refresh the index
    Publish {
        /// Source directory holding Markdown documents
        source: PathBuf,

        /// Keys (paths relative to SOURCE) to convert; all Markdown files when omitted
        keys: Vec<String>,

        /// Destination directory (defaults to [output] dir, then SOURCE with -in -> -out)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rebuild the index page of a directory
    Index {
        /// Directory holding generated pages
        dir: PathBuf,
    },
    /// Print the built-in configuration
    DefaultConfig,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Render { input, output } => render(&input, output, &config),
        Command::Publish {
            source,
            keys,
            output,
        } => publish(source, keys, output, config),
        Command::Index { dir } => {
            let store = FsStore::new(&dir);
            let pipeline = Pipeline::new(store.clone(), store, config);
            let pages = pipeline.rebuild_index()?;
            println!("Indexed {} pages in {}", pages, dir.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::DefaultConfig => {
            print!("{DEFAULT_CONFIG}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn render(input: &Path, output: Option<PathBuf>, config: &Config) -> anyhow::Result<ExitCode> {
    let markdown = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let html = notepress::markdown_to_html_with_config(&markdown, config);

    let output = output.unwrap_or_else(|| input.with_extension("html"));
    fs::write(&output, html).with_context(|| format!("writing {}", output.display()))?;

    println!("Created {}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn publish(
    source: PathBuf,
    keys: Vec<String>,
    output: Option<PathBuf>,
    config: Config,
) -> anyhow::Result<ExitCode> {
    let configured = output.or_else(|| config.output.dir.clone());
    let destination = route_destination(&source, configured.as_deref());
    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        "publishing"
    );

    let pipeline = Pipeline::new(FsStore::new(source), FsStore::new(destination), config);
    let keys = if keys.is_empty() {
        pipeline.pending_keys().context("listing source documents")?
    } else {
        keys
    };

    let report = pipeline.process_batch(&keys);

    for converted in &report.converted {
        println!("Created {}", converted.output);
    }
    for failure in &report.failed {
        eprintln!("Error: {}", failure.error);
    }
    if let Some(error) = &report.index_error {
        eprintln!("Error: {error}");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
