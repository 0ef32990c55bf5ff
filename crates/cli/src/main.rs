//! kustsplit CLI — the main entry point.
//!
//! Commands:
//! - `split`       — Split a manifest stream into packages
//! - `check`       — Validate a configuration
//! - `explain`     — Show where every document would go, and why
//! - `init`        — Write a starter configuration
//! - `completions` — Generate shell completions

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "kustsplit",
    about = "kustsplit — split a multi-document manifest stream into kustomize packages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a manifest stream into packages
    Split {
        /// Configuration file (.yaml, .yml or .toml)
        config: PathBuf,

        /// Input stream: a path, a URL, or `-` for stdin. Overrides `top.source`
        #[arg(short, long)]
        input: Option<String>,

        /// Output root directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Report what would be written without touching the filesystem
        #[arg(long)]
        dry_run: bool,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,

        /// Render descriptors concurrently
        #[arg(long)]
        concurrent: bool,
    },

    /// Validate a configuration and compile its templates
    Check {
        /// Configuration file
        config: PathBuf,
    },

    /// Show the placement of every document and the rules that matched it
    Explain {
        /// Configuration file
        config: PathBuf,

        /// Input stream: a path, a URL, or `-` for stdin
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Print or write a starter configuration
    Init {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Split {
            config,
            input,
            out,
            dry_run,
            force,
            concurrent,
        } => {
            commands::split::run(commands::split::SplitArgs {
                config,
                input,
                out,
                dry_run,
                force,
                concurrent,
            })
            .await?
        }
        Commands::Check { config } => commands::check::run(&config).await?,
        Commands::Explain { config, input } => {
            commands::explain::run(&config, input.as_deref()).await?
        }
        Commands::Init { output } => commands::init::run(output.as_deref()).await?,
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "kustsplit",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
