//! Sift CLI - extract, filter and load declaration code.

mod extract;
mod load;
mod sanitize;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Extract, filter and load declaration code from scripts and notebooks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the flat source extracted from a file
    Extract {
        /// Path to the submission (.py or .ipynb file)
        path: String,
    },

    /// List the declarations that survive filtering
    Sanitize {
        /// Path to the submission (.py or .ipynb file)
        path: String,
    },

    /// Load a file into a namespace and print its bindings
    Load {
        /// Path to the submission (.py or .ipynb file)
        path: String,

        /// Name to load the namespace under (default: derived)
        #[arg(long)]
        module_name: Option<String>,

        /// Load everything, skipping what cannot run, instead of
        /// filtering to declarations first
        #[arg(long)]
        unfiltered: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Extract { path } => extract::execute(&path)?,

        Commands::Sanitize { path } => sanitize::execute(&path)?,

        Commands::Load {
            path,
            module_name,
            unfiltered,
        } => load::execute(&path, module_name.as_deref(), unfiltered)?,
    }

    Ok(())
}
