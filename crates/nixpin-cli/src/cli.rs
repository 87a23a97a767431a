//! CLI argument definitions for nixpin.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "nixpin",
    version,
    about = "Pin Python dependencies into Nix build definitions",
    long_about = "nixpin resolves a requirements.txt against a package index for a \
                  chosen Python interpreter and emits a requirements.nix with every \
                  transitive dependency pinned to an exact version and hash."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Options shared by every resolving command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Target Python version, e.g. 3.11
    #[arg(short = 'V', long)]
    pub python_target: String,

    /// Requirements file to resolve
    #[arg(short, long, default_value = "requirements.txt")]
    pub requirements: PathBuf,

    /// Consider pre-release and development versions
    #[arg(long)]
    pub pre_release: bool,

    /// Also follow build-time dependencies
    #[arg(long)]
    pub setup_deps: bool,

    /// Also follow test-time dependencies
    #[arg(long)]
    pub test_deps: bool,

    /// Do not follow run-time dependencies
    #[arg(long)]
    pub no_run_deps: bool,

    /// Primary package index URL (overrides the requirements file)
    #[arg(long)]
    pub index_url: Option<String>,

    /// Additional package index, consulted before the primary one
    #[arg(long)]
    pub extra_index_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies and write a requirements.nix
    Generate {
        #[command(flatten)]
        resolve: ResolveArgs,

        /// Output file
        #[arg(short, long, default_value = "requirements.nix")]
        output: PathBuf,
    },

    /// Resolve dependencies and print the pinned set
    Resolve {
        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Resolve dependencies and print the dependency tree
    Tree {
        #[command(flatten)]
        resolve: ResolveArgs,

        /// Maximum depth
        #[arg(long)]
        depth: Option<u32>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
