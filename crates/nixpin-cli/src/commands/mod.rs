//! Command dispatch and handler modules.

mod generate;
mod resolve;
mod tree;

use std::collections::BTreeMap;

use miette::Result;

use nixpin_core::candidate::Candidate;
use nixpin_core::reqfile::{self, IndexConfig};
use nixpin_core::requirement::Requirement;
use nixpin_core::target::{DependencyMode, ResolutionTarget};
use nixpin_index::IndexClient;
use nixpin_resolver::provider::{NixEnvironment, NixMetadata};
use nixpin_resolver::{Selection, Solver};
use nixpin_util::progress;

use crate::cli::{Cli, Command, ResolveArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate { resolve, output } => generate::exec(&resolve, &output).await,
        Command::Resolve { resolve } => resolve::exec(&resolve).await,
        Command::Tree { resolve, depth } => tree::exec(&resolve, depth).await,
    }
}

/// The owned outcome of a finished resolution.
pub(crate) struct Resolution {
    pub roots: Vec<Requirement>,
    pub selections: BTreeMap<String, Selection>,
    pub candidates: Vec<Candidate>,
}

/// Load the requirements file and resolve it to the fixed point.
pub(crate) async fn resolve_requirements(args: &ResolveArgs) -> Result<Resolution> {
    let (declarations, file_config) = reqfile::read_requirements(&args.requirements)?;

    // Command-line index options win over file directives.
    let config = IndexConfig {
        index_url: args.index_url.clone().or(file_config.index_url),
        extra_index_url: args.extra_index_url.clone().or(file_config.extra_index_url),
    };

    let mut target = ResolutionTarget::new(args.python_target.clone());
    target.pre_release = args.pre_release;
    let mut mode = if args.no_run_deps {
        DependencyMode::empty()
    } else {
        DependencyMode::RUN
    };
    if args.setup_deps {
        mode |= DependencyMode::SETUP;
    }
    if args.test_deps {
        mode |= DependencyMode::TEST;
    }
    target.mode = mode;

    let index = IndexClient::new(&config)?;
    let environment = NixEnvironment;
    let metadata = NixMetadata;

    progress::status(
        "Resolving",
        &format!(
            "{} for python {}",
            args.requirements.display(),
            args.python_target
        ),
    );

    let mut solver = Solver::new(declarations, target, &environment, &index, &metadata);
    let spinner = progress::spinner("resolving dependency graph");
    let outcome = solver.run().await;
    spinner.finish_and_clear();
    outcome?;

    Ok(Resolution {
        roots: solver.roots().to_vec(),
        selections: solver.selections().clone(),
        candidates: solver.candidates(),
    })
}
