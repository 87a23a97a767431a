//! Handler for `nixpin tree`.

use miette::Result;

use nixpin_resolver::graph::PackageGraph;

use crate::cli::ResolveArgs;
use crate::commands::resolve_requirements;

pub async fn exec(args: &ResolveArgs, depth: Option<u32>) -> Result<()> {
    let resolution = resolve_requirements(args).await?;

    let label = args
        .requirements
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "requirements".to_string());

    let graph = PackageGraph::from_resolution(&label, &resolution.roots, &resolution.selections);
    print!("{}", graph.print_tree(depth.map(|d| d as usize)));
    Ok(())
}
