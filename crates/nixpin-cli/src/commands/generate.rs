//! Handler for `nixpin generate`.

use std::path::Path;

use miette::Result;

use nixpin_util::progress;

use crate::cli::ResolveArgs;
use crate::commands::resolve_requirements;

pub async fn exec(args: &ResolveArgs, output: &Path) -> Result<()> {
    let resolution = resolve_requirements(args).await?;

    nixpin_nix::expr::write_requirements(output, &resolution.candidates)?;
    progress::status(
        "Generated",
        &format!(
            "{} ({} packages)",
            output.display(),
            resolution.candidates.len()
        ),
    );
    Ok(())
}
