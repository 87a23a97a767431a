//! Handler for `nixpin resolve`.

use miette::Result;

use crate::cli::ResolveArgs;
use crate::commands::resolve_requirements;

pub async fn exec(args: &ResolveArgs) -> Result<()> {
    let resolution = resolve_requirements(args).await?;

    for candidate in &resolution.candidates {
        let hash = candidate
            .hash
            .as_ref()
            .map(|h| h.to_string())
            .unwrap_or_else(|| "no hash".to_string());
        println!("{}=={}  {}  {hash}", candidate.name, candidate.version, candidate.url);
    }
    Ok(())
}
