//! Rendering the resolved set as a `requirements.nix` expression.

use std::path::Path;

use nixpin_core::candidate::Candidate;
use nixpin_util::errors::{NixpinError, NixpinResult};

/// Render the generated expression: one `buildPythonPackage` per
/// candidate, sorted by name so regeneration diffs cleanly.
pub fn render(candidates: &[Candidate]) -> Result<String, NixpinError> {
    let mut sorted: Vec<&Candidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    out.push_str(&format!(
        "# Generated by nixpin {}\n",
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str("{ buildPythonPackage, fetchurl, setup, args }:\n");
    out.push_str("self: {\n");

    for candidate in sorted {
        let hash = candidate.hash.as_ref().ok_or_else(|| NixpinError::Generic {
            message: format!("{candidate} has no hash; cannot emit fetchurl"),
        })?;
        out.push_str(&format!("\t\"{}\" = buildPythonPackage {{\n", candidate.name));
        out.push_str(&format!("\t\tpname = \"{}\";\n", candidate.name));
        out.push_str(&format!("\t\tversion = \"{}\";\n", candidate.version));
        out.push_str("\t\tsrc = fetchurl {\n");
        out.push_str(&format!("\t\t\turl = \"{}\";\n", candidate.url));
        out.push_str(&format!("\t\t\t{} = \"{}\";\n", hash.algorithm, hash.digest));
        out.push_str("\t\t};\n");
        out.push_str("\t};\n");
    }

    out.push_str("}\n");
    Ok(out)
}

/// Write the generated expression to `path`.
pub fn write_requirements(path: &Path, candidates: &[Candidate]) -> NixpinResult<()> {
    let rendered = render(candidates)?;
    std::fs::write(path, rendered).map_err(NixpinError::from)?;
    Ok(())
}
