//! Nix integration.
//!
//! All ground truth comes from Nix builds: the target environment is
//! derived by running the target interpreter in a sandbox, and a
//! candidate's dependency metadata is extracted by building its source
//! distribution up to the configuration step. Both run the bundled
//! `package.nix` expression; [`prefetch`] handles putting sources into
//! the store and re-hashing ones whose advertised hash Nix refuses, and
//! [`expr`] renders the final `requirements.nix`.

pub mod environment;
pub mod expr;
pub mod metadata;
pub mod prefetch;

use std::path::{Path, PathBuf};

use nixpin_util::errors::{NixpinError, NixpinResult};
use nixpin_util::process::CommandBuilder;

const PACKAGE_NIX: &str = include_str!("../assets/package.nix");
const INTROSPECT_PY: &str = include_str!("../assets/introspect.py");

/// Materialize the bundled Nix expression and its helper script into a
/// directory, returning the path of `package.nix`.
fn write_assets(dir: &Path) -> NixpinResult<PathBuf> {
    let nix_path = dir.join("package.nix");
    std::fs::write(&nix_path, PACKAGE_NIX).map_err(NixpinError::from)?;
    std::fs::write(dir.join("introspect.py"), INTROSPECT_PY).map_err(NixpinError::from)?;
    Ok(nix_path)
}

/// Run `nix-build` on the bundled expression for one attribute, read the
/// resulting store path from stdout, and return the JSON it contains.
async fn build_json(attribute: &str, extra_args: &[String]) -> NixpinResult<String> {
    let dir = tempfile::tempdir().map_err(NixpinError::from)?;
    let nix_path = write_assets(dir.path())?;

    let stdout = CommandBuilder::new("nix-build")
        .args(["-Q", "--no-out-link", "-A", attribute])
        .args(extra_args.iter().cloned())
        .arg(nix_path.to_string_lossy())
        .check_output()
        .await?;

    let stdout = String::from_utf8_lossy(&stdout);
    let out_path = stdout.lines().next().ok_or_else(|| NixpinError::Generic {
        message: format!("nix-build produced no output path for attribute '{attribute}'"),
    })?;

    std::fs::read_to_string(out_path.trim()).map_err(|e| {
        NixpinError::Generic {
            message: format!("Failed to read build result {out_path}: {e}"),
        }
        .into()
    })
}

/// The interpreter attribute in nixpkgs for a version like `3.11`.
pub fn python_attribute(python_version: &str) -> String {
    format!("python{}", python_version.replace('.', ""))
}
