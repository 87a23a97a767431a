//! Deriving the target environment by running the target interpreter.

use std::collections::BTreeMap;

use tracing::debug;

use nixpin_util::errors::{NixpinError, NixpinResult};

use crate::{build_json, python_attribute};

/// Environment-marker variables of the target interpreter, as reported
/// by the interpreter itself inside the Nix sandbox.
///
/// The resulting map holds the standard marker variables
/// (`python_version`, `sys_platform`, `platform_machine`, ...) and is
/// what every environment marker is evaluated against.
pub async fn target_environment(python_version: &str) -> NixpinResult<BTreeMap<String, String>> {
    let args = vec![
        "--argstr".to_string(),
        "python_version".to_string(),
        python_attribute(python_version),
    ];

    let json = build_json("environment", &args)
        .await
        .map_err(|e| NixpinError::Environment {
            message: e.to_string(),
        })?;

    let env: BTreeMap<String, String> =
        serde_json::from_str(&json).map_err(|e| NixpinError::Environment {
            message: format!("Invalid environment JSON: {e}"),
        })?;

    debug!(
        "target environment for python {python_version}: {} variables",
        env.len()
    );
    Ok(env)
}
