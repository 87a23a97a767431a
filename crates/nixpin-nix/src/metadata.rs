//! Extracting a candidate's declared dependencies inside the Nix sandbox.
//!
//! The candidate's source distribution is fetched with `fetchurl` and its
//! build configuration is evaluated up to the configuration step; the
//! build writes a JSON file listing the declared requirement strings per
//! category. Markers are left intact here and filtered by the resolver
//! against the target environment.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::debug;

use nixpin_core::candidate::{Candidate, DependencyInfo};
use nixpin_core::requirement::Requirement;
use nixpin_util::errors::{NixpinError, NixpinResult};

use crate::{build_json, python_attribute};

#[derive(Debug, Deserialize)]
struct RawMetadata {
    requirements: RawRequirements,
}

#[derive(Debug, Deserialize)]
struct RawRequirements {
    #[serde(default)]
    setup: Vec<String>,
    #[serde(default)]
    test: Vec<String>,
    #[serde(default)]
    install: Vec<String>,
    #[serde(default)]
    extras: BTreeMap<String, Vec<String>>,
}

/// Fetch and introspect one candidate, returning its declared
/// dependencies. The candidate must already carry a hash Nix accepts;
/// see [`crate::prefetch::ensure_supported_hash`].
pub async fn candidate_dependencies(
    python_version: &str,
    candidate: &Candidate,
) -> NixpinResult<DependencyInfo> {
    let hash = candidate.hash.as_ref().ok_or_else(|| NixpinError::Metadata {
        name: candidate.name.clone(),
        message: "candidate has no hash to fetch with".to_string(),
    })?;

    let src = format!(
        "(import <nixpkgs> {{}}).fetchurl {{ url = \"{}\"; {} = \"{}\"; }}",
        candidate.url, hash.algorithm, hash.digest
    );
    let args = vec![
        "--argstr".to_string(),
        "python_version".to_string(),
        python_attribute(python_version),
        "--argstr".to_string(),
        "name".to_string(),
        format!("{}-{}", candidate.name, candidate.version),
        "--arg".to_string(),
        "src".to_string(),
        src,
    ];

    debug!("introspecting {candidate}");
    let json = build_json("metadata", &args)
        .await
        .map_err(|e| NixpinError::Metadata {
            name: candidate.name.clone(),
            message: e.to_string(),
        })?;

    Ok(parse_metadata(&candidate.name, &json)?)
}

/// Parse the JSON produced by the metadata build.
pub fn parse_metadata(name: &str, json: &str) -> Result<DependencyInfo, NixpinError> {
    let raw: RawMetadata = serde_json::from_str(json).map_err(|e| NixpinError::Metadata {
        name: name.to_string(),
        message: format!("Invalid metadata JSON: {e}"),
    })?;

    let parse_set = |texts: &[String]| -> Result<BTreeSet<Requirement>, NixpinError> {
        texts.iter().map(|t| Requirement::parse(t)).collect()
    };

    let mut extras = BTreeMap::new();
    for (extra, texts) in &raw.requirements.extras {
        extras.insert(extra.clone(), parse_set(texts)?);
    }

    Ok(DependencyInfo {
        setup: parse_set(&raw.requirements.setup)?,
        test: parse_set(&raw.requirements.test)?,
        run: parse_set(&raw.requirements.install)?,
        extras,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_categories() {
        let json = r#"{
            "requirements": {
                "install": ["requests>=2.0", "click"],
                "test": ["pytest; python_version >= \"3\""],
                "setup": ["setuptools-scm"],
                "extras": {"fast": ["ujson"]}
            }
        }"#;
        let info = parse_metadata("pkga", json).unwrap();
        assert_eq!(info.run.len(), 2);
        assert_eq!(info.test.len(), 1);
        assert_eq!(info.setup.len(), 1);
        assert_eq!(info.extras["fast"].len(), 1);
    }

    #[test]
    fn missing_categories_default_to_empty() {
        let info = parse_metadata("pkga", r#"{"requirements": {"install": ["flask"]}}"#).unwrap();
        assert_eq!(info.run.len(), 1);
        assert!(info.test.is_empty());
        assert!(info.setup.is_empty());
        assert!(info.extras.is_empty());
    }

    #[test]
    fn bad_requirement_string_is_an_error() {
        let json = r#"{"requirements": {"install": [">=nonsense"]}}"#;
        assert!(parse_metadata("pkga", json).is_err());
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(parse_metadata("pkga", "not json").is_err());
    }
}
