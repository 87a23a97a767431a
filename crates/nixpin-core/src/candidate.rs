//! Concrete package versions available for selection, and the dependency
//! metadata extracted from them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::requirement::Requirement;
use crate::specifier::SpecifierSet;
use crate::version::PyVersion;

/// A content hash advertised by the package index: algorithm tag plus
/// lowercase hex digest.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ArtifactHash {
    pub algorithm: String,
    pub digest: String,
}

impl fmt::Display for ArtifactHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.algorithm, self.digest)
    }
}

/// One concrete version of a named package, as listed by the index.
///
/// `requires_python` is the advisory interpreter constraint the index
/// advertises for the artifact; it is carried through to diagnostics but
/// not enforced during selection.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub version: PyVersion,
    pub url: String,
    pub hash: Option<ArtifactHash>,
    pub requires_python: SpecifierSet,
}

impl Candidate {
    fn assert_comparable(&self, other: &Candidate) {
        assert_eq!(
            self.name, other.name,
            "comparing candidates of different packages is undefined"
        );
    }
}

/// Ordering and equality are solely by version, and only defined between
/// candidates of the same package; cross-package comparison panics.
impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.assert_comparable(other);
        self.version == other.version
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.assert_comparable(other);
        self.version.cmp(&other.version)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// The declared dependency sets of one package version: build-time,
/// test-time, and run-time requirements, plus the per-extra sets that a
/// requested extra activates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyInfo {
    pub setup: BTreeSet<Requirement>,
    pub test: BTreeSet<Requirement>,
    pub run: BTreeSet<Requirement>,
    pub extras: BTreeMap<String, BTreeSet<Requirement>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, version: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            version: PyVersion::parse(version).unwrap(),
            url: format!("https://files.example/{name}-{version}.tar.gz"),
            hash: None,
            requires_python: SpecifierSet::any(),
        }
    }

    #[test]
    fn ordering_is_by_version() {
        let old = candidate("pkga", "1.0");
        let new = candidate("pkga", "1.5");
        assert!(old < new);
        assert_eq!(candidate("pkga", "1.0"), candidate("pkga", "1.0.0"));
    }

    #[test]
    #[should_panic(expected = "different packages")]
    fn cross_package_comparison_panics() {
        let _ = candidate("pkga", "1.0") < candidate("pkgb", "1.0");
    }
}
