//! Greedy candidate selection: newest version first, no backtracking.

use std::collections::BTreeMap;

use tracing::debug;

use nixpin_core::candidate::Candidate;
use nixpin_core::requirement::Requirement;
use nixpin_core::target::ResolutionTarget;
use nixpin_core::version::PyVersion;

/// Pick the highest available version satisfying the requirement.
///
/// Pre-release and development versions are skipped unless the target
/// opts in. The advisory `requires_python` constraint a candidate
/// carries is reported but deliberately not enforced, matching how the
/// generated pins have always behaved.
pub fn select_version(
    requirement: &Requirement,
    available: &BTreeMap<PyVersion, Candidate>,
    target: &ResolutionTarget,
) -> Option<Candidate> {
    let target_python = PyVersion::parse(&target.python_version);

    for (version, candidate) in available.iter().rev() {
        if !target.pre_release && (version.is_prerelease() || version.is_devrelease()) {
            continue;
        }
        if !requirement.specifier.contains(version) {
            continue;
        }

        if !candidate.requires_python.is_empty() {
            if let Some(ref python) = target_python {
                if !candidate.requires_python.contains(python) {
                    debug!(
                        "{candidate} advertises requires-python '{}' excluding {}; selecting anyway",
                        candidate.requires_python, target.python_version
                    );
                }
            }
        }

        return Some(candidate.clone());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use nixpin_core::specifier::SpecifierSet;

    fn available(versions: &[&str]) -> BTreeMap<PyVersion, Candidate> {
        versions
            .iter()
            .map(|v| {
                let version = PyVersion::parse(v).unwrap();
                let candidate = Candidate {
                    name: "pkga".to_string(),
                    version: version.clone(),
                    url: format!("https://files.example/pkga-{v}.tar.gz"),
                    hash: None,
                    requires_python: SpecifierSet::any(),
                };
                (version, candidate)
            })
            .collect()
    }

    fn req(s: &str) -> Requirement {
        Requirement::parse(s).unwrap()
    }

    #[test]
    fn newest_satisfying_wins() {
        let target = ResolutionTarget::new("3.11");
        let picked = select_version(
            &req("pkga>=1.0,<2.0"),
            &available(&["0.9", "1.0", "1.5", "2.0"]),
            &target,
        )
        .unwrap();
        assert_eq!(picked.version, PyVersion::parse("1.5").unwrap());
    }

    #[test]
    fn prereleases_skipped_by_default() {
        let target = ResolutionTarget::new("3.11");
        let versions = available(&["1.0", "2.0b1", "2.0.dev3"]);
        let picked = select_version(&req("pkga"), &versions, &target).unwrap();
        assert_eq!(picked.version, PyVersion::parse("1.0").unwrap());

        let mut opted_in = target.clone();
        opted_in.pre_release = true;
        let picked = select_version(&req("pkga"), &versions, &opted_in).unwrap();
        assert_eq!(picked.version, PyVersion::parse("2.0b1").unwrap());
    }

    #[test]
    fn tighter_constraint_never_widens() {
        let versions = available(&["0.9", "1.0", "1.5", "2.0"]);
        let eligible = |spec: &str| {
            versions
                .keys()
                .filter(|v| req(&format!("pkga{spec}")).specifier.contains(v))
                .count()
        };
        assert!(eligible(">=1.0,<2.0") >= eligible(">=1.0,<2.0,!=1.5"));
        assert!(eligible(">=1.0") >= eligible(">=1.0,<2.0"));
    }

    #[test]
    fn nothing_satisfying_is_none() {
        let target = ResolutionTarget::new("3.11");
        assert!(select_version(&req("pkga>=3.0"), &available(&["1.0", "2.0"]), &target).is_none());
    }
}
