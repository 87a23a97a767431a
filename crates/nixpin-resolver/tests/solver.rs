use std::collections::BTreeMap;

use async_trait::async_trait;

use nixpin_core::candidate::{Candidate, DependencyInfo};
use nixpin_core::requirement::Requirement;
use nixpin_core::specifier::SpecifierSet;
use nixpin_core::target::ResolutionTarget;
use nixpin_core::version::PyVersion;
use nixpin_resolver::provider::{EnvironmentProvider, MetadataProvider, PackageIndex};
use nixpin_resolver::Solver;
use nixpin_util::errors::{NixpinError, NixpinResult};

struct FakeEnvironment;

#[async_trait]
impl EnvironmentProvider for FakeEnvironment {
    async fn environment(&self, python_version: &str) -> NixpinResult<BTreeMap<String, String>> {
        Ok([
            ("python_version".to_string(), python_version.to_string()),
            ("sys_platform".to_string(), "linux".to_string()),
            ("os_name".to_string(), "posix".to_string()),
        ]
        .into_iter()
        .collect())
    }
}

#[derive(Default)]
struct FakeIndex {
    listings: BTreeMap<String, BTreeMap<PyVersion, Candidate>>,
}

impl FakeIndex {
    fn with_versions(mut self, name: &str, versions: &[&str]) -> Self {
        let listing = versions
            .iter()
            .map(|v| {
                let version = PyVersion::parse(v).unwrap();
                let candidate = Candidate {
                    name: name.to_string(),
                    version: version.clone(),
                    url: format!("https://files.example/{name}-{v}.tar.gz"),
                    hash: None,
                    requires_python: SpecifierSet::any(),
                };
                (version, candidate)
            })
            .collect();
        self.listings.insert(name.to_string(), listing);
        self
    }
}

#[async_trait]
impl PackageIndex for FakeIndex {
    async fn versions(&self, name: &str) -> NixpinResult<BTreeMap<PyVersion, Candidate>> {
        match self.listings.get(name) {
            Some(listing) => Ok(listing.clone()),
            None => Err(NixpinError::SourceUnavailable {
                name: name.to_string(),
                tried: "https://pypi.example/simple/".to_string(),
            }
            .into()),
        }
    }
}

#[derive(Default)]
struct FakeMetadata {
    // Keyed by package name; every version of a package shares metadata.
    info: BTreeMap<String, DependencyInfo>,
}

impl FakeMetadata {
    fn with_run_deps(mut self, name: &str, deps: &[&str]) -> Self {
        let entry = self.info.entry(name.to_string()).or_default();
        entry
            .run
            .extend(deps.iter().map(|d| Requirement::parse(d).unwrap()));
        self
    }

    fn with_extra(mut self, name: &str, extra: &str, deps: &[&str]) -> Self {
        let entry = self.info.entry(name.to_string()).or_default();
        entry.extras.insert(
            extra.to_string(),
            deps.iter().map(|d| Requirement::parse(d).unwrap()).collect(),
        );
        self
    }
}

#[async_trait]
impl MetadataProvider for FakeMetadata {
    async fn dependencies(
        &self,
        _python_version: &str,
        candidate: &mut Candidate,
    ) -> NixpinResult<DependencyInfo> {
        Ok(self.info.get(&candidate.name).cloned().unwrap_or_default())
    }
}

fn roots(declarations: &[&str]) -> Vec<Requirement> {
    declarations
        .iter()
        .map(|d| Requirement::parse(d).unwrap())
        .collect()
}

fn version(selection: &nixpin_resolver::Selection) -> String {
    selection.candidate.version.to_string()
}

#[tokio::test]
async fn picks_newest_version_in_range() {
    let index = FakeIndex::default().with_versions("pkga", &["0.9", "1.0", "1.5", "2.0"]);
    let metadata = FakeMetadata::default();

    let mut solver = Solver::new(
        roots(&["pkga>=1.0,<2.0"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    solver.run().await.unwrap();

    assert_eq!(version(&solver.selections()["pkga"]), "1.5");
}

#[tokio::test]
async fn late_constraint_does_not_revisit_selection() {
    // pkga is picked unconstrained before pkgz's metadata narrows it to
    // <1.0; the selection stays at 1.5 and only the combined view tightens.
    let index = FakeIndex::default()
        .with_versions("pkga", &["0.5", "1.0", "1.5"])
        .with_versions("pkgz", &["1.0"]);
    let metadata = FakeMetadata::default().with_run_deps("pkgz", &["pkga<1.0"]);

    let mut solver = Solver::new(
        roots(&["pkga", "pkgz"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    solver.run().await.unwrap();

    assert_eq!(version(&solver.selections()["pkga"]), "1.5");

    let combined = solver.combined_requirements().unwrap();
    let pkga = &combined["pkga"];
    assert!(!pkga.specifier.contains(&PyVersion::parse("1.5").unwrap()));
    assert!(pkga.specifier.contains(&PyVersion::parse("0.5").unwrap()));
}

#[tokio::test]
async fn conflicting_url_pins_fail() {
    let index = FakeIndex::default().with_versions("pkga", &["1.0"]);
    let metadata = FakeMetadata::default();

    let mut solver = Solver::new(
        roots(&[
            "pkga @ https://a.example/pkga-1.0.tar.gz",
            "pkga @ https://b.example/pkga-1.0.tar.gz",
        ]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    let err = solver.run().await.unwrap_err();

    let conflict = err.downcast_ref::<NixpinError>().unwrap();
    assert!(matches!(conflict, NixpinError::Conflict { .. }));
    let msg = conflict.to_string();
    assert!(msg.contains("a.example") && msg.contains("b.example"));
}

#[tokio::test]
async fn unsatisfiable_constraint_fails_with_no_solution() {
    let index = FakeIndex::default().with_versions("pkga", &["1.0", "2.0"]);
    let metadata = FakeMetadata::default();

    let mut solver = Solver::new(
        roots(&["pkga>=3.0"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    let err = solver.run().await.unwrap_err();

    match err.downcast_ref::<NixpinError>().unwrap() {
        NixpinError::NoSolution { key, constraint } => {
            assert_eq!(key, "pkga");
            assert!(constraint.contains(">=3.0"));
        }
        other => panic!("expected NoSolution, got {other}"),
    }
}

#[tokio::test]
async fn extras_activate_their_requirements_one_run_later() {
    let index = FakeIndex::default()
        .with_versions("pkga", &["1.0"])
        .with_versions("pkgb", &["1.0", "1.2"]);
    let metadata = FakeMetadata::default().with_extra("pkga", "feature", &["pkgb>=1.0"]);

    let mut solver = Solver::new(
        roots(&["pkga[feature]"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    solver.initialize().await.unwrap();

    assert!(solver.run_once().await.unwrap());
    assert!(solver.selections().contains_key("pkga"));
    assert!(!solver.selections().contains_key("pkgb"));

    solver.run_once().await.unwrap();
    assert_eq!(version(&solver.selections()["pkgb"]), "1.2");
}

#[tokio::test]
async fn unrequested_extras_stay_inactive() {
    let index = FakeIndex::default().with_versions("pkga", &["1.0"]);
    let metadata = FakeMetadata::default().with_extra("pkga", "feature", &["pkgb>=1.0"]);

    let mut solver = Solver::new(
        roots(&["pkga"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    solver.run().await.unwrap();

    assert_eq!(solver.selections().len(), 1);
}

#[tokio::test]
async fn transitive_chain_reaches_fixed_point() {
    let index = FakeIndex::default()
        .with_versions("pkga", &["1.0"])
        .with_versions("pkgb", &["2.0"])
        .with_versions("pkgc", &["3.0"]);
    let metadata = FakeMetadata::default()
        .with_run_deps("pkga", &["pkgb"])
        .with_run_deps("pkgb", &["pkgc"]);

    let mut solver = Solver::new(
        roots(&["pkga"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    solver.run().await.unwrap();

    let keys: Vec<&str> = solver.selections().keys().map(String::as_str).collect();
    assert_eq!(keys, ["pkga", "pkgb", "pkgc"]);

    // A further pass selects nothing and contributes nothing new.
    let before = solver.candidates().len();
    assert!(!solver.run_once().await.unwrap());
    assert_eq!(solver.candidates().len(), before);
}

#[tokio::test]
async fn markers_filter_against_derived_environment() {
    let index = FakeIndex::default()
        .with_versions("pkga", &["1.0"])
        .with_versions("pkgb", &["1.0"]);
    let metadata = FakeMetadata::default().with_run_deps(
        "pkga",
        &[
            "pkgb; sys_platform == 'linux'",
            "pkgwin; sys_platform == 'win32'",
        ],
    );

    let mut solver = Solver::new(
        roots(&["pkga", "pkgmac; sys_platform == 'darwin'"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    // pkgwin and pkgmac are not in the index; resolution only succeeds
    // because their markers filter them out.
    solver.run().await.unwrap();

    let keys: Vec<&str> = solver.selections().keys().map(String::as_str).collect();
    assert_eq!(keys, ["pkga", "pkgb"]);
}

#[tokio::test]
async fn satisfied_markers_survive_each_pass() {
    let index = FakeIndex::default().with_versions("pkga", &["1.0"]);
    let metadata = FakeMetadata::default();

    let mut solver = Solver::new(
        roots(&["pkga>=0.5; sys_platform == 'linux'"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    solver.initialize().await.unwrap();

    // A root that never merges keeps its marker in the combined view;
    // the per-pass filter must keep it, not drop it.
    let combined = solver.combined_requirements().unwrap();
    assert!(combined["pkga"].marker.is_some());

    solver.run().await.unwrap();
    assert!(solver.selections().contains_key("pkga"));
}

#[tokio::test]
async fn missing_package_surfaces_source_unavailable() {
    let index = FakeIndex::default();
    let metadata = FakeMetadata::default();

    let mut solver = Solver::new(
        roots(&["ghost"]),
        ResolutionTarget::new("3.11"),
        &FakeEnvironment,
        &index,
        &metadata,
    );
    let err = solver.run().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NixpinError>().unwrap(),
        NixpinError::SourceUnavailable { .. }
    ));
}
