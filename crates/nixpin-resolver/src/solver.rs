//! The fixed-point resolution loop.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use nixpin_core::candidate::{Candidate, DependencyInfo};
use nixpin_core::requirement::Requirement;
use nixpin_core::target::{DependencyMode, ResolutionTarget};
use nixpin_util::errors::{NixpinError, NixpinResult};

use crate::algebra::{combine, filter_markers};
use crate::provider::{EnvironmentProvider, MetadataProvider, PackageIndex};
use crate::select::select_version;

/// One committed choice: the candidate picked for a package and the
/// filtered requirements it contributed.
#[derive(Debug, Clone)]
pub struct Selection {
    pub candidate: Candidate,
    pub requirements: BTreeSet<Requirement>,
}

/// Resolves a root requirement set into a pinned package set.
///
/// The selection map is append-only: once a package has a version, later
/// constraints on it are recorded in the combined view but never cause a
/// re-pick. `run` iterates until a pass contributes no new requirements.
pub struct Solver<'a> {
    target: ResolutionTarget,
    roots: Vec<Requirement>,
    environment: Option<BTreeMap<String, String>>,
    selected: BTreeMap<String, Selection>,
    environment_provider: &'a dyn EnvironmentProvider,
    index: &'a dyn PackageIndex,
    metadata: &'a dyn MetadataProvider,
}

impl<'a> Solver<'a> {
    pub fn new(
        roots: Vec<Requirement>,
        target: ResolutionTarget,
        environment_provider: &'a dyn EnvironmentProvider,
        index: &'a dyn PackageIndex,
        metadata: &'a dyn MetadataProvider,
    ) -> Self {
        Self {
            target,
            roots,
            environment: None,
            selected: BTreeMap::new(),
            environment_provider,
            index,
            metadata,
        }
    }

    /// Derive the target environment and filter the root declarations
    /// against it. Must happen before the first run.
    pub async fn initialize(&mut self) -> NixpinResult<()> {
        let env = self
            .environment_provider
            .environment(&self.target.python_version)
            .await?;
        self.roots = filter_markers(std::mem::take(&mut self.roots), &env);
        self.environment = Some(env);
        Ok(())
    }

    /// The combined view: every known requirement, one per key.
    ///
    /// Root declarations and every selection's contributions are merged;
    /// all of them already passed environment filtering.
    pub fn combined_requirements(&self) -> Result<BTreeMap<String, Requirement>, NixpinError> {
        let all = self.roots.iter().cloned().chain(
            self.selected
                .values()
                .flat_map(|s| s.requirements.iter().cloned()),
        );
        combine(all)
    }

    /// One pass over the combined view in key order, selecting a version
    /// for every package that has none yet. Returns whether the pass
    /// contributed requirements not seen before it started.
    pub async fn run_once(&mut self) -> NixpinResult<bool> {
        if self.environment.is_none() {
            self.initialize().await?;
        }
        // Merged entries carry no marker but unmerged ones keep theirs;
        // the combined view is filtered again before selection.
        let combined = self.combined_requirements()?;
        let combined: BTreeMap<String, Requirement> = match self.environment.as_ref() {
            Some(env) => filter_markers(combined.into_values(), env)
                .into_iter()
                .map(|r| (r.key().to_string(), r))
                .collect(),
            None => combined,
        };
        let mut changed = false;

        debug!("Current constraints:");
        for (key, requirement) in &combined {
            match self.selected.get(key) {
                Some(s) => debug!("  {requirement} [{}]", s.candidate.version),
                None => debug!("  {requirement} [not selected yet]"),
            }
        }

        for (key, requirement) in &combined {
            if self.selected.contains_key(key) {
                continue;
            }

            debug!("Processing requirement: {}", requirement.name());
            let available = self.index.versions(requirement.name()).await?;

            let Some(mut candidate) = select_version(requirement, &available, &self.target)
            else {
                return Err(NixpinError::NoSolution {
                    key: key.clone(),
                    constraint: requirement.specifier.to_string(),
                }
                .into());
            };
            debug!("Picked version: {}", candidate.version);

            let info = self
                .metadata
                .dependencies(&self.target.python_version, &mut candidate)
                .await?;
            let requirements = self.dependencies_for(requirement, &info)?;

            if !requirements.is_empty() {
                let listed: Vec<String> =
                    requirements.iter().map(Requirement::to_string).collect();
                debug!("New dependencies: {}", listed.join(", "));
                changed = true;
            }
            self.selected.insert(
                key.clone(),
                Selection {
                    candidate,
                    requirements,
                },
            );
        }

        Ok(changed)
    }

    /// The dependency categories of a selected candidate that the target
    /// follows, plus any requested extras, environment-filtered.
    fn dependencies_for(
        &self,
        requirement: &Requirement,
        info: &DependencyInfo,
    ) -> Result<BTreeSet<Requirement>, NixpinError> {
        let Some(env) = self.environment.as_ref() else {
            return Err(NixpinError::Environment {
                message: "marker environment not derived".to_string(),
            });
        };
        let mut deps: BTreeSet<Requirement> = BTreeSet::new();

        if self.target.mode.contains(DependencyMode::SETUP) {
            deps.extend(info.setup.iter().cloned());
        }
        if self.target.mode.contains(DependencyMode::RUN) {
            deps.extend(info.run.iter().cloned());
        }
        if self.target.mode.contains(DependencyMode::TEST) {
            deps.extend(info.test.iter().cloned());
        }
        for extra in &requirement.extras {
            if let Some(extra_deps) = info.extras.get(extra) {
                deps.extend(extra_deps.iter().cloned());
            }
        }

        Ok(filter_markers(deps, env).into_iter().collect())
    }

    /// Run to the fixed point.
    pub async fn run(&mut self) -> NixpinResult<()> {
        let mut run = 0u32;
        loop {
            run += 1;
            info!("Run #{run}");
            if !self.run_once().await? {
                break;
            }
        }
        Ok(())
    }

    /// The pinned candidates, in key order.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.selected
            .values()
            .map(|s| s.candidate.clone())
            .collect()
    }

    /// The selection map: key to committed choice.
    pub fn selections(&self) -> &BTreeMap<String, Selection> {
        &self.selected
    }

    /// The filtered root declarations.
    pub fn roots(&self) -> &[Requirement] {
        &self.roots
    }

    /// The derived marker environment, once initialized.
    pub fn environment(&self) -> Option<&BTreeMap<String, String>> {
        self.environment.as_ref()
    }
}
