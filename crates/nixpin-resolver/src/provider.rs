//! The solver's external seams: environment derivation, version
//! listings, and dependency metadata. Production implementations sit on
//! the Nix and index crates; tests substitute in-memory fakes.

use std::collections::BTreeMap;

use async_trait::async_trait;

use nixpin_core::candidate::{Candidate, DependencyInfo};
use nixpin_core::version::PyVersion;
use nixpin_index::IndexClient;
use nixpin_util::errors::NixpinResult;

/// Supplies the marker variables of the target interpreter.
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    async fn environment(&self, python_version: &str)
        -> NixpinResult<BTreeMap<String, String>>;
}

/// Supplies the available versions of a package.
#[async_trait]
pub trait PackageIndex: Send + Sync {
    async fn versions(&self, name: &str) -> NixpinResult<BTreeMap<PyVersion, Candidate>>;
}

/// Extracts the declared dependencies of a chosen candidate.
///
/// The candidate is mutable so the provider can replace a hash its
/// backend refuses; this is the dominant cost of resolution and the
/// solver's main suspension point.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn dependencies(
        &self,
        python_version: &str,
        candidate: &mut Candidate,
    ) -> NixpinResult<DependencyInfo>;
}

/// Environment derivation through a sandboxed Nix build.
pub struct NixEnvironment;

#[async_trait]
impl EnvironmentProvider for NixEnvironment {
    async fn environment(
        &self,
        python_version: &str,
    ) -> NixpinResult<BTreeMap<String, String>> {
        nixpin_nix::environment::target_environment(python_version).await
    }
}

#[async_trait]
impl PackageIndex for IndexClient {
    async fn versions(&self, name: &str) -> NixpinResult<BTreeMap<PyVersion, Candidate>> {
        IndexClient::versions(self, name).await
    }
}

/// Metadata extraction through a sandboxed Nix build of the candidate's
/// source distribution.
pub struct NixMetadata;

#[async_trait]
impl MetadataProvider for NixMetadata {
    async fn dependencies(
        &self,
        python_version: &str,
        candidate: &mut Candidate,
    ) -> NixpinResult<DependencyInfo> {
        nixpin_nix::prefetch::ensure_supported_hash(candidate).await?;
        nixpin_nix::metadata::candidate_dependencies(python_version, candidate).await
    }
}
