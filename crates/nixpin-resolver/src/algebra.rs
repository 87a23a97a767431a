//! Operations over requirement sets: environment filtering and per-key
//! combination.
//!
//! Filtering always happens before combination. Merging drops the
//! environment condition, so a requirement must have passed the filter
//! on its own before it may be merged with another.

use std::collections::BTreeMap;

use nixpin_core::requirement::Requirement;
use nixpin_util::errors::NixpinError;

/// Drop every requirement whose marker does not hold in `env`.
/// Unconditional requirements always pass; filtering is idempotent.
pub fn filter_markers<I>(requirements: I, env: &BTreeMap<String, String>) -> Vec<Requirement>
where
    I: IntoIterator<Item = Requirement>,
{
    requirements
        .into_iter()
        .filter(|r| r.marker.as_ref().map_or(true, |m| m.evaluate(env)))
        .collect()
}

/// Fold a set of already-filtered requirements into one per key.
///
/// Requirements sharing a key are merged pairwise; a differing pair of
/// URL pins surfaces as [`NixpinError::Conflict`].
pub fn combine<I>(requirements: I) -> Result<BTreeMap<String, Requirement>, NixpinError>
where
    I: IntoIterator<Item = Requirement>,
{
    let mut combined: BTreeMap<String, Requirement> = BTreeMap::new();
    for requirement in requirements {
        let key = requirement.key().to_string();
        match combined.get(&key) {
            Some(existing) => {
                let merged = existing.merge(&requirement)?;
                combined.insert(key, merged);
            }
            None => {
                combined.insert(key, requirement);
            }
        }
    }
    Ok(combined)
}
