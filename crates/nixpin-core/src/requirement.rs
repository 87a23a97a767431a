//! PEP 508 dependency declarations and the merge algebra over them.

use std::collections::BTreeSet;
use std::fmt;

use nixpin_util::errors::NixpinError;

use crate::marker::Marker;
use crate::specifier::SpecifierSet;

/// A single dependency declaration: name, optional extras, version
/// constraint, optional direct-URL pin, optional environment marker.
///
/// The canonical `key` is derived once at construction and identifies the
/// declared package across spelling variants (`Setuptools_SCM` and
/// `setuptools-scm` share a key).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Requirement {
    name: String,
    key: String,
    pub url: Option<String>,
    pub extras: BTreeSet<String>,
    pub specifier: SpecifierSet,
    pub marker: Option<Marker>,
}

/// Collapse a package name to its canonical key: lowercase, with every run
/// of characters outside `[A-Za-z0-9.]` replaced by a single `-`.
pub fn canonical_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            key.push(c.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            key.push('-');
            in_run = true;
        }
    }
    key
}

impl Requirement {
    /// Build a requirement from parts, deriving the canonical key.
    pub fn new(
        name: impl Into<String>,
        url: Option<String>,
        extras: BTreeSet<String>,
        specifier: SpecifierSet,
        marker: Option<Marker>,
    ) -> Self {
        let name = name.into();
        let key = canonical_key(&name);
        Self {
            name,
            key,
            url,
            extras,
            specifier,
            marker,
        }
    }

    /// Parse a PEP 508 declaration such as
    /// `requests[socks,security]>=2.0,<3; python_version >= "3.8"` or
    /// `pkga @ https://example.org/pkga-1.0.tar.gz`.
    pub fn parse(input: &str) -> Result<Self, NixpinError> {
        let fail = |message: &str| NixpinError::Requirement {
            input: input.to_string(),
            message: message.to_string(),
        };

        let (decl, marker) = match split_marker(input) {
            Some((decl, marker_text)) => {
                let marker = Marker::parse(marker_text).map_err(|e| fail(&e))?;
                (decl, Some(marker))
            }
            None => (input, None),
        };

        let decl = decl.trim();
        if decl.is_empty() {
            return Err(fail("empty declaration"));
        }

        let name_end = decl
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
            .unwrap_or(decl.len());
        let name = &decl[..name_end];
        if name.is_empty() {
            return Err(fail("missing package name"));
        }
        let mut rest = decl[name_end..].trim_start();

        let mut extras = BTreeSet::new();
        if let Some(tail) = rest.strip_prefix('[') {
            let end = tail.find(']').ok_or_else(|| fail("unclosed extras list"))?;
            for extra in tail[..end].split(',') {
                let extra = extra.trim();
                if !extra.is_empty() {
                    extras.insert(extra.to_string());
                }
            }
            rest = tail[end + 1..].trim_start();
        }

        let mut url = None;
        let mut specifier = SpecifierSet::any();
        if let Some(tail) = rest.strip_prefix('@') {
            let pin = tail.trim();
            if pin.is_empty() {
                return Err(fail("missing URL after '@'"));
            }
            url = Some(pin.to_string());
        } else if !rest.is_empty() {
            // Version constraints are optionally parenthesized.
            let spec_text = rest
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(rest);
            specifier =
                SpecifierSet::parse(spec_text).ok_or_else(|| fail("invalid version specifier"))?;
        }

        Ok(Self::new(name, url, extras, specifier, marker))
    }

    /// The package name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical identity of the declared package.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Merge two declarations for the same package into one.
    ///
    /// Extras are unioned and version constraints intersected. Direct-URL
    /// pins are exclusive: two differing pins are a [`NixpinError::Conflict`].
    /// The marker is dropped: merging happens only after both inputs have
    /// independently passed environment filtering, so the merged result is
    /// unconditionally applicable. Callers must not re-filter it.
    pub fn merge(&self, other: &Requirement) -> Result<Requirement, NixpinError> {
        if self.key != other.key {
            return Err(NixpinError::Generic {
                message: format!(
                    "cannot merge requirements for different packages ('{}' vs '{}')",
                    self.name, other.name
                ),
            });
        }

        let url = match (&self.url, &other.url) {
            (Some(a), Some(b)) if a != b => {
                return Err(NixpinError::Conflict {
                    key: self.key.clone(),
                    left: self.to_string(),
                    right: other.to_string(),
                });
            }
            (Some(a), _) => Some(a.clone()),
            (None, b) => b.clone(),
        };

        let mut extras = self.extras.clone();
        extras.extend(other.extras.iter().cloned());

        Ok(Requirement {
            name: self.name.clone(),
            key: self.key.clone(),
            url,
            extras,
            specifier: self.specifier.intersect(&other.specifier),
            marker: None,
        })
    }
}

/// Split `decl ; marker` at the first `;` outside quotes.
fn split_marker(input: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (None, '\'' | '"') => quote = Some(c),
            (None, ';') => return Some((&input[..i], &input[i + 1..])),
            _ => {}
        }
    }
    None
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        if !self.specifier.is_empty() {
            write!(f, "{}", self.specifier)?;
        }
        if let Some(ref url) = self.url {
            write!(f, " @ {url}")?;
        }
        if let Some(ref marker) = self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}
