//! PEP 440 version specifiers: single comparison clauses and conjunctive
//! sets of them.
//!
//! A `SpecifierSet` is a logical AND of clauses; intersecting two sets is
//! just the union of their clauses, which is how constraint narrowing is
//! expressed throughout the resolver.

use std::collections::BTreeSet;
use std::fmt;

use crate::version::PyVersion;

/// Comparison operator of a single specifier clause.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CompareOp {
    /// `==`, with optional `.*` wildcard suffix.
    Equal,
    /// `!=`, with optional `.*` wildcard suffix.
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `~=` compatible release.
    Compatible,
    /// `===` arbitrary string equality.
    Arbitrary,
}

impl CompareOp {
    fn as_str(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::LessEqual => "<=",
            CompareOp::GreaterEqual => ">=",
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
            CompareOp::Compatible => "~=",
            CompareOp::Arbitrary => "===",
        }
    }
}

/// A single version comparison clause, e.g. `>=1.0` or `==2.1.*`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Specifier {
    pub op: CompareOp,
    /// The version text as written, including a trailing `.*` wildcard.
    pub version: String,
}

impl Specifier {
    /// Parse a single clause like `>=1.0`.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        // Longest operators first so `===` is not read as `==`.
        let (op, rest) = if let Some(r) = s.strip_prefix("===") {
            (CompareOp::Arbitrary, r)
        } else if let Some(r) = s.strip_prefix("==") {
            (CompareOp::Equal, r)
        } else if let Some(r) = s.strip_prefix("!=") {
            (CompareOp::NotEqual, r)
        } else if let Some(r) = s.strip_prefix("<=") {
            (CompareOp::LessEqual, r)
        } else if let Some(r) = s.strip_prefix(">=") {
            (CompareOp::GreaterEqual, r)
        } else if let Some(r) = s.strip_prefix("~=") {
            (CompareOp::Compatible, r)
        } else if let Some(r) = s.strip_prefix('<') {
            (CompareOp::Less, r)
        } else if let Some(r) = s.strip_prefix('>') {
            (CompareOp::Greater, r)
        } else {
            return None;
        };

        let version = rest.trim().to_string();
        if version.is_empty() {
            return None;
        }

        match op {
            CompareOp::Arbitrary => {}
            CompareOp::Equal | CompareOp::NotEqual => {
                let base = version.strip_suffix(".*").unwrap_or(&version);
                PyVersion::parse(base)?;
            }
            CompareOp::Compatible => {
                let v = PyVersion::parse(&version)?;
                // `~=` needs at least two release segments to have a prefix.
                if v.release().len() < 2 {
                    return None;
                }
            }
            _ => {
                PyVersion::parse(&version)?;
            }
        }

        Some(Self { op, version })
    }

    /// Whether `version` satisfies this clause.
    pub fn contains(&self, version: &PyVersion) -> bool {
        match self.op {
            CompareOp::Arbitrary => version.as_str() == self.version,
            CompareOp::Equal => {
                if let Some(prefix) = self.version.strip_suffix(".*") {
                    wildcard_match(version, prefix)
                } else {
                    PyVersion::parse(&self.version).is_some_and(|spec| *version == spec)
                }
            }
            CompareOp::NotEqual => {
                if let Some(prefix) = self.version.strip_suffix(".*") {
                    !wildcard_match(version, prefix)
                } else {
                    PyVersion::parse(&self.version).is_some_and(|spec| *version != spec)
                }
            }
            CompareOp::LessEqual => cmp_clause(version, &self.version, |o| o.is_le()),
            CompareOp::GreaterEqual => cmp_clause(version, &self.version, |o| o.is_ge()),
            CompareOp::Less => cmp_clause(version, &self.version, |o| o.is_lt()),
            CompareOp::Greater => cmp_clause(version, &self.version, |o| o.is_gt()),
            CompareOp::Compatible => {
                let Some(floor) = PyVersion::parse(&self.version) else {
                    return false;
                };
                if *version < floor {
                    return false;
                }
                // Equivalent to `== prefix.*` where prefix drops the last
                // release segment.
                let prefix = &floor.release()[..floor.release().len() - 1];
                release_prefix_match(version, floor.epoch(), prefix)
            }
        }
    }
}

fn cmp_clause(version: &PyVersion, spec: &str, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    match PyVersion::parse(spec) {
        Some(spec) => accept(version.cmp(&spec)),
        None => false,
    }
}

fn wildcard_match(version: &PyVersion, prefix: &str) -> bool {
    match PyVersion::parse(prefix) {
        Some(p) => release_prefix_match(version, p.epoch(), p.release()),
        None => false,
    }
}

fn release_prefix_match(version: &PyVersion, epoch: u32, prefix: &[u64]) -> bool {
    if version.epoch() != epoch {
        return false;
    }
    let release = version.release();
    prefix.iter().enumerate().all(|(i, seg)| {
        // Pad the candidate with zeros so `1.0` matches `==1.0.0.*`.
        release.get(i).copied().unwrap_or(0) == *seg
    })
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// A conjunction of specifier clauses, e.g. `>=1.0,<2.0,!=1.3`.
///
/// Stored as a set so that intersection is commutative and display order
/// is deterministic regardless of declaration order.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SpecifierSet {
    clauses: BTreeSet<Specifier>,
}

impl SpecifierSet {
    /// The empty (always-satisfied) constraint.
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse a comma-separated clause list. An empty string is the empty set.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut clauses = BTreeSet::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            clauses.insert(Specifier::parse(part)?);
        }
        Some(Self { clauses })
    }

    /// Whether `version` satisfies every clause.
    pub fn contains(&self, version: &PyVersion) -> bool {
        self.clauses.iter().all(|c| c.contains(version))
    }

    /// Logical AND of two constraint sets.
    pub fn intersect(&self, other: &SpecifierSet) -> SpecifierSet {
        let mut clauses = self.clauses.clone();
        clauses.extend(other.clauses.iter().cloned());
        SpecifierSet { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.clauses.iter()
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for clause in &self.clauses {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{clause}")?;
            first = false;
        }
        Ok(())
    }
}
