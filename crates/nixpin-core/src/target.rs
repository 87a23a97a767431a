//! Resolution run configuration: which interpreter to target, which
//! dependency categories to include, and pre-release eligibility.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask of dependency categories, independently toggleable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyMode(u8);

impl DependencyMode {
    /// Run-time dependencies (`install_requires`).
    pub const RUN: DependencyMode = DependencyMode(0b001);
    /// Test-time dependencies (`tests_require`).
    pub const TEST: DependencyMode = DependencyMode(0b010);
    /// Build-time dependencies (`setup_requires`).
    pub const SETUP: DependencyMode = DependencyMode(0b100);

    pub const fn empty() -> Self {
        DependencyMode(0)
    }

    pub fn contains(self, other: DependencyMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for DependencyMode {
    fn default() -> Self {
        Self::RUN
    }
}

impl BitOr for DependencyMode {
    type Output = DependencyMode;

    fn bitor(self, rhs: DependencyMode) -> DependencyMode {
        DependencyMode(self.0 | rhs.0)
    }
}

impl BitOrAssign for DependencyMode {
    fn bitor_assign(&mut self, rhs: DependencyMode) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for DependencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.contains(Self::RUN) {
            parts.push("run");
        }
        if self.contains(Self::TEST) {
            parts.push("test");
        }
        if self.contains(Self::SETUP) {
            parts.push("setup");
        }
        if parts.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&parts.join("+"))
        }
    }
}

/// Settings for one resolution run.
#[derive(Debug, Clone)]
pub struct ResolutionTarget {
    /// Target interpreter identifier, e.g. `3.11`.
    pub python_version: String,
    /// Which dependency categories of each selected package to follow.
    pub mode: DependencyMode,
    /// Whether development and pre-release versions are eligible.
    pub pre_release: bool,
}

impl ResolutionTarget {
    pub fn new(python_version: impl Into<String>) -> Self {
        Self {
            python_version: python_version.into(),
            mode: DependencyMode::default(),
            pre_release: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_combination() {
        let mode = DependencyMode::RUN | DependencyMode::TEST;
        assert!(mode.contains(DependencyMode::RUN));
        assert!(mode.contains(DependencyMode::TEST));
        assert!(!mode.contains(DependencyMode::SETUP));
    }

    #[test]
    fn default_mode_is_run_only() {
        let mode = DependencyMode::default();
        assert!(mode.contains(DependencyMode::RUN));
        assert!(!mode.contains(DependencyMode::TEST));
        assert!(!mode.contains(DependencyMode::SETUP));
    }

    #[test]
    fn display() {
        assert_eq!(
            (DependencyMode::RUN | DependencyMode::SETUP).to_string(),
            "run+setup"
        );
        assert_eq!(DependencyMode::empty().to_string(), "none");
    }
}
