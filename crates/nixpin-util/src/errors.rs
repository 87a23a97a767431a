use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all nixpin operations.
#[derive(Debug, Error, Diagnostic)]
pub enum NixpinError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dependency declaration could not be parsed.
    #[error("Invalid requirement '{input}': {message}")]
    #[diagnostic(help("Requirements use PEP 508 syntax, e.g. `requests[socks]>=2.0; python_version >= \"3.8\"`"))]
    Requirement { input: String, message: String },

    /// Two requirements for the same package carry incompatible URL pins.
    #[error("Conflicting URL pins for '{key}': '{left}' vs '{right}'")]
    #[diagnostic(help("A direct-URL pin is exclusive; remove one of the conflicting declarations"))]
    Conflict {
        key: String,
        left: String,
        right: String,
    },

    /// No available version of a package satisfies the combined constraint.
    #[error("No version of '{key}' satisfies '{constraint}'")]
    #[diagnostic(help("Loosen the version constraints on this package or its dependents"))]
    NoSolution { key: String, constraint: String },

    /// No configured package index could provide a version listing.
    #[error("Package index unavailable for '{name}'; tried {tried}")]
    SourceUnavailable { name: String, tried: String },

    /// Dependency metadata extraction failed for a chosen candidate.
    #[error("Failed to extract dependencies of '{name}': {message}")]
    #[diagnostic(help("The package's build configuration could not be introspected; nixpin does not fall back to another version"))]
    Metadata { name: String, message: String },

    /// The target environment could not be derived.
    #[error("Failed to derive target environment: {message}")]
    Environment { message: String },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type NixpinResult<T> = miette::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_both_sources() {
        let err = NixpinError::Conflict {
            key: "pkga".to_string(),
            left: "https://a.example/pkga.tar.gz".to_string(),
            right: "https://b.example/pkga.tar.gz".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a.example"));
        assert!(msg.contains("b.example"));
        assert!(msg.contains("pkga"));
    }

    #[test]
    fn no_solution_names_key_and_constraint() {
        let err = NixpinError::NoSolution {
            key: "pkga".to_string(),
            constraint: ">=1.0,<2.0".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pkga"));
        assert!(msg.contains(">=1.0,<2.0"));
    }
}
