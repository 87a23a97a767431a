//! `requirements.txt` loading: declarations plus the index-selection
//! directives pip embeds in the same file.

use std::path::Path;

use nixpin_util::errors::{NixpinError, NixpinResult};
use tracing::warn;

use crate::requirement::Requirement;

/// Index endpoints extracted from `--index-url` / `--extra-index-url`
/// directives. Either may also be supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    pub index_url: Option<String>,
    pub extra_index_url: Option<String>,
}

/// Parse a requirements file into declarations and index configuration.
///
/// Comments start at a `#` that opens the line or follows whitespace
/// (a `#` inside a URL fragment is part of the URL). Unknown `--`
/// directives are logged and skipped.
pub fn read_requirements(path: &Path) -> NixpinResult<(Vec<Requirement>, IndexConfig)> {
    let content = std::fs::read_to_string(path).map_err(|e| NixpinError::Generic {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    parse_requirements(&content)
}

/// Parse requirements-file content; see [`read_requirements`].
pub fn parse_requirements(content: &str) -> NixpinResult<(Vec<Requirement>, IndexConfig)> {
    let mut requirements = Vec::new();
    let mut config = IndexConfig::default();

    for line in content.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(directive) = line.strip_prefix("--") {
            let (command, arg) = match directive.split_once(['=', ' ']) {
                Some((c, a)) => (c.trim(), a.trim()),
                None => (directive.trim(), ""),
            };
            match command {
                "index-url" if !arg.is_empty() => config.index_url = Some(arg.to_string()),
                "extra-index-url" if !arg.is_empty() => {
                    config.extra_index_url = Some(arg.to_string())
                }
                _ => warn!("ignoring unsupported requirements directive: --{directive}"),
            }
            continue;
        }

        requirements.push(Requirement::parse(line)?);
    }

    Ok((requirements, config))
}

fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &line[..i];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations_and_directives() {
        let content = "\
# project deps
--index-url https://mirror.example/simple
--extra-index-url=https://internal.example/simple
requests>=2.0,<3  # pinned below 3
flask
";
        let (reqs, config) = parse_requirements(content).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].key(), "requests");
        assert_eq!(
            config.index_url.as_deref(),
            Some("https://mirror.example/simple")
        );
        assert_eq!(
            config.extra_index_url.as_deref(),
            Some("https://internal.example/simple")
        );
    }

    #[test]
    fn hash_fragment_in_url_is_not_a_comment() {
        let content = "pkga @ https://files.example/pkga-1.0.tar.gz#sha256=abcd\n";
        let (reqs, _) = parse_requirements(content).unwrap();
        assert_eq!(
            reqs[0].url.as_deref(),
            Some("https://files.example/pkga-1.0.tar.gz#sha256=abcd")
        );
    }

    #[test]
    fn unknown_directive_is_skipped() {
        let (reqs, config) = parse_requirements("--no-binary :all:\nflask\n").unwrap();
        assert_eq!(reqs.len(), 1);
        assert!(config.index_url.is_none());
    }

    #[test]
    fn invalid_line_is_an_error() {
        assert!(parse_requirements(">=1.0\n").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        std::fs::write(&path, "requests>=2.0\n").unwrap();

        let (reqs, _) = read_requirements(&path).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].key(), "requests");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_requirements(Path::new("/nonexistent/requirements.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/requirements.txt"));
    }
}
