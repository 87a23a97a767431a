//! Parsing one PEP 503 version-listing page into candidates.
//!
//! The page format is loose HTML with one `<a>` per artifact: the anchor
//! text is the filename, `href` points at the artifact (optionally with a
//! `#algo=digest` fragment), and `data-requires-python` carries the
//! advisory interpreter constraint. A tolerant scanner is enough; a full
//! HTML parser is not needed for these pages.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use url::Url;

use nixpin_core::candidate::{ArtifactHash, Candidate};
use nixpin_core::specifier::SpecifierSet;
use nixpin_core::version::PyVersion;

/// Source-distribution extensions in preference order: compressed tar
/// formats first, then plain `.tar`, with `.zip` last. When one version
/// ships under several extensions, the earliest entry wins.
const SDIST_EXTS: [&str; 11] = [
    ".tar.xz",
    ".txz",
    ".tar.lz",
    ".tlz",
    ".tar.lzma",
    ".tar.bz2",
    ".tbz",
    ".tar.gz",
    ".tgz",
    ".tar",
    ".zip",
];

const HASH_ALGORITHMS: [&str; 6] = ["sha512", "sha384", "sha256", "sha224", "sha1", "md5"];

/// Split a filename into base and extension, keeping `.tar` attached to
/// its compression suffix (`pkga-1.0.tar.gz` -> `pkga-1.0`, `.tar.gz`).
pub fn split_sdist_ext(filename: &str) -> (&str, &str) {
    let (base, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => filename.split_at(pos),
        _ => return (filename, ""),
    };
    if base.to_ascii_lowercase().ends_with(".tar") {
        filename.split_at(base.len() - 4)
    } else {
        (base, ext)
    }
}

fn ext_priority(ext: &str) -> Option<usize> {
    let ext = ext.to_ascii_lowercase();
    SDIST_EXTS.iter().position(|e| *e == ext)
}

/// Extract the version from a filename base such as `zope_interface-5.4.0`.
///
/// Filenames spell the package name with `-`, `_` and `.` interchangeably,
/// so those are matched as a class; the version is whatever follows the
/// separating dash.
pub fn extract_version(filebase: &str, name: &str) -> Option<PyVersion> {
    let base = filebase.to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    let base_bytes = base.as_bytes();
    let name_bytes = name.as_bytes();

    'outer: for start in 0..base.len() {
        let mut pos = start;
        for &p in name_bytes {
            let Some(&t) = base_bytes.get(pos) else {
                continue 'outer;
            };
            let matched = if matches!(p, b'-' | b'_' | b'.') {
                matches!(t, b'-' | b'_' | b'.')
            } else {
                t == p
            };
            if !matched {
                continue 'outer;
            }
            pos += 1;
        }
        if base_bytes.get(pos) != Some(&b'-') {
            continue;
        }
        let rest = &base[pos + 1..];
        let end = rest
            .find(|c: char| {
                !(c.is_ascii_lowercase()
                    || c.is_ascii_digit()
                    || matches!(c, '_' | '.' | '!' | '+' | '-'))
            })
            .unwrap_or(rest.len());
        if end == 0 {
            continue;
        }
        if let Some(version) = PyVersion::parse(&rest[..end]) {
            return Some(version);
        }
    }
    None
}

/// Read an `algo=digest` pair out of a URL fragment, for the algorithms
/// the index protocol uses.
pub fn parse_hash_fragment(fragment: &str) -> Option<ArtifactHash> {
    for algo in HASH_ALGORITHMS {
        let Some(start) = fragment.find(algo) else {
            continue;
        };
        let rest = &fragment[start + algo.len()..];
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || ('a'..='f').contains(&c)))
            .unwrap_or(rest.len());
        if end == 0 {
            continue;
        }
        return Some(ArtifactHash {
            algorithm: algo.to_string(),
            digest: rest[..end].to_string(),
        });
    }
    None
}

/// One `<a>` element of the listing: attributes plus anchor text.
struct Anchor {
    href: Option<String>,
    requires_python: Option<String>,
    text: String,
}

/// Parse a version-listing page for `name`, fetched from `page_url`.
///
/// Anchors that are not recognizable source distributions are skipped.
pub fn parse_listing(page_url: &Url, name: &str, html: &str) -> BTreeMap<PyVersion, Candidate> {
    let mut candidates: BTreeMap<PyVersion, Candidate> = BTreeMap::new();

    for anchor in scan_anchors(html) {
        let Some(href) = anchor.href else {
            continue;
        };
        let filename = anchor.text.trim();

        let (base, ext) = split_sdist_ext(filename);
        let Some(priority) = ext_priority(ext) else {
            continue;
        };

        let Some(version) = extract_version(base, name) else {
            debug!("skipping {filename}: no version recognizable for {name}");
            continue;
        };

        let Ok(resolved) = page_url.join(&href) else {
            warn!("skipping {filename}: unresolvable href {href}");
            continue;
        };
        let hash = resolved.fragment().and_then(parse_hash_fragment);
        let mut artifact_url = resolved;
        artifact_url.set_fragment(None);

        let requires_python = anchor
            .requires_python
            .as_deref()
            .and_then(SpecifierSet::parse)
            .unwrap_or_default();

        if let Some(existing) = candidates.get(&version) {
            let existing_ext = split_sdist_ext(&existing.url).1;
            if ext_priority(existing_ext).is_some_and(|old| old < priority) {
                continue;
            }
        }

        candidates.insert(
            version.clone(),
            Candidate {
                name: name.to_string(),
                version,
                url: artifact_url.to_string(),
                hash,
                requires_python,
            },
        );
    }

    candidates
}

fn scan_anchors(html: &str) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    let lower = html.to_ascii_lowercase();
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find("<a") {
        let tag_start = pos + rel;
        let after = tag_start + 2;
        // Require a delimiter so "<abbr>" does not match.
        if !matches!(lower.as_bytes().get(after), Some(b' ' | b'\t' | b'\n' | b'>')) {
            pos = after;
            continue;
        }
        let Some(tag_end_rel) = html[after..].find('>') else {
            break;
        };
        let tag_end = after + tag_end_rel;
        let attrs = parse_attributes(&html[after..tag_end]);

        let Some(close_rel) = lower[tag_end + 1..].find("</a") else {
            break;
        };
        let text = unescape(&html[tag_end + 1..tag_end + 1 + close_rel]);

        anchors.push(Anchor {
            href: attrs
                .iter()
                .find(|(k, _)| k == "href")
                .map(|(_, v)| v.clone()),
            requires_python: attrs
                .iter()
                .find(|(k, _)| k == "data-requires-python")
                .map(|(_, v)| v.clone()),
            text,
        });
        pos = tag_end + 1 + close_rel;
    }

    anchors
}

fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let bytes = tag.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == name_start {
            break;
        }
        let name = tag[name_start..i].to_ascii_lowercase();

        // Whitespace is allowed around `=`.
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            attrs.push((name, String::new()));
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => {
                i += 1;
                let start = i;
                while i < bytes.len() && bytes[i] != q {
                    i += 1;
                }
                let value = &tag[start..i];
                i = (i + 1).min(bytes.len());
                value
            }
            _ => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &tag[start..i]
            }
        };
        attrs.push((name, unescape(value)));
    }

    attrs
}

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
