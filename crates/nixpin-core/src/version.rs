//! PEP 440 version parsing, comparison, and release-phase predicates.
//!
//! Python versions use an ordering that differs from semver:
//! - An optional epoch (`1!2.0`) dominates everything after it
//! - Trailing zero release segments are insignificant (`1.0` == `1.0.0`)
//! - Phases order as `dev` < `a` < `b` < `rc` < final < `post`
//! - A local label (`+ubuntu1`) sorts after the same public version

use std::cmp::Ordering;
use std::fmt;

/// A parsed PEP 440 version.
///
/// Equality, ordering, and hashing all go through the same normalized
/// comparison key, so `1.0` and `1.0.0` are interchangeable as map keys.
#[derive(Debug, Clone)]
pub struct PyVersion {
    original: String,
    epoch: u32,
    release: Vec<u64>,
    pre: Option<(PreTag, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
}

/// Pre-release phase tags in ordering position.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PreTag {
    Alpha,
    Beta,
    Rc,
}

/// Position of the pre-release component in the total order.
///
/// A version with only a `.devN` suffix sorts before every pre-release of
/// the same release segment; a plain release sorts after all of them.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum PreKey {
    DevOnly,
    Pre(PreTag, u64),
    Final,
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum LocalSegment {
    Text(String),
    Number(u64),
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct CmpKey {
    epoch: u32,
    release: Vec<u64>,
    pre: PreKey,
    post: Option<u64>,
    dev: (u8, u64),
    local: Option<Vec<LocalSegment>>,
}

impl PyVersion {
    /// Parse a PEP 440 version string.
    ///
    /// Returns `None` for strings that are not valid versions.
    pub fn parse(version: &str) -> Option<Self> {
        let original = version.trim().to_string();
        let lower = original.to_lowercase();
        let mut rest = lower.strip_prefix('v').unwrap_or(&lower);

        let mut epoch = 0u32;
        if let Some((e, tail)) = rest.split_once('!') {
            epoch = e.parse().ok()?;
            rest = tail;
        }

        let (local, public) = match rest.split_once('+') {
            Some((public, local)) => {
                if local.is_empty()
                    || !local
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
                {
                    return None;
                }
                (Some(local.to_string()), public)
            }
            None => (None, rest),
        };

        let mut cursor = Cursor::new(public);
        let release = cursor.release()?;
        let pre = cursor.pre();
        let post = cursor.post();
        let dev = cursor.dev();
        if !cursor.at_end() {
            return None;
        }

        Some(Self {
            original,
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// True for development releases (`1.0.dev3`).
    pub fn is_devrelease(&self) -> bool {
        self.dev.is_some()
    }

    /// True for any pre-release phase: alpha, beta, release candidate, or dev.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Release segments as parsed (`1.2.0` keeps the trailing zero).
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// The version as originally written.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    fn cmp_key(&self) -> CmpKey {
        let mut release = self.release.clone();
        while release.len() > 1 && release.last() == Some(&0) {
            release.pop();
        }

        let pre = match self.pre {
            Some((tag, n)) => PreKey::Pre(tag, n),
            None if self.post.is_none() && self.dev.is_some() => PreKey::DevOnly,
            None => PreKey::Final,
        };

        let dev = match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        };

        let local = self.local.as_ref().map(|l| {
            l.split(['.', '-', '_'])
                .map(|seg| match seg.parse::<u64>() {
                    Ok(n) => LocalSegment::Number(n),
                    Err(_) => LocalSegment::Text(seg.to_string()),
                })
                .collect()
        });

        CmpKey {
            epoch: self.epoch,
            release,
            pre,
            post: self.post,
            dev,
            local,
        }
    }
}

impl PartialEq for PyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key() == other.cmp_key()
    }
}

impl Eq for PyVersion {}

impl Ord for PyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key().cmp(&other.cmp_key())
    }
}

impl PartialOrd for PyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for PyVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.cmp_key().hash(state);
    }
}

impl fmt::Display for PyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Byte cursor over the public part of a lowercased version string.
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn eat_separator(&mut self) -> bool {
        if matches!(self.input.get(self.pos), Some(b'.' | b'-' | b'_')) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Option<u64> {
        let start = self.pos;
        while matches!(self.input.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }

    fn word(&mut self) -> &'a str {
        let start = self.pos;
        while matches!(self.input.get(self.pos), Some(b'a'..=b'z')) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("")
    }

    fn release(&mut self) -> Option<Vec<u64>> {
        let mut segments = vec![self.number()?];
        loop {
            let save = self.pos;
            if matches!(self.input.get(self.pos), Some(b'.')) {
                self.pos += 1;
                match self.number() {
                    Some(n) => segments.push(n),
                    None => {
                        self.pos = save;
                        break;
                    }
                }
            } else {
                break;
            }
        }
        Some(segments)
    }

    fn pre(&mut self) -> Option<(PreTag, u64)> {
        let save = self.pos;
        self.eat_separator();
        let tag = match self.word() {
            "a" | "alpha" => PreTag::Alpha,
            "b" | "beta" => PreTag::Beta,
            "c" | "rc" | "pre" | "preview" => PreTag::Rc,
            _ => {
                self.pos = save;
                return None;
            }
        };
        self.eat_separator();
        let n = self.number().unwrap_or(0);
        Some((tag, n))
    }

    fn post(&mut self) -> Option<u64> {
        let save = self.pos;
        // Implicit post release: `1.0-2`
        if matches!(self.input.get(self.pos), Some(b'-')) {
            self.pos += 1;
            if let Some(n) = self.number() {
                return Some(n);
            }
            self.pos = save;
        }
        self.eat_separator();
        match self.word() {
            "post" | "rev" | "r" => {
                self.eat_separator();
                Some(self.number().unwrap_or(0))
            }
            _ => {
                self.pos = save;
                None
            }
        }
    }

    fn dev(&mut self) -> Option<u64> {
        let save = self.pos;
        self.eat_separator();
        match self.word() {
            "dev" => {
                self.eat_separator();
                Some(self.number().unwrap_or(0))
            }
            _ => {
                self.pos = save;
                None
            }
        }
    }
}
