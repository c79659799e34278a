//! PEP 440 version parsing and ordering.
//!
//! Python release versions use an ordering that differs from semver:
//! - An optional epoch (`1!2.0`) outranks everything else
//! - Release segments compare numerically, trailing zeros are insignificant
//! - Suffixes order as `dev` < `a` < `b` < `rc` < final < `post`
//! - A local label (`+ubuntu1`) sorts above the same public version

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use reqfold_util::errors::ReqfoldError;

/// A parsed PEP 440 version.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreKind, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

/// Pre-release phase.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    fn as_str(self) -> &'static str {
        match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::Rc => "rc",
        }
    }
}

/// A segment of a local version label. Numeric segments sort above text.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum LocalSegment {
    Text(String),
    Number(u64),
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Text(s) => f.write_str(s),
            LocalSegment::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum PreKey {
    // A dev release of a final version sorts before all of its pre-releases.
    DevOnly,
    Pre(PreKind, u64),
    Final,
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum DevKey {
    Dev(u64),
    Final,
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct SortKey {
    epoch: u64,
    release: Vec<u64>,
    pre: PreKey,
    post: Option<u64>,
    dev: DevKey,
    local: Vec<LocalSegment>,
}

impl Version {
    /// Parse a version string, accepting the spelling variants PEP 440 normalises
    /// (`1.0-alpha.1`, `v2`, `1.0-1`, `1.0.dev`).
    pub fn parse(input: &str) -> Result<Self, ReqfoldError> {
        let invalid = |message: &str| ReqfoldError::InvalidVersion {
            version: input.to_string(),
            message: message.to_string(),
        };

        let trimmed = input.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let lowered = lowered.strip_prefix('v').unwrap_or(&lowered);
        if lowered.is_empty() {
            return Err(invalid("empty version"));
        }

        let (public, local) = match lowered.split_once('+') {
            Some((public, local)) => (public, Some(local)),
            None => (lowered, None),
        };

        let (epoch, body) = match public.split_once('!') {
            Some((epoch, body)) => (
                epoch
                    .parse::<u64>()
                    .map_err(|_| invalid("epoch must be a number"))?,
                body,
            ),
            None => (0, public),
        };

        let mut cursor = Cursor { rest: body };
        let mut release = vec![cursor.number().ok_or_else(|| invalid("missing release number"))?];
        while cursor.rest.starts_with('.')
            && cursor.rest[1..].starts_with(|c: char| c.is_ascii_digit())
        {
            cursor.rest = &cursor.rest[1..];
            release.push(cursor.number().ok_or_else(|| invalid("bad release segment"))?);
        }

        let pre = cursor
            .keyword(&["preview", "alpha", "beta", "pre", "rc", "a", "b", "c"])
            .map(|word| {
                let kind = match word {
                    "alpha" | "a" => PreKind::Alpha,
                    "beta" | "b" => PreKind::Beta,
                    _ => PreKind::Rc,
                };
                (kind, cursor.separated_number().unwrap_or(0))
            });

        let post = if cursor.rest.starts_with('-')
            && cursor.rest[1..].starts_with(|c: char| c.is_ascii_digit())
        {
            cursor.rest = &cursor.rest[1..];
            cursor.number()
        } else {
            cursor
                .keyword(&["post", "rev", "r"])
                .map(|_| cursor.separated_number().unwrap_or(0))
        };

        let dev = cursor
            .keyword(&["dev"])
            .map(|_| cursor.separated_number().unwrap_or(0));

        if !cursor.rest.is_empty() {
            return Err(invalid(&format!("unexpected trailing '{}'", cursor.rest)));
        }

        let local = match local {
            Some(label) => parse_local(label).ok_or_else(|| invalid("bad local version label"))?,
            None => Vec::new(),
        };

        Ok(Self {
            original: trimmed.to_string(),
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<(PreKind, u64)> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn has_local(&self) -> bool {
        !self.local.is_empty()
    }

    /// Pre-releases and dev releases are both excluded by default when filtering.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    pub fn is_devrelease(&self) -> bool {
        self.dev.is_some()
    }

    /// The version without its local label.
    pub fn public(&self) -> Version {
        Version {
            local: Vec::new(),
            original: self.public_string(),
            ..self.clone()
        }
    }

    /// Epoch and release segments only (`1!2.0.post3.dev1` becomes `1!2.0`).
    pub fn base_version(&self) -> Version {
        let mut base = Version {
            original: String::new(),
            epoch: self.epoch,
            release: self.release.clone(),
            pre: None,
            post: None,
            dev: None,
            local: Vec::new(),
        };
        base.original = base.normalized();
        base
    }

    /// The canonical PEP 440 spelling.
    pub fn normalized(&self) -> String {
        let mut out = self.public_string();
        if !self.local.is_empty() {
            let label: Vec<String> = self.local.iter().map(|s| s.to_string()).collect();
            out.push('+');
            out.push_str(&label.join("."));
        }
        out
    }

    fn public_string(&self) -> String {
        let mut out = String::new();
        if self.epoch != 0 {
            out.push_str(&format!("{}!", self.epoch));
        }
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        out.push_str(&release.join("."));
        if let Some((kind, n)) = self.pre {
            out.push_str(&format!("{}{n}", kind.as_str()));
        }
        if let Some(n) = self.post {
            out.push_str(&format!(".post{n}"));
        }
        if let Some(n) = self.dev {
            out.push_str(&format!(".dev{n}"));
        }
        out
    }

    fn sort_key(&self) -> SortKey {
        let mut release = self.release.clone();
        while release.len() > 1 && release.last() == Some(&0) {
            release.pop();
        }
        let pre = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (Some((kind, n)), _, _) => PreKey::Pre(kind, n),
            (None, _, _) => PreKey::Final,
        };
        SortKey {
            epoch: self.epoch,
            release,
            pre,
            post: self.post,
            dev: self.dev.map_or(DevKey::Final, DevKey::Dev),
            local: self.local.clone(),
        }
    }
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn number(&mut self) -> Option<u64> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let n = self.rest[..end].parse().ok()?;
        self.rest = &self.rest[end..];
        Some(n)
    }

    /// Consume an optional `.`/`-`/`_` separator followed by one of `words`.
    fn keyword(&mut self, words: &[&'static str]) -> Option<&'static str> {
        let body = self.rest.trim_start_matches(['.', '-', '_']);
        if self.rest.len() - body.len() > 1 {
            return None;
        }
        let word = *words.iter().find(|w| body.starts_with(**w))?;
        self.rest = &body[word.len()..];
        Some(word)
    }

    /// Consume an optional separator followed by a number, or nothing at all.
    fn separated_number(&mut self) -> Option<u64> {
        let saved = self.rest;
        let body = self.rest.strip_prefix(['.', '-', '_']).unwrap_or(self.rest);
        self.rest = body;
        let n = self.number();
        if n.is_none() {
            self.rest = saved;
        }
        n
    }
}

fn parse_local(label: &str) -> Option<Vec<LocalSegment>> {
    label
        .split(['.', '-', '_'])
        .map(|seg| {
            if seg.is_empty() || !seg.chars().all(|c| c.is_ascii_alphanumeric()) {
                None
            } else if let Ok(n) = seg.parse::<u64>() {
                Some(LocalSegment::Number(n))
            } else {
                Some(LocalSegment::Text(seg.to_string()))
            }
        })
        .collect()
}

impl FromStr for Version {
    type Err = ReqfoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn basic_ordering() {
        assert!(v("1.0") < v("2.0"));
        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("1.0.1") < v("1.1.0"));
        assert!(v("1.9") < v("1.10"));
    }

    #[test]
    fn suffix_ordering() {
        let ordered = [
            "1.0.dev0",
            "1.0a1",
            "1.0a2.dev1",
            "1.0a2",
            "1.0b1",
            "1.0rc1",
            "1.0",
            "1.0+local",
            "1.0.post1.dev0",
            "1.0.post1",
            "1.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn epoch_dominates() {
        assert!(v("1!0.1") > v("2024.1"));
    }

    #[test]
    fn trailing_zeros_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("2"), v("2.0.0.0"));
    }

    #[test]
    fn spelling_variants_normalize() {
        assert_eq!(v("1.0-alpha.1").normalized(), "1.0a1");
        assert_eq!(v("1.0.preview2").normalized(), "1.0rc2");
        assert_eq!(v("1.0-1").normalized(), "1.0.post1");
        assert_eq!(v("1.0.rev").normalized(), "1.0.post0");
        assert_eq!(v("V1.0.DEV").normalized(), "1.0.dev0");
        assert_eq!(v("1.0+Ubuntu-1").normalized(), "1.0+ubuntu.1");
        assert_eq!(v("1.0c1"), v("1.0rc1"));
    }

    #[test]
    fn prerelease_flags() {
        assert!(v("2.0b3").is_prerelease());
        assert!(v("2.0.dev1").is_prerelease());
        assert!(!v("2.0.post1").is_prerelease());
        assert!(v("2.0.post1").is_postrelease());
        assert!(!v("2.0").is_prerelease());
    }

    #[test]
    fn base_and_public() {
        let ver = v("1!2.3rc1.post2+abc.5");
        assert_eq!(ver.base_version().to_string(), "1!2.3");
        assert_eq!(ver.public().to_string(), "1!2.3rc1.post2");
        assert!(ver.has_local());
        assert!(!ver.public().has_local());
    }

    #[test]
    fn local_numeric_beats_text() {
        assert!(v("1.0+abc") < v("1.0+5"));
        assert!(v("1.0+1.2") < v("1.0+1.10"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("not-a-version").is_err());
        assert!(Version::parse("1.0-foo").is_err());
        assert!(Version::parse("1.0+").is_err());
        assert!(Version::parse("x!1.0").is_err());
    }

    #[test]
    fn hash_consistent_with_eq() {
        use std::collections::HashSet;
        let set: HashSet<Version> = ["1.0", "1.0.0", "1.0.0.0"].iter().map(|s| v(s)).collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_keeps_original() {
        assert_eq!(v("1.8.0").to_string(), "1.8.0");
        assert_eq!(v(" 2.0-RC1 ").to_string(), "2.0-RC1");
    }
}
