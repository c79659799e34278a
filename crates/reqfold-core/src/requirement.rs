//! PEP 508 requirement lines.
//!
//! A [`Requirement`] is immutable once built: every `with_*` method returns a
//! new value and recomputes the [`RequirementKind`] so that pinned and
//! editable status can never drift from the specifier.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use reqfold_util::errors::ReqfoldError;

use crate::link::Link;
use crate::marker::Marker;
use crate::specifier::SpecifierSet;
use crate::version::Version;

/// Normalise a project name per PEP 503: lowercase, runs of `-_.` become `-`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push('-');
        }
        pending_separator = false;
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// How a requirement selects its artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementKind {
    /// Any version admitted by the specifier; candidates come from the index.
    Ranged,
    /// Exactly one release.
    Pinned(Version),
    /// A local, mutable source tree. Never version-filtered, never cached.
    Editable,
}

#[derive(Debug, Clone)]
pub struct Requirement {
    name: String,
    specifier: SpecifierSet,
    markers: Option<Marker>,
    extras: BTreeSet<String>,
    link: Option<Link>,
    constraint: bool,
    parent: Option<Arc<Requirement>>,
    kind: RequirementKind,
}

impl Requirement {
    /// A requirement on `name` restricted by `specifier`.
    pub fn new(name: impl Into<String>, specifier: SpecifierSet) -> Self {
        let kind = kind_for(&specifier, false);
        Self {
            name: name.into(),
            specifier,
            markers: None,
            extras: BTreeSet::new(),
            link: None,
            constraint: false,
            parent: None,
            kind,
        }
    }

    /// `name==version`.
    pub fn pinned(name: impl Into<String>, version: &Version) -> Self {
        Self::new(name, SpecifierSet::pinned(version))
    }

    /// An editable install of the source tree at `link`.
    pub fn editable(name: impl Into<String>, link: Link) -> Self {
        Self {
            link: Some(link),
            kind: RequirementKind::Editable,
            ..Self::new(name, SpecifierSet::default())
        }
    }

    /// Parse one requirement line: `name[extras] specs ; markers`,
    /// `name @ url ; markers`, or `-e <path-or-url>[#egg=name]`.
    /// Trailing ` # comments` are ignored.
    pub fn parse(input: &str) -> Result<Self, ReqfoldError> {
        let line = strip_comment(input).trim();
        let invalid = |message: &str| ReqfoldError::InvalidRequirement {
            line: input.trim().to_string(),
            message: message.to_string(),
        };
        if line.is_empty() {
            return Err(invalid("empty requirement"));
        }

        if let Some(target) = line
            .strip_prefix("--editable")
            .or_else(|| line.strip_prefix("-e"))
        {
            let target = target.trim_start_matches([' ', '\t', '=']).trim();
            return parse_editable(input, target);
        }

        let name_end = line
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(line.len());
        let name = &line[..name_end];
        if !is_valid_name(name) {
            return Err(invalid("missing or malformed project name"));
        }

        let mut rest = line[name_end..].trim_start();
        let mut extras = BTreeSet::new();
        if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']').ok_or_else(|| invalid("unclosed extras bracket"))?;
            extras = parse_extras(&after[..close]).ok_or_else(|| invalid("malformed extra name"))?;
            rest = after[close + 1..].trim_start();
        }

        let (specifier, link, marker_text) = if let Some(url_part) = rest.strip_prefix('@') {
            let (url, markers) = split_url_markers(url_part.trim_start());
            if url.is_empty() {
                return Err(invalid("missing URL after '@'"));
            }
            (SpecifierSet::default(), Some(Link::new(url)), markers)
        } else {
            let (spec_text, markers) = match rest.split_once(';') {
                Some((spec, markers)) => (spec, Some(markers)),
                None => (rest, None),
            };
            let spec_text = spec_text.trim();
            let spec_text = spec_text
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(spec_text);
            let specifier =
                SpecifierSet::parse(spec_text).map_err(|e| invalid(&e.to_string()))?;
            (specifier, None, markers)
        };

        let markers = match marker_text.map(str::trim).filter(|m| !m.is_empty()) {
            Some(text) => Some(Marker::parse(text).map_err(|_| invalid("malformed marker"))?),
            None => None,
        };

        Ok(Self {
            markers,
            extras,
            link,
            ..Self::new(name, specifier)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn canonical_name(&self) -> String {
        canonical_name(&self.name)
    }

    pub fn specifier(&self) -> &SpecifierSet {
        &self.specifier
    }

    pub fn markers(&self) -> Option<&Marker> {
        self.markers.as_ref()
    }

    pub fn extras(&self) -> &BTreeSet<String> {
        &self.extras
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    /// True when this entry came from a constraints file rather than a direct request.
    pub fn is_constraint(&self) -> bool {
        self.constraint
    }

    /// The requirement that declared this one, if it is a transitive edge.
    pub fn parent(&self) -> Option<&Arc<Requirement>> {
        self.parent.as_ref()
    }

    pub fn kind(&self) -> &RequirementKind {
        &self.kind
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self.kind, RequirementKind::Pinned(_))
    }

    pub fn is_editable(&self) -> bool {
        self.kind == RequirementKind::Editable
    }

    /// The exact version of a pinned requirement.
    pub fn version(&self) -> Option<&Version> {
        match &self.kind {
            RequirementKind::Pinned(version) => Some(version),
            _ => None,
        }
    }

    pub fn with_specifier(self, specifier: SpecifierSet) -> Self {
        let kind = kind_for(&specifier, self.is_editable());
        Self {
            specifier,
            kind,
            ..self
        }
    }

    pub fn with_markers(self, markers: Option<Marker>) -> Self {
        Self { markers, ..self }
    }

    pub fn with_extras(self, extras: impl IntoIterator<Item = String>) -> Self {
        Self {
            extras: extras.into_iter().map(|e| canonical_name(&e)).collect(),
            ..self
        }
    }

    pub fn with_link(self, link: Option<Link>) -> Self {
        Self { link, ..self }
    }

    pub fn with_constraint(self, constraint: bool) -> Self {
        Self { constraint, ..self }
    }

    pub fn with_parent(self, parent: Option<Arc<Requirement>>) -> Self {
        Self { parent, ..self }
    }

    /// Uniqueness key: canonical name plus sorted extras.
    pub fn key(&self) -> String {
        if self.extras.is_empty() {
            self.canonical_name()
        } else {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            format!("{}[{}]", self.canonical_name(), extras.join(","))
        }
    }

    /// Key into the persistent dependency cache (`name[extras]==version`).
    /// Only non-editable pinned requirements have one.
    pub fn cache_key(&self) -> Option<String> {
        match &self.kind {
            RequirementKind::Pinned(version) => Some(format!("{}=={}", self.key(), version)),
            _ => None,
        }
    }
}

fn kind_for(specifier: &SpecifierSet, editable: bool) -> RequirementKind {
    if editable {
        RequirementKind::Editable
    } else if let Some(version) = specifier.pinned_version() {
        RequirementKind::Pinned(version.clone())
    } else {
        RequirementKind::Ranged
    }
}

fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric(),
        _ => false,
    }
}

fn parse_extras(inner: &str) -> Option<BTreeSet<String>> {
    inner
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|e| is_valid_name(e).then(|| canonical_name(e)))
        .collect()
}

/// A comment starts at `#` at the beginning of the line or after whitespace,
/// so URL fragments such as `#egg=` survive.
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    line.char_indices()
        .find(|&(i, c)| c == '#' && line[..i].ends_with(char::is_whitespace))
        .map_or(line, |(i, _)| &line[..i])
}

/// In the URL form a marker separator must be preceded by whitespace.
fn split_url_markers(text: &str) -> (&str, Option<&str>) {
    match text
        .char_indices()
        .find(|&(i, c)| c == ';' && text[..i].ends_with(char::is_whitespace))
    {
        Some((i, _)) => (text[..i].trim(), Some(&text[i + 1..])),
        None => (text.trim(), None),
    }
}

fn parse_editable(original: &str, target: &str) -> Result<Requirement, ReqfoldError> {
    let invalid = |message: &str| ReqfoldError::InvalidRequirement {
        line: original.trim().to_string(),
        message: message.to_string(),
    };
    let target = target.trim_matches(['"', '\'']);
    if target.is_empty() {
        return Err(invalid("editable requirement needs a path or URL"));
    }

    let link = if target.contains("://") || target.starts_with("file:") {
        Link::new(target)
    } else {
        let (path, fragment) = match target.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (target, None),
        };
        let base = Link::from_path(Path::new(path));
        match fragment {
            Some(fragment) => Link::new(format!("{base}#{fragment}")),
            None => base,
        }
    };

    let (name, extras) = match link.fragment_value("egg") {
        Some(egg) => match egg.split_once('[') {
            Some((name, extras)) => (
                name.to_string(),
                parse_extras(extras.trim_end_matches(']'))
                    .ok_or_else(|| invalid("malformed extra name"))?,
            ),
            None => (egg.to_string(), BTreeSet::new()),
        },
        None => (
            link.filename().trim_end_matches(".git").to_string(),
            BTreeSet::new(),
        ),
    };
    if !is_valid_name(&name) {
        return Err(invalid("cannot determine project name; add #egg=<name>"));
    }

    Ok(Requirement {
        extras,
        ..Requirement::editable(name, link)
    })
}

impl FromStr for Requirement {
    type Err = ReqfoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::parse(s)
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_name() == other.canonical_name()
            && self.specifier == other.specifier
            && self.markers == other.markers
            && self.extras == other.extras
            && self.link == other.link
            && self.kind == other.kind
            && self.constraint == other.constraint
    }
}

impl Eq for Requirement {}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (RequirementKind::Editable, Some(link)) = (&self.kind, &self.link) {
            return write!(f, "-e {link}");
        }
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        write!(f, "{}", self.specifier)?;
        match (&self.link, self.specifier.is_empty()) {
            (Some(link), true) => {
                write!(f, " @ {link}")?;
                if let Some(markers) = &self.markers {
                    write!(f, " ; {markers}")?;
                }
            }
            _ => {
                if let Some(markers) = &self.markers {
                    write!(f, "; {markers}")?;
                }
            }
        }
        Ok(())
    }
}
