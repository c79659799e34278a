//! PEP 440 version specifiers and the range algebra built on them.
//!
//! A [`SpecifierSet`] is a conjunction of [`Specifier`] clauses such as
//! `>=1.0,<3,!=1.5.*`. Intersection never fails: it simply collects the
//! clauses of both sides, and whether the result is satisfiable is decided
//! later against concrete versions.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use reqfold_util::errors::ReqfoldError;

use crate::version::Version;

/// Comparison operator of a single specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `~=`
    Compatible,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `===`
    Arbitrary,
}

impl Operator {
    // Longest tokens first so `===` is not read as `==`.
    const TOKENS: [(&'static str, Operator); 8] = [
        ("===", Operator::Arbitrary),
        ("~=", Operator::Compatible),
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("<=", Operator::LessEqual),
        (">=", Operator::GreaterEqual),
        ("<", Operator::Less),
        (">", Operator::Greater),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Compatible => "~=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Arbitrary => "===",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One clause of a specifier set, e.g. `>=1.0` or `==2.1.*`.
#[derive(Debug, Clone)]
pub struct Specifier {
    operator: Operator,
    text: String,
    wildcard: bool,
    version: Option<Version>,
}

impl Specifier {
    pub fn parse(input: &str) -> Result<Self, ReqfoldError> {
        let compact: String = input.split_whitespace().collect();
        let invalid = |message: &str| ReqfoldError::InvalidVersion {
            version: compact.clone(),
            message: message.to_string(),
        };

        let (token, operator) = Operator::TOKENS
            .iter()
            .find(|(token, _)| compact.starts_with(token))
            .copied()
            .ok_or_else(|| invalid("specifier must start with an operator"))?;
        let text = compact[token.len()..].to_string();
        if text.is_empty() {
            return Err(invalid("missing version after operator"));
        }

        if operator == Operator::Arbitrary {
            return Ok(Self {
                operator,
                version: Version::parse(&text).ok(),
                text,
                wildcard: false,
            });
        }

        let wildcard = text.ends_with(".*");
        let version_text = text.strip_suffix(".*").unwrap_or(&text);
        if wildcard && !matches!(operator, Operator::Equal | Operator::NotEqual) {
            return Err(invalid("prefix matching is only allowed with == and !="));
        }

        let version = Version::parse(version_text)?;
        if wildcard && (version.pre().is_some() || version.is_postrelease() || version.is_devrelease())
        {
            return Err(invalid("prefix match must name release segments only"));
        }
        if version.has_local() && !matches!(operator, Operator::Equal | Operator::NotEqual) {
            return Err(invalid("local versions are only allowed with == and !="));
        }
        if wildcard && version.has_local() {
            return Err(invalid("prefix match cannot carry a local label"));
        }
        if operator == Operator::Compatible && version.release().len() < 2 {
            return Err(invalid("~= needs at least two release segments"));
        }

        Ok(Self {
            operator,
            text,
            wildcard,
            version: Some(version),
        })
    }

    /// Exact-version specifier `==version`.
    pub fn exact(version: &Version) -> Self {
        Self {
            operator: Operator::Equal,
            text: version.to_string(),
            wildcard: false,
            version: Some(version.clone()),
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Whether this clause names a pre-release and therefore opts into them.
    pub fn prereleases(&self) -> bool {
        self.operator != Operator::NotEqual
            && self.version.as_ref().is_some_and(Version::is_prerelease)
    }

    /// Whether `candidate` satisfies this clause, ignoring pre-release policy.
    pub fn contains(&self, candidate: &Version) -> bool {
        let Some(spec) = &self.version else {
            return self.operator == Operator::Arbitrary
                && candidate.to_string().eq_ignore_ascii_case(&self.text);
        };

        match self.operator {
            Operator::Arbitrary => candidate.to_string().eq_ignore_ascii_case(&self.text),
            Operator::Equal => self.equals(candidate, spec),
            Operator::NotEqual => !self.equals(candidate, spec),
            Operator::LessEqual => candidate.public() <= *spec,
            Operator::GreaterEqual => candidate.public() >= *spec,
            Operator::Less => {
                candidate < spec
                    && !(!spec.is_prerelease()
                        && candidate.is_prerelease()
                        && candidate.base_version() == spec.base_version())
            }
            Operator::Greater => {
                if candidate <= spec {
                    return false;
                }
                let same_base = candidate.base_version() == spec.base_version();
                if !spec.is_postrelease() && candidate.is_postrelease() && same_base {
                    return false;
                }
                !(candidate.has_local() && same_base)
            }
            Operator::Compatible => {
                let prefix = &spec.release()[..spec.release().len() - 1];
                candidate.public() >= *spec && release_prefix_matches(candidate, spec.epoch(), prefix)
            }
        }
    }

    fn equals(&self, candidate: &Version, spec: &Version) -> bool {
        if self.wildcard {
            release_prefix_matches(candidate, spec.epoch(), spec.release())
        } else if spec.has_local() {
            candidate == spec
        } else {
            candidate.public() == *spec
        }
    }
}

fn release_prefix_matches(candidate: &Version, epoch: u64, prefix: &[u64]) -> bool {
    if candidate.epoch() != epoch {
        return false;
    }
    let release = candidate.release();
    prefix
        .iter()
        .enumerate()
        .all(|(i, n)| release.get(i).copied().unwrap_or(0) == *n)
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.text)
    }
}

impl FromStr for Specifier {
    type Err = ReqfoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specifier::parse(s)
    }
}

impl PartialEq for Specifier {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Specifier {}

impl Hash for Specifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Ord for Specifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for Specifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A conjunction of specifier clauses. The empty set matches every version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpecifierSet {
    // Sorted by display string, no duplicates.
    specs: Vec<Specifier>,
}

impl SpecifierSet {
    /// Parse a comma separated list of clauses (`>=1.0, <2`). Blank input is the empty set.
    pub fn parse(input: &str) -> Result<Self, ReqfoldError> {
        let specs = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Specifier::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_specs(specs))
    }

    pub fn from_specs(specs: impl IntoIterator<Item = Specifier>) -> Self {
        let specs: BTreeSet<Specifier> = specs.into_iter().collect();
        Self {
            specs: specs.into_iter().collect(),
        }
    }

    /// The set `==version`.
    pub fn pinned(version: &Version) -> Self {
        Self {
            specs: vec![Specifier::exact(version)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specs.iter()
    }

    /// True when any clause names a pre-release.
    pub fn prereleases(&self) -> bool {
        self.specs.iter().any(Specifier::prereleases)
    }

    /// Membership test. Pre-releases only match when allowed explicitly or
    /// when a clause names one.
    pub fn contains(&self, version: &Version, allow_prereleases: bool) -> bool {
        if version.is_prerelease() && !(allow_prereleases || self.prereleases()) {
            return false;
        }
        self.specs.iter().all(|spec| spec.contains(version))
    }

    /// The subset of `versions` this set admits.
    pub fn filter<'a>(
        &self,
        versions: impl IntoIterator<Item = &'a Version>,
        allow_prereleases: bool,
    ) -> BTreeSet<Version> {
        versions
            .into_iter()
            .filter(|v| self.contains(v, allow_prereleases))
            .cloned()
            .collect()
    }

    /// Conjunction of both sets. An unconstrained side contributes nothing,
    /// so it never widens a real bound.
    pub fn intersect(&self, other: &SpecifierSet) -> SpecifierSet {
        Self::from_specs(self.specs.iter().chain(other.specs.iter()).cloned())
    }

    /// A single `==V` clause (without wildcard) or an arbitrary `===` match.
    pub fn is_pinned(&self) -> bool {
        match self.specs.as_slice() {
            [spec] => match spec.operator {
                Operator::Equal => !spec.wildcard,
                Operator::Arbitrary => true,
                _ => false,
            },
            _ => false,
        }
    }

    /// The version a pinned set names.
    pub fn pinned_version(&self) -> Option<&Version> {
        if self.is_pinned() {
            self.specs[0].version.as_ref()
        } else {
            None
        }
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.specs.iter().map(|s| s.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}

impl FromStr for SpecifierSet {
    type Err = ReqfoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecifierSet::parse(s)
    }
}
