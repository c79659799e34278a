//! Distribution filename parsing (wheels and source archives).

use reqfold_core::requirement::canonical_name;
use reqfold_core::version::Version;

const SDIST_SUFFIXES: [&str; 6] = [".tar.gz", ".tgz", ".zip", ".tar.bz2", ".tar.xz", ".tar"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistKind {
    Wheel,
    Sdist,
}

/// What a distribution filename says about its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistFilename {
    pub name: String,
    pub version: Version,
    pub kind: DistKind,
    /// Wheel python tag, e.g. `py3` or `cp311`.
    pub python_tag: Option<String>,
}

/// Parse `filename` as a distribution of `project`.
///
/// Returns `None` for files that are not wheels or sdists (eggs, installers),
/// belong to another project, or carry an unparseable version.
pub fn parse_filename(filename: &str, project: &str) -> Option<DistFilename> {
    if let Some(stem) = filename.strip_suffix(".whl") {
        return parse_wheel(stem, project);
    }
    let lower = filename.to_ascii_lowercase();
    let suffix = SDIST_SUFFIXES.iter().find(|s| lower.ends_with(*s))?;
    let stem = &filename[..filename.len() - suffix.len()];
    parse_sdist(stem, project)
}

fn parse_wheel(stem: &str, project: &str) -> Option<DistFilename> {
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() != 5 && parts.len() != 6 {
        return None;
    }
    if canonical_name(parts[0]) != canonical_name(project) {
        return None;
    }
    Some(DistFilename {
        name: parts[0].to_string(),
        version: Version::parse(parts[1]).ok()?,
        kind: DistKind::Wheel,
        python_tag: Some(parts[parts.len() - 3].to_string()),
    })
}

fn parse_sdist(stem: &str, project: &str) -> Option<DistFilename> {
    let wanted = canonical_name(project);
    // Legacy sdist names may themselves contain dashes, so try every split
    // point until the prefix matches the project.
    let (name, version) = stem
        .match_indices('-')
        .map(|(i, _)| (&stem[..i], &stem[i + 1..]))
        .find(|(name, _)| canonical_name(name) == wanted)?;
    Some(DistFilename {
        name: name.to_string(),
        version: Version::parse(version).ok()?,
        kind: DistKind::Sdist,
        python_tag: None,
    })
}
