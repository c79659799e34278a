//! Core metadata (`METADATA`, `PKG-INFO`) and egg-info `requires.txt` parsing.

use reqfold_util::errors::ReqfoldError;

/// The fields of a core metadata document the resolver cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreMetadata {
    pub name: String,
    pub version: String,
    pub requires_dist: Vec<String>,
    pub provides_extra: Vec<String>,
    pub requires_python: Option<String>,
}

/// Parse an RFC 822 style metadata document. Only the header block is read;
/// the long description after the first blank line is ignored.
pub fn parse_core_metadata(text: &str) -> Result<CoreMetadata, ReqfoldError> {
    let mut meta = CoreMetadata::default();
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    for (key, value) in headers {
        match key.as_str() {
            "name" => meta.name = value,
            "version" => meta.version = value,
            "requires-dist" => meta.requires_dist.push(value),
            "provides-extra" => meta.provides_extra.push(value),
            "requires-python" if !value.is_empty() => meta.requires_python = Some(value),
            _ => {}
        }
    }

    if meta.name.is_empty() || meta.version.is_empty() {
        return Err(ReqfoldError::Metadata {
            message: "metadata is missing Name or Version".to_string(),
        });
    }
    Ok(meta)
}

/// Convert an egg-info `requires.txt` into requirement lines. Section headers
/// `[extra]`, `[:marker]` and `[extra:marker]` become marker clauses on the
/// requirements that follow them.
pub fn parse_requires_txt(text: &str) -> Vec<String> {
    let mut section_marker: Option<String> = None;
    let mut requires = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section_marker = section_to_marker(inner);
            continue;
        }
        match &section_marker {
            None => requires.push(line.to_string()),
            Some(marker) if line.contains(';') => requires.push(format!("{line} and {marker}")),
            Some(marker) => requires.push(format!("{line}; {marker}")),
        }
    }
    requires
}

fn section_to_marker(section: &str) -> Option<String> {
    let (extra, marker) = match section.split_once(':') {
        Some((extra, marker)) => (extra.trim(), marker.trim()),
        None => (section.trim(), ""),
    };
    match (extra.is_empty(), marker.is_empty()) {
        (true, true) => None,
        (false, true) => Some(format!("extra == \"{extra}\"")),
        (true, false) => Some(marker.to_string()),
        (false, false) => Some(format!("({marker}) and extra == \"{extra}\"")),
    }
}
