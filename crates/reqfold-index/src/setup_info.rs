//! Metadata of an unpacked source tree: what a project declares about
//! itself before it is built.
//!
//! Sources are consulted in order, each filling only what is still unknown:
//! `setup.cfg`, the `[project]` table of `pyproject.toml`, a fresh
//! `python setup.py egg_info` run, and finally any `*.egg-info` or
//! `PKG-INFO` already present in the tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use reqfold_core::requirement::canonical_name;
use reqfold_util::errors::ReqfoldError;
use reqfold_util::process::CommandBuilder;

use crate::metadata::{parse_core_metadata, parse_requires_txt};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Unconditional requirements (they may still carry environment markers).
    pub requires: Vec<String>,
    /// Requirements per extra, keyed by canonical extra name.
    pub extras: BTreeMap<String, Vec<String>>,
    pub build_requires: Vec<String>,
    pub build_backend: Option<String>,
    pub python_requires: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default, rename = "build-system")]
    build_system: Option<BuildSystem>,
    #[serde(default)]
    project: Option<ProjectTable>,
}

#[derive(Debug, Default, Deserialize)]
struct BuildSystem {
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default, rename = "build-backend")]
    build_backend: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectTable {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: Option<Vec<String>>,
    #[serde(default, rename = "optional-dependencies")]
    optional_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "requires-python")]
    requires_python: Option<String>,
}

impl SetupInfo {
    /// Gather metadata for the source tree at `root`, running `python` on a
    /// legacy `setup.py` when the static files are not enough.
    pub fn from_tree(root: &Path, python: &str) -> miette::Result<Self> {
        let mut info = SetupInfo::default();

        if let Some(cfg) = read_setup_cfg(&root.join("setup.cfg"))? {
            info.fill_from(cfg);
        }
        let pyproject = root.join("pyproject.toml");
        if pyproject.is_file() {
            info.fill_from(read_pyproject(&pyproject)?);
        }

        let setup_py = root.join("setup.py");
        if setup_py.is_file() && !info.is_complete() {
            match run_egg_info(root, python) {
                Ok(generated) => info.fill_from(generated),
                Err(e) => tracing::debug!("egg_info failed in {}: {e}", root.display()),
            }
        }

        if !info.is_complete() {
            for egg_info in find_egg_info_dirs(root) {
                info.fill_from(read_egg_info(&egg_info)?);
            }
            let pkg_info = root.join("PKG-INFO");
            if pkg_info.is_file() {
                info.fill_from(read_pkg_info(&pkg_info)?);
            }
        }

        if info.name.is_none() {
            return Err(ReqfoldError::Metadata {
                message: format!("No project metadata found in {}", root.display()),
            }
            .into());
        }
        Ok(info)
    }

    /// Requirements for an install with the given extras.
    pub fn dependencies(&self, extras: &BTreeSet<String>) -> Vec<String> {
        let mut deps = self.requires.clone();
        for extra in extras {
            if let Some(lines) = self.extras.get(&canonical_name(extra)) {
                deps.extend(lines.iter().cloned());
            }
        }
        deps
    }

    fn is_complete(&self) -> bool {
        self.name.is_some() && (!self.requires.is_empty() || !self.extras.is_empty())
    }

    fn fill_from(&mut self, other: SetupInfo) {
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.version.is_none() {
            self.version = other.version;
        }
        if self.requires.is_empty() {
            self.requires = other.requires;
        }
        if self.extras.is_empty() {
            self.extras = other.extras;
        }
        if self.build_requires.is_empty() {
            self.build_requires = other.build_requires;
        }
        if self.build_backend.is_none() {
            self.build_backend = other.build_backend;
        }
        if self.python_requires.is_none() {
            self.python_requires = other.python_requires;
        }
    }
}

/// Read `[metadata]`, `[options]` and `[options.extras_require]` from a `setup.cfg`.
pub fn read_setup_cfg(path: &Path) -> miette::Result<Option<SetupInfo>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(ReqfoldError::Io)?;
    let sections = parse_ini(&text);
    let base = path.parent().unwrap_or(Path::new("."));

    let get = |section: &str, key: &str| {
        sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let mut info = SetupInfo {
        name: get("metadata", "name"),
        version: get("metadata", "version").filter(|v| !v.starts_with("attr:")),
        python_requires: get("options", "python_requires"),
        ..SetupInfo::default()
    };
    if let Some(value) = get("options", "install_requires") {
        info.requires = list_value(&value, base);
    }
    if let Some(value) = get("options", "setup_requires") {
        info.build_requires = list_value(&value, base);
    }
    if let Some(extras) = sections.get("options.extras_require") {
        for (extra, value) in extras {
            info.extras
                .insert(canonical_name(extra), list_value(value, base));
        }
    }
    Ok(Some(info))
}

/// Read `[build-system]` and the static parts of `[project]` from a `pyproject.toml`.
pub fn read_pyproject(path: &Path) -> miette::Result<SetupInfo> {
    let text = fs::read_to_string(path).map_err(ReqfoldError::Io)?;
    let doc: PyProject = toml::from_str(&text).map_err(|e| ReqfoldError::Metadata {
        message: format!("Failed to parse {}: {e}", path.display()),
    })?;

    let mut info = SetupInfo::default();
    if let Some(build) = doc.build_system {
        info.build_requires = build.requires;
        info.build_backend = build.build_backend;
    }
    if let Some(project) = doc.project {
        info.name = project.name;
        info.version = project.version;
        info.requires = project.dependencies.unwrap_or_default();
        info.python_requires = project.requires_python;
        info.extras = project
            .optional_dependencies
            .into_iter()
            .map(|(extra, deps)| (canonical_name(&extra), deps))
            .collect();
    }
    Ok(info)
}

/// Read an `*.egg-info` directory (`PKG-INFO` plus `requires.txt`).
pub fn read_egg_info(dir: &Path) -> miette::Result<SetupInfo> {
    let mut info = read_pkg_info(&dir.join("PKG-INFO"))?;
    let requires_txt = dir.join("requires.txt");
    if requires_txt.is_file() {
        let text = fs::read_to_string(&requires_txt).map_err(ReqfoldError::Io)?;
        info.requires = parse_requires_txt(&text);
    }
    Ok(info)
}

fn read_pkg_info(path: &Path) -> miette::Result<SetupInfo> {
    let text = fs::read_to_string(path).map_err(ReqfoldError::Io)?;
    let meta = parse_core_metadata(&text)?;
    Ok(SetupInfo {
        name: Some(meta.name),
        version: Some(meta.version),
        requires: meta.requires_dist,
        python_requires: meta.requires_python,
        ..SetupInfo::default()
    })
}

/// Run `python setup.py egg_info` into a scratch directory and read the result.
pub fn run_egg_info(root: &Path, python: &str) -> miette::Result<SetupInfo> {
    let egg_base = tempfile::tempdir().map_err(ReqfoldError::Io)?;
    CommandBuilder::new(python)
        .args(["setup.py", "egg_info", "--egg-base"])
        .arg(egg_base.path().to_string_lossy())
        .cwd(root)
        .exec_checked()?;
    let dir = find_egg_info_dirs(egg_base.path())
        .into_iter()
        .next()
        .ok_or_else(|| ReqfoldError::Metadata {
            message: format!("egg_info produced no metadata for {}", root.display()),
        })?;
    read_egg_info(&dir)
}

fn find_egg_info_dirs(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = [root.to_path_buf(), root.join("src")]
        .iter()
        .filter_map(|dir| fs::read_dir(dir).ok())
        .flatten()
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(".egg-info"))
        })
        .collect();
    found.sort();
    found
}

/// A list option: one entry per line, or `file: a.txt, b.txt` to read
/// requirement files relative to `base`.
fn list_value(value: &str, base: &Path) -> Vec<String> {
    if let Some(files) = value.trim().strip_prefix("file:") {
        return files
            .split(',')
            .map(str::trim)
            .filter_map(|f| fs::read_to_string(base.join(f)).ok())
            .flat_map(|text| requirement_lines(&text))
            .collect();
    }
    requirement_lines(value)
}

fn requirement_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Minimal INI reader: `[section]` headers, `key = value` (or `key: value`)
/// pairs, and indented continuation lines. Keys are lowercased with `-`
/// folded to `_`, as setuptools does.
fn parse_ini(text: &str) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut section = String::new();
    let mut key: Option<String> = None;

    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        if raw.starts_with([' ', '\t']) && !trimmed.is_empty() {
            if let Some(k) = &key {
                if let Some(value) = sections.get_mut(&section).and_then(|s| s.get_mut(k)) {
                    value.push('\n');
                    value.push_str(trimmed);
                }
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if let Some(name) = trimmed.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            section = name.trim().to_string();
            key = None;
            sections.entry(section.clone()).or_default();
            continue;
        }
        let split = trimmed.find(['=', ':']);
        if let Some(i) = split {
            let k = trimmed[..i].trim().to_ascii_lowercase().replace('-', "_");
            let v = trimmed[i + 1..].trim().to_string();
            sections.entry(section.clone()).or_default().insert(k.clone(), v);
            key = Some(k);
        }
    }
    sections
}
