#![allow(dead_code)]

use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use reqfold_core::candidate::Candidate;
use reqfold_core::link::Link;
use reqfold_core::requirement::Requirement;
use reqfold_core::version::Version;
use reqfold_resolver::provider::{
    FullResolver, IndexQuery, MetadataError, MetadataService, ReleaseMetadata,
};
use zip::write::SimpleFileOptions;

/// An index that counts its queries.
#[derive(Default)]
pub struct CountingIndex {
    projects: BTreeMap<String, Vec<Candidate>>,
    pub calls: Cell<usize>,
}

impl CountingIndex {
    pub fn project(mut self, name: &str, versions: &[&str]) -> Self {
        let candidates = versions
            .iter()
            .map(|v| {
                Candidate::new(
                    name,
                    Version::parse(v).unwrap(),
                    Some(Link::new(format!("https://files.example/{name}-{v}.tar.gz"))),
                )
            })
            .collect();
        self.projects.insert(name.to_string(), candidates);
        self
    }
}

impl IndexQuery for CountingIndex {
    fn find_all_candidates(&self, name: &str) -> miette::Result<Vec<Candidate>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.projects.get(name).cloned().unwrap_or_default())
    }
}

/// A metadata service holding fixed release documents.
#[derive(Default)]
pub struct CountingMetadata {
    releases: BTreeMap<String, Vec<String>>,
    pub calls: Cell<usize>,
}

impl CountingMetadata {
    pub fn release(mut self, key: &str, requires: &[&str]) -> Self {
        self.releases
            .insert(key.to_string(), requires.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl MetadataService for CountingMetadata {
    fn get(&self, name: &str, version: &str) -> Result<ReleaseMetadata, MetadataError> {
        self.calls.set(self.calls.get() + 1);
        let requires = self
            .releases
            .get(&format!("{name}=={version}"))
            .cloned()
            .ok_or(MetadataError::NotFound)?;
        Ok(ReleaseMetadata {
            name: name.to_string(),
            version: version.to_string(),
            requires: Some(requires),
            requires_python: None,
        })
    }
}

/// A full resolver whose builds always break.
#[derive(Default)]
pub struct BrokenBuilds {
    pub calls: Cell<usize>,
}

impl FullResolver for BrokenBuilds {
    fn resolve_one(&self, requirement: &Requirement) -> miette::Result<Vec<Requirement>> {
        self.calls.set(self.calls.get() + 1);
        miette::bail!("setup.py egg_info failed for {requirement}")
    }
}

/// A minimal wheel for `name==version` declaring `requires`.
pub fn wheel_bytes(name: &str, version: &str, requires: &[&str]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        zip.start_file(
            format!("{name}-{version}.dist-info/METADATA"),
            SimpleFileOptions::default(),
        )
        .unwrap();
        let mut meta = format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n");
        for req in requires {
            meta.push_str(&format!("Requires-Dist: {req}\n"));
        }
        zip.write_all(meta.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}
