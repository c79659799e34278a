//! Source archive extraction.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use reqfold_util::errors::ReqfoldError;

/// Unpack the source distribution `filename` (contents in `data`) into
/// `dest` and return the directory holding its sources. Archives with a
/// single wrapper directory (`pkg-1.0/`) return that directory.
pub fn unpack_sdist(filename: &str, data: &[u8], dest: &Path) -> miette::Result<PathBuf> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".zip") {
        extract_zip(data, dest)?;
    } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
        extract_tar_gz(data, dest)?;
    } else {
        return Err(ReqfoldError::Metadata {
            message: format!("Unsupported archive format: {filename}"),
        }
        .into());
    }
    Ok(source_root(dest))
}

/// Extract a zip archive to `dest`.
pub fn extract_zip(data: &[u8], dest: &Path) -> miette::Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| ReqfoldError::Metadata {
        message: format!("Failed to open zip: {e}"),
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ReqfoldError::Metadata {
            message: format!("Zip entry error: {e}"),
        })?;

        let out_path = dest.join(entry.mangled_name());

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(ReqfoldError::Io)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(ReqfoldError::Io)?;
            }
            let mut buf = Vec::new();
            entry
                .read_to_end(&mut buf)
                .map_err(|e| ReqfoldError::Metadata {
                    message: format!("Failed to read zip entry: {e}"),
                })?;
            let mut out = fs::File::create(&out_path).map_err(ReqfoldError::Io)?;
            out.write_all(&buf).map_err(ReqfoldError::Io)?;
        }
    }
    Ok(())
}

/// Extract a gzip-compressed tarball to `dest`.
pub fn extract_tar_gz(data: &[u8], dest: &Path) -> miette::Result<()> {
    let gz = flate2::bufread::GzDecoder::new(data);
    let mut archive = tar::Archive::new(gz);
    archive.unpack(dest).map_err(|e| {
        ReqfoldError::Metadata {
            message: format!("Failed to unpack tarball: {e}"),
        }
        .into()
    })
}

/// `dir` itself, or its only child when it holds exactly one directory.
fn source_root(dir: &Path) -> PathBuf {
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    match entries.as_slice() {
        [only] if only.is_dir() => only.clone(),
        _ => dir.to_path_buf(),
    }
}
