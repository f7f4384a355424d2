use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::types::JobFile;

/// Job file extensions to scan for
const JOB_EXTENSIONS: &[&str] = &["toml", "json"];

/// Check if a path has a job file extension
pub fn is_job_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return JOB_EXTENSIONS.contains(&ext_str.to_lowercase().as_str());
        }
    }
    false
}

/// Scan a directory recursively for job files and invoke a callback for each file found
pub fn scan_streaming<F>(root: &Path, mut on_file: F) -> Result<()>
where
    F: FnMut(PathBuf),
{
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_job_file(path) {
            on_file(path.to_path_buf());
        }
    }

    Ok(())
}

/// Scan a directory recursively for job files, in file-name order
pub fn scan(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    scan_streaming(root, |path| files.push(path))?;
    Ok(files)
}

/// Read a TOML or JSON job file, chosen by extension
pub fn load_job(path: &Path) -> Result<JobFile> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON job {}", path.display())),
        Some("toml") => toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML job {}", path.display())),
        _ => bail!("{} is not a .toml or .json job file", path.display()),
    }
}
