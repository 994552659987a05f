use crate::config::{Config, Discovery};
use crate::error::{ConvertError, Result};
use crate::formats::lowercase_extension;
use glob::glob;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Files found for one run, plus the subtrees that could not be listed.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<PathBuf>,
    pub unreadable: Vec<ConvertError>,
}

/// Resolves the configured work set.
pub fn discover(config: &Config) -> Result<ScanOutcome> {
    match &config.discovery {
        Discovery::Root(root) => scan_directory(root, &config.allowed_extensions),
        Discovery::Files(patterns) => resolve_files(patterns, &config.allowed_extensions),
    }
}

/// Depth-first walk of `root`, yielding absolute paths whose lowercase
/// extension is in `extensions`.
///
/// A directory that cannot be listed is logged and recorded in
/// [`ScanOutcome::unreadable`]; its siblings are still scanned. Only a root
/// that is missing, not a directory, or cannot be listed is an error.
pub fn scan_directory(root: &Path, extensions: &BTreeSet<String>) -> Result<ScanOutcome> {
    let canonical_root = root
        .canonicalize()
        .map_err(|_| ConvertError::RootNotFound(root.to_path_buf()))?;
    if !canonical_root.is_dir() {
        return Err(ConvertError::RootNotFound(root.to_path_buf()));
    }
    // An unlistable root means there is no work set at all.
    if let Err(e) = fs::read_dir(&canonical_root) {
        warn!("Cannot list {}: {}", canonical_root.display(), e);
        return Err(ConvertError::RootNotFound(root.to_path_buf()));
    }

    let mut outcome = ScanOutcome::default();
    let walker = WalkDir::new(&canonical_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| canonical_root.clone());
                warn!("Skipping unreadable directory {}: {}", path.display(), e);
                outcome.unreadable.push(ConvertError::SubtreeUnreadable {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if entry.file_type().is_file() && has_allowed_extension(entry.path(), extensions) {
            outcome.files.push(entry.into_path());
        }
    }

    debug!(
        "Scanned {}: {} candidate files",
        canonical_root.display(),
        outcome.files.len()
    );
    Ok(outcome)
}

/// Resolves explicit file arguments. Each one is taken literally when it
/// names an existing file, otherwise it is expanded as a glob pattern.
/// Fails only when nothing at all matched.
pub fn resolve_files(patterns: &[String], extensions: &BTreeSet<String>) -> Result<ScanOutcome> {
    let mut outcome = ScanOutcome::default();
    let mut matched_any = false;

    for pattern in patterns {
        let literal = Path::new(pattern);
        let candidates: Vec<PathBuf> = if literal.is_file() {
            vec![literal.to_path_buf()]
        } else {
            match glob(pattern) {
                Ok(paths) => paths.flatten().filter(|p| p.is_file()).collect(),
                Err(e) => {
                    warn!("Ignoring invalid pattern {:?}: {}", pattern, e);
                    Vec::new()
                }
            }
        };

        if candidates.is_empty() {
            warn!("No file matches {:?}", pattern);
            continue;
        }
        matched_any = true;

        for path in candidates {
            if !has_allowed_extension(&path, extensions) {
                warn!("Skipping {}: unsupported extension", path.display());
                continue;
            }
            let absolute = path.canonicalize().unwrap_or(path);
            if !outcome.files.contains(&absolute) {
                outcome.files.push(absolute);
            }
        }
    }

    if !matched_any {
        let first = patterns.first().cloned().unwrap_or_default();
        return Err(ConvertError::RootNotFound(PathBuf::from(first)));
    }
    Ok(outcome)
}

pub fn has_allowed_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    lowercase_extension(path)
        .map(|ext| extensions.contains(&ext))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
