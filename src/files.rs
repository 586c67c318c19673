//! Resolution of input file arguments: explicit paths and glob patterns.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{CovgapsError, Result};

/// Resolve each argument to concrete file paths. Arguments containing a
/// wildcard character are expanded as glob patterns (relative to the current
/// directory); everything else must name an existing file. Duplicates are
/// removed, first-seen order kept.
pub fn resolve_files(paths_or_patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut resolved: Vec<PathBuf> = Vec::new();

    for arg in paths_or_patterns {
        if is_glob_pattern(arg) {
            resolved.extend(resolve_glob(arg)?);
        } else {
            let path = PathBuf::from(arg);
            if !path.is_file() {
                return Err(CovgapsError::FileNotFound(arg.clone()));
            }
            resolved.push(path);
        }
    }

    let mut seen = HashSet::new();
    resolved.retain(|p| seen.insert(p.clone()));

    Ok(resolved)
}

fn resolve_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .map_err(|e| CovgapsError::Pattern(format!("{pattern}: {e}")))?;

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| CovgapsError::Io(e.into_error()))?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CovgapsError::NoMatches(pattern.to_string()));
    }

    Ok(matches)
}

fn is_glob_pattern(path: &str) -> bool {
    path.contains(['*', '?', '['])
}
