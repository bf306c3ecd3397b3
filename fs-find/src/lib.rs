//! Recursive file search over a list of search roots.
//!
//! Matching is expressed as plain closures over candidate paths rather
//! than a predicate type hierarchy; compose them with ordinary function
//! combinators.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recursively collect the files under `roots` for which `predicate`
/// holds. Roots are visited in the order given; within one root the
/// walk order is the filesystem's. Roots that do not exist are skipped
/// with a warning rather than failing the whole search.
pub fn find_files(
    roots: &[PathBuf],
    predicate: impl Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in roots {
        if !root.exists() {
            log::warn!("search root does not exist, skipping: {:?}", root);
            continue;
        }
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if entry.file_type().is_file() && predicate(entry.path()) {
                found.push(entry.path().to_path_buf());
            }
        }
    }
    log::trace!("found {} matching files under {} roots", found.len(), roots.len());
    found
}

/// First file under `roots` matching `predicate`, searching roots in
/// order, or `None` if nothing matches.
pub fn find_first_file(
    roots: &[PathBuf],
    predicate: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    for root in roots {
        if !root.exists() {
            log::warn!("search root does not exist, skipping: {:?}", root);
            continue;
        }
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if entry.file_type().is_file() && predicate(entry.path()) {
                return Some(entry.path().to_path_buf());
            }
        }
    }
    None
}

/// Predicate matching files with the given extension, case-insensitively
/// and without the leading dot.
pub fn has_extension(extension: &str) -> impl Fn(&Path) -> bool + '_ {
    move |path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
