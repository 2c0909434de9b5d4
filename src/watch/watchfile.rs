// src/watch/watchfile.rs

//! Explicit watch-file reader.
//!
//! A manifest author can bind `glob_watchfile` on the manifest edge to a
//! file naming the directories to watch. When present, its contents are
//! authoritative and replace inferred watching entirely for that run.

use std::io;

use tracing::debug;

use crate::errors::{RegenError, Result};
use crate::fs::FileSystem;
use crate::types::{Provenance, RootPaths};
use crate::watch::path_utils;
use crate::watch::WatchSet;

/// First-line schema tag of a supported watch file.
pub const WATCHFILE_SCHEMA_V1: &str = "ninja_glob_watch_dirs_v1";

/// Read and validate the watch file at `path` (a manifest-spelled path).
///
/// Entries are one directory per line, absolute or relative to the build
/// root. Entries naming the working directory (`.` or its absolute alias)
/// are dropped: watching it would make every run dirty.
pub fn read(fs: &dyn FileSystem, path: &str, roots: &RootPaths) -> Result<WatchSet> {
    let fs_path = roots.resolve(path);
    let text = match fs.read_to_string(&fs_path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(RegenError::WatchFileNotFound(path.to_string()));
        }
        Err(err) => {
            return Err(RegenError::WatchFileUnreadable {
                path: path.to_string(),
                source: err,
            });
        }
    };

    let mut lines = text.lines();
    let tag = lines.next().unwrap_or("").trim_end_matches('\r');
    if tag != WATCHFILE_SCHEMA_V1 {
        return Err(RegenError::UnsupportedWatchFileSchema {
            path: path.to_string(),
            tag: tag.to_string(),
        });
    }

    let build_root_abs = roots.build_root_abs();
    let build_root = path_utils::comparable(&roots.build_root, &roots.project_root);
    let mut set = WatchSet::new();
    for line in lines {
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        let comparable = path_utils::comparable(entry, &roots.project_root);
        if comparable == "." || comparable == build_root {
            debug!(entry, "dropping working-directory entry from watch file");
            continue;
        }
        let fs_path = roots.resolve_in(entry, &build_root_abs);
        set.insert(
            entry.to_string(),
            comparable,
            fs_path,
            Provenance::Explicit,
        );
    }
    Ok(set)
}
