// src/watch/path_utils.rs

//! Path normalisation helpers for watch-directory derivation.
//!
//! Cache keys must be byte-identical across runs for identical graphs, so
//! every comparison goes through a deterministic, purely lexical
//! normalisation. The *spelling* of a path (as written in the manifest or
//! watch file) is preserved for cache keys; the *comparable* form is only
//! used for nesting checks and deduplication.

use std::path::{Path, PathBuf};

/// Lexically normalise a path spelling.
///
/// - backslashes become forward slashes
/// - `.` segments and empty segments are dropped
/// - interior `..` segments collapse their parent where one exists;
///   leading `..` segments of relative paths are preserved
/// - the empty path becomes `"."`
pub fn normalize(spelling: &str) -> String {
    let s = spelling.replace('\\', "/");
    let absolute = s.starts_with('/');
    let mut out: Vec<&str> = Vec::new();

    for seg in s.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(&"..")) || out.is_empty() {
                    // `/..` stays at the root; a relative `..` is kept.
                    if !absolute {
                        out.push("..");
                    }
                } else {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }

    if absolute {
        format!("/{}", out.join("/"))
    } else if out.is_empty() {
        ".".to_string()
    } else {
        out.join("/")
    }
}

/// Comparable form of a path: normalised, and with absolute paths under the
/// project root reduced to their relative equivalent (`project_root` itself
/// becomes `"."`). Two spellings of the same directory compare equal.
pub fn comparable(spelling: &str, project_root: &Path) -> String {
    let n = normalize(spelling);
    if n.starts_with('/') {
        let root = normalize(&project_root.to_string_lossy());
        if n == root {
            return ".".to_string();
        }
        let prefix = if root == "/" {
            "/".to_string()
        } else {
            format!("{root}/")
        };
        if let Some(rest) = n.strip_prefix(&prefix) {
            return rest.to_string();
        }
    }
    n
}

/// The directory containing `path`, preserving the spelling style of the
/// input (`src/a.cpp` -> `src`, `a.cpp` -> `.`, `/ext/f` -> `/ext`).
pub fn parent_spelling(path: &str) -> String {
    let s = path.replace('\\', "/");
    let trimmed = s.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => trimmed[..i].to_string(),
        None => ".".to_string(),
    }
}

/// The final component of a path spelling.
pub fn file_name(path: &str) -> &str {
    let s = path.trim_end_matches(['/', '\\']);
    match s.rfind(['/', '\\']) {
        Some(i) => &s[i + 1..],
        None => s,
    }
}

/// Whether `child` is `parent` or nested below it. Both arguments must be in
/// comparable form.
pub fn is_under(child: &str, parent: &str) -> bool {
    if parent == "." {
        return child != "."
            && child != ".."
            && !child.starts_with("../")
            && !child.starts_with('/');
    }
    child == parent || child.starts_with(&format!("{parent}/"))
}

/// Resolve a spelling to a filesystem path, relative spellings against
/// `base`. The join is lexical, so `..` segments collapse into `base`
/// deterministically.
pub fn to_fs_path(spelling: &str, base: &Path) -> PathBuf {
    let n = normalize(spelling);
    if n.starts_with('/') {
        PathBuf::from(n)
    } else if n == "." {
        base.to_path_buf()
    } else {
        let combined = format!("{}/{}", base.to_string_lossy(), n);
        PathBuf::from(normalize(&combined))
    }
}
