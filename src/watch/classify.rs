// src/watch/classify.rs

//! Source-directory classifier.
//!
//! Derives the set of directories whose membership changes should force a
//! manifest re-check, from nothing but a frozen graph snapshot and the two
//! roots. No filesystem access happens here, which keeps the heuristic
//! independently testable.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::graph::BuildGraph;
use crate::types::{Provenance, RootPaths};
use crate::watch::path_utils;
use crate::watch::WatchSet;

/// Shared-library names carrying one or more numeric version suffixes
/// (`libfoo.so.1`, `libbar.so.1.2.3`) are build artifacts, not editable
/// sources, even when they appear as inputs. `template.so.in` does not
/// match: the suffix after `.so` is not numeric.
fn versioned_artifact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.so(\.[0-9]+)+$").expect("artifact pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirClass {
    /// Nested under the effective build root.
    BuildLocal,
    /// Relative path outside the build root, or an absolute path under the
    /// project root but outside the build root.
    InTree,
    /// Absolute path outside both roots.
    External,
}

struct Candidate {
    spelling: String,
    comparable: String,
    class: DirClass,
}

/// Derive the inferred watch set for `graph`.
///
/// Every declared input of every edge except the manifest edge contributes
/// its containing directory; the manifest edge's own inputs are covered by
/// the ordinary timestamp staleness check and must not be double-counted
/// here.
pub fn derive(graph: &BuildGraph, roots: &RootPaths) -> WatchSet {
    let manifest_idx = graph.manifest_edge_index(roots);
    let build_root = path_utils::comparable(&roots.build_root, &roots.project_root);

    // Directories that receive declared outputs, in comparable form. The
    // working directory is excluded: almost every edge writes something at
    // the top level and that must not poison nesting checks below.
    let output_dirs: HashSet<String> = graph
        .edges
        .iter()
        .flat_map(|edge| edge.outputs.iter())
        .map(|out| {
            path_utils::comparable(&path_utils::parent_spelling(out), &roots.project_root)
        })
        .filter(|dir| dir != ".")
        .collect();

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, edge) in graph.edges.iter().enumerate() {
        if Some(idx) == manifest_idx {
            continue;
        }
        for input in edge.all_inputs() {
            if versioned_artifact().is_match(path_utils::file_name(input)) {
                debug!(input, "skipping versioned binary artifact input");
                continue;
            }

            let spelling = path_utils::parent_spelling(input);
            let comparable = path_utils::comparable(&spelling, &roots.project_root);
            // Neither the working directory nor the build root itself is
            // ever watched; both are churned by every build.
            if comparable == "." || comparable == build_root {
                continue;
            }
            if !seen.insert(comparable.clone()) {
                continue;
            }

            let class = if path_utils::is_under(&comparable, &build_root) {
                DirClass::BuildLocal
            } else if !comparable.starts_with('/') {
                DirClass::InTree
            } else {
                DirClass::External
            };

            candidates.push(Candidate {
                spelling,
                comparable,
                class,
            });
        }
    }

    let in_tree = candidates
        .iter()
        .filter(|c| c.class == DirClass::InTree)
        .count();
    let external_roots = candidates
        .iter()
        .filter(|c| c.class == DirClass::External)
        .count();

    // Build-local directories holding generated outputs are a generator's
    // scratch space and normally too noisy to watch. That pruning is only
    // safe when the rest of the picture pins down where sources live: at
    // least one in-tree directory, and at most one external root. With no
    // in-tree dirs, or several external roots, the source layout cannot be
    // disambiguated and build-local dirs are kept.
    let keep_build_local = external_roots > 1 || in_tree == 0;

    let mut set = WatchSet::new();
    for candidate in candidates {
        if candidate.class == DirClass::BuildLocal
            && !keep_build_local
            && is_generated(&candidate.comparable, &output_dirs)
        {
            debug!(dir = %candidate.spelling, "pruning generated build-local directory");
            continue;
        }
        let fs_path = path_utils::to_fs_path(&candidate.spelling, &roots.project_root);
        set.insert(
            candidate.spelling,
            candidate.comparable,
            fs_path,
            Provenance::Inferred,
        );
    }
    set
}

/// Whether `dir` is, or sits below, a directory some edge declares outputs
/// into.
fn is_generated(dir: &str, output_dirs: &HashSet<String>) -> bool {
    output_dirs
        .iter()
        .any(|out_dir| path_utils::is_under(dir, out_dir))
}
