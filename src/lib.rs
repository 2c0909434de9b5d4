// src/lib.rs

pub mod cache;
pub mod cli;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod regen;
pub mod status;
pub mod types;
pub mod watch;

use std::path::PathBuf;

use tracing::debug;

use crate::errors::{RegenError, Result};
use crate::exec::CommandExecutor;
use crate::fs::FileSystem;
use crate::graph::{BuildGraph, ManifestLoader};
use crate::regen::{RegenController, RegenReport};
use crate::status::StatusSink;
use crate::types::{InvocationOutcome, RootPaths};

/// File name of the glob-directory cache, one per effective build root.
pub const GLOB_DIRS_FILE_NAME: &str = ".ninja_glob_dirs";

/// Where the glob-directory cache lives for the given roots.
pub fn glob_dirs_cache_path(roots: &RootPaths) -> PathBuf {
    roots.build_root_abs().join(GLOB_DIRS_FILE_NAME)
}

/// Run the manifest phase of one invocation.
///
/// This wires together:
/// - the glob-directory cache for the effective build root
/// - the watch-set derivation (explicit watch file or classifier)
/// - the regeneration controller
/// - the external executor, manifest loader, and status renderer
///
/// On success the returned report carries the graph the requested-target
/// build phase must use (reloaded if a regeneration happened). A manifest
/// command failure surfaces as [`RegenError::CommandFailed`]; the cache is
/// guaranteed untouched in that case. Callers on the process exit path
/// format errors with [`errors::fatal_line`].
pub async fn run_invocation(
    graph: BuildGraph,
    roots: &RootPaths,
    loader: &dyn ManifestLoader,
    executor: &mut dyn CommandExecutor,
    status: &mut dyn StatusSink,
    fs: &dyn FileSystem,
) -> Result<RegenReport> {
    let cache_path = glob_dirs_cache_path(roots);
    debug!(cache = %cache_path.display(), manifest = %graph.manifest_path, "manifest phase start");

    let controller = RegenController::new(roots, cache_path, fs, loader, executor, status);
    let report = controller.run(graph).await?;

    if let InvocationOutcome::Failed(code) = report.outcome {
        return Err(RegenError::CommandFailed { code });
    }
    debug!(outcome = ?report.outcome, "manifest phase complete");
    Ok(report)
}
