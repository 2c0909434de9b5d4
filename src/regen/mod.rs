// src/regen/mod.rs

//! Regeneration controller.
//!
//! Runs once per invocation, before the requested-target build phase:
//!
//! ```text
//! Idle -> Evaluating -> NoWork
//!                    -> Running -> Unchanged   (check-only pass)
//!                                -> Changed     (reload manifest, re-enter Evaluating)
//!                                -> Failed      (abort, cache untouched)
//! ```
//!
//! Each `Evaluating` step performs at most one run of the manifest edge, and
//! the cache is refreshed once per step using mtimes observed *after* that
//! step's command ran. A regeneration command that itself touches a watched
//! directory therefore cannot trigger a second pass; the loop re-enters
//! `Evaluating` only while the manifest content actually keeps changing.

use std::io;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::cache::GlobDirCache;
use crate::errors::{RegenError, Result};
use crate::exec::{CommandExecutor, EdgeRequest};
use crate::fs::FileSystem;
use crate::graph::{BuildGraph, ManifestLoader};
use crate::status::StatusSink;
use crate::types::{InvocationOutcome, PhaseMarker, RootPaths};
use crate::watch::{classify, watchfile, WatchSet};

/// Result of one invocation's manifest phase.
#[derive(Debug)]
pub struct RegenReport {
    pub outcome: InvocationOutcome,
    /// The graph the build phase should use: the original one, or the
    /// reloaded graph after a regeneration.
    pub graph: BuildGraph,
}

/// Tri-state outcome of running the manifest edge once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeRunOutcome {
    Unchanged,
    Changed,
    Failed(i32),
}

pub struct RegenController<'a> {
    roots: &'a RootPaths,
    cache_path: PathBuf,
    fs: &'a dyn FileSystem,
    loader: &'a dyn ManifestLoader,
    executor: &'a mut dyn CommandExecutor,
    status: &'a mut dyn StatusSink,
}

impl<'a> RegenController<'a> {
    pub fn new(
        roots: &'a RootPaths,
        cache_path: PathBuf,
        fs: &'a dyn FileSystem,
        loader: &'a dyn ManifestLoader,
        executor: &'a mut dyn CommandExecutor,
        status: &'a mut dyn StatusSink,
    ) -> Self {
        Self {
            roots,
            cache_path,
            fs,
            loader,
            executor,
            status,
        }
    }

    /// Drive the manifest phase to completion for `graph`.
    pub async fn run(mut self, graph: BuildGraph) -> Result<RegenReport> {
        let mut graph = graph;

        if graph.manifest_edge_index(self.roots).is_none() {
            debug!("no manifest edge; skipping manifest phase");
            return Ok(RegenReport {
                outcome: InvocationOutcome::NoManifestWorkNeeded,
                graph,
            });
        }

        let mut cache =
            GlobDirCache::load(self.fs, &self.cache_path, self.roots, &graph.manifest_path);
        let mut outcome = InvocationOutcome::NoManifestWorkNeeded;
        // Manifest mtime observed after the previous `Running` step, if any.
        // Re-running is pointless until the manifest content differs again;
        // this is what bounds the Evaluating loop.
        let mut last_run_mtime: Option<Option<u64>> = None;

        loop {
            // A regenerated manifest may have dropped its own edge.
            let Some(edge_idx) = graph.manifest_edge_index(self.roots) else {
                break;
            };

            let watch = self.watch_set_for(&graph, edge_idx)?;
            let mut ordinary_stale = self.manifest_edge_stale(&graph, edge_idx)?;
            let dir_signal = cache.change_signal(self.fs, self.roots, &watch)?;

            if ordinary_stale && !dir_signal {
                let current = self
                    .fs
                    .mtime_ns(&self.roots.resolve(&graph.manifest_path))
                    .ok();
                if last_run_mtime == Some(current) {
                    debug!("manifest unchanged since its edge last ran; not re-running");
                    ordinary_stale = false;
                }
            }

            if !ordinary_stale && !dir_signal {
                // Nothing to do. An absent, migrated, or compat-backed cache
                // still gets (re)written so the next invocation has a known
                // baseline; a clean current cache is left untouched.
                if cache.needs_rewrite() {
                    cache.refresh(self.fs, self.roots, &watch, &graph.manifest_path)?;
                    cache.save(self.fs)?;
                }
                break;
            }

            info!(
                ordinary_stale,
                dir_signal, "manifest edge is stale; running it"
            );
            let request = EdgeRequest::from_edge(&graph.edges[edge_idx]);
            let restat = graph.edges[edge_idx].restat;
            match self
                .run_manifest_edge(request, restat, dir_signal, &graph.manifest_path)
                .await?
            {
                EdgeRunOutcome::Failed(code) => {
                    // The directory-change signal that triggered this run
                    // must survive: nothing is persisted, so the next
                    // invocation retries the same check.
                    return Ok(RegenReport {
                        outcome: InvocationOutcome::Failed(code),
                        graph,
                    });
                }
                EdgeRunOutcome::Unchanged => {
                    self.status
                        .phase_marker(PhaseMarker::ManifestCheckComplete);
                    cache.refresh(self.fs, self.roots, &watch, &graph.manifest_path)?;
                    cache.save(self.fs)?;
                    outcome = InvocationOutcome::CheckOnly;
                    break;
                }
                EdgeRunOutcome::Changed => {
                    self.status
                        .phase_marker(PhaseMarker::RegenerationComplete);
                    last_run_mtime = Some(
                        self.fs
                            .mtime_ns(&self.roots.resolve(&graph.manifest_path))
                            .ok(),
                    );
                    graph = self.loader.load(&graph.manifest_path)?;

                    // The watch set must come from the graph the rewritten
                    // manifest describes, not the stale one: a regeneration
                    // may move source directories or drop its watch-file
                    // binding entirely.
                    let refreshed = match graph.manifest_edge_index(self.roots) {
                        Some(idx) => self.watch_set_for(&graph, idx)?,
                        None => WatchSet::new(),
                    };
                    cache.refresh(self.fs, self.roots, &refreshed, &graph.manifest_path)?;
                    cache.save(self.fs)?;
                    outcome = InvocationOutcome::Regenerated;
                }
            }
        }

        Ok(RegenReport { outcome, graph })
    }

    /// The watch set governing this evaluation: the explicit watch file when
    /// the manifest edge binds one, otherwise the classifier's inference.
    fn watch_set_for(&self, graph: &BuildGraph, edge_idx: usize) -> Result<WatchSet> {
        match &graph.edges[edge_idx].glob_watchfile {
            Some(path) => watchfile::read(self.fs, path, self.roots),
            None => Ok(classify::derive(graph, self.roots)),
        }
    }

    /// Classic timestamp staleness for the manifest edge itself: output
    /// missing, or older than any explicit/implicit input. Order-only
    /// inputs never count.
    fn manifest_edge_stale(&self, graph: &BuildGraph, edge_idx: usize) -> Result<bool> {
        let edge = &graph.edges[edge_idx];
        let manifest_mtime = match self.fs.mtime_ns(&self.roots.resolve(&graph.manifest_path)) {
            Ok(mtime) => mtime,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(err) => {
                return Err(RegenError::StatFailed {
                    path: graph.manifest_path.clone(),
                    source: err,
                });
            }
        };

        for input in edge.staleness_inputs() {
            match self.fs.mtime_ns(&self.roots.resolve(input)) {
                Ok(mtime) if mtime > manifest_mtime => {
                    debug!(input, "manifest edge input is newer than the manifest");
                    return Ok(true);
                }
                Ok(_) => {}
                Err(_) => {
                    debug!(input, "manifest edge input missing or unreadable");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Run the manifest edge once and interpret the result.
    ///
    /// A directory-signal run always counts as `Changed`: the watch set must
    /// be rebuilt from a freshly parsed manifest even when the regeneration
    /// left the manifest bytes alone. For pure timestamp staleness, `restat`
    /// compares the manifest's mtime before and after the run; an edge
    /// without `restat` cannot prove anything and every success is
    /// `Changed`.
    async fn run_manifest_edge(
        &mut self,
        request: EdgeRequest,
        restat: bool,
        dir_signal: bool,
        manifest_path: &str,
    ) -> Result<EdgeRunOutcome> {
        let manifest_fs = self.roots.resolve(manifest_path);
        let before = self.fs.mtime_ns(&manifest_fs).ok();

        let code = self.executor.run_edge(request).await?;
        if code != 0 {
            return Ok(EdgeRunOutcome::Failed(code));
        }
        if dir_signal || !restat {
            return Ok(EdgeRunOutcome::Changed);
        }

        let after = self.fs.mtime_ns(&manifest_fs).ok();
        match (before, after) {
            (Some(b), Some(a)) if a == b => Ok(EdgeRunOutcome::Unchanged),
            _ => Ok(EdgeRunOutcome::Changed),
        }
    }
}
