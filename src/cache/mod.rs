// src/cache/mod.rs

//! Persisted glob-directory cache.
//!
//! One cache file exists per effective build root. It is loaded once per
//! invocation, owned by the controller, compared against the live watch set,
//! and written back at most once at a well-defined point, never mutated on
//! disk incrementally. Keeping the value explicit is what makes the
//! "no persistence on failure" rule trivial to uphold: a failed run simply
//! drops the value.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{RegenError, Result};
use crate::fs::FileSystem;
use crate::types::{Provenance, RootPaths};
use crate::watch::path_utils;
use crate::watch::{WatchDir, WatchSet};

pub mod schema;

use schema::{CacheContents, DirRecord, ManifestFingerprint, ParsedCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheState {
    /// No cache file existed; the directory set is unknown.
    Absent,
    /// An older (or corrupt) schema was found; records were discarded.
    Discarded,
    /// A valid v3 file was loaded.
    Current,
    /// The primary file carries a newer schema; decisions come from the
    /// compat sibling and all writes go there.
    FutureSchema,
}

/// The in-memory cache for one invocation.
#[derive(Debug)]
pub struct GlobDirCache {
    write_path: PathBuf,
    state: CacheState,
    contents: CacheContents,
    /// The recorded manifest fingerprint does not match the live manifest:
    /// some other tool rewrote it since the cache was written.
    fingerprint_stale: bool,
}

impl GlobDirCache {
    /// Load the cache for `cache_path`, migrating or falling back as the
    /// schema requires. Loading never fails: an unreadable or unparsable
    /// cache degrades to "directory set unknown".
    pub fn load(
        fs: &dyn FileSystem,
        cache_path: &Path,
        roots: &RootPaths,
        manifest_path: &str,
    ) -> Self {
        let (state, contents, write_path) = match fs.read_to_string(cache_path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %cache_path.display(), "no glob-dirs cache yet");
                (
                    CacheState::Absent,
                    CacheContents::default(),
                    cache_path.to_path_buf(),
                )
            }
            Err(err) => {
                warn!(path = %cache_path.display(), error = %err, "unreadable glob-dirs cache");
                (
                    CacheState::Absent,
                    CacheContents::default(),
                    cache_path.to_path_buf(),
                )
            }
            Ok(text) => match schema::parse(&text) {
                ParsedCache::Current(contents) => (
                    CacheState::Current,
                    contents,
                    cache_path.to_path_buf(),
                ),
                ParsedCache::Discarded { tag } => {
                    warn!(
                        path = %cache_path.display(),
                        tag = %tag,
                        "glob-dirs cache schema superseded; watched set unknown and will be recomputed"
                    );
                    (
                        CacheState::Discarded,
                        CacheContents::default(),
                        cache_path.to_path_buf(),
                    )
                }
                ParsedCache::Future { tag, best_effort } => {
                    let compat = compat_path(cache_path);
                    // Never touch state written by a newer orchestrator.
                    // Prefer the compat sibling if a previous run of this
                    // version already established it.
                    let contents = match fs.read_to_string(&compat) {
                        Ok(compat_text) => match schema::parse(&compat_text) {
                            ParsedCache::Current(contents) => contents,
                            _ => best_effort,
                        },
                        Err(_) => best_effort,
                    };
                    debug!(
                        path = %cache_path.display(),
                        tag = %tag,
                        "future cache schema; using compat sibling for this run"
                    );
                    (CacheState::FutureSchema, contents, compat)
                }
            },
        };

        let mut cache = Self {
            write_path,
            state,
            contents,
            fingerprint_stale: false,
        };
        cache.check_fingerprint(fs, roots, manifest_path);
        cache
    }

    fn check_fingerprint(&mut self, fs: &dyn FileSystem, roots: &RootPaths, manifest_path: &str) {
        let Some(fp) = &self.contents.fingerprint else {
            return;
        };
        let live = fs.mtime_ns(&roots.resolve(manifest_path)).unwrap_or(0);
        if live != fp.mtime_ns {
            debug!(
                recorded = fp.mtime_ns,
                live, "manifest fingerprint mismatch; manifest was edited externally"
            );
            self.fingerprint_stale = true;
        }
    }

    /// Whether this run must rewrite the cache even if nothing changed
    /// (absent, migrated, or maintained through the compat sibling).
    pub fn needs_rewrite(&self) -> bool {
        self.state != CacheState::Current
    }

    /// Whether the recorded state demands a manifest run: membership differs
    /// from the live watch set, a recorded mtime differs from the live one
    /// (including a watched directory disappearing), or the manifest was
    /// edited behind our back.
    ///
    /// A cache with no usable records (absent or migrated) reports `false`:
    /// an unknown set is recomputed and persisted, but it is not evidence
    /// that anything changed.
    pub fn change_signal(&self, fs: &dyn FileSystem, roots: &RootPaths, live: &WatchSet) -> Result<bool> {
        match self.state {
            CacheState::Absent | CacheState::Discarded => return Ok(false),
            CacheState::Current | CacheState::FutureSchema => {}
        }
        if self.fingerprint_stale {
            return Ok(true);
        }

        let recorded: Vec<(String, u64)> = self
            .contents
            .records
            .iter()
            .map(|r| (path_utils::comparable(&r.dir, &roots.project_root), r.mtime_ns))
            .collect();

        if recorded.len() != live.len() {
            debug!(
                recorded = recorded.len(),
                live = live.len(),
                "watched-directory membership changed"
            );
            return Ok(true);
        }
        for (dir, _) in &recorded {
            if !live.contains(dir) {
                debug!(dir = %dir, "recorded directory no longer watched");
                return Ok(true);
            }
        }

        for watch_dir in live.iter() {
            let live_mtime = stat_watch_dir(fs, watch_dir)?;
            let recorded_mtime = recorded
                .iter()
                .find(|(dir, _)| dir == &watch_dir.comparable)
                .map(|(_, mtime)| *mtime);
            if recorded_mtime != Some(live_mtime) {
                debug!(dir = %watch_dir.dir, "watched directory mtime changed");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Recompute records for exactly the directories in `live`, snapshotting
    /// mtimes as they are *now*, after any manifest command has run, so a
    /// regeneration that touches a watched directory cannot re-trigger on
    /// the next invocation.
    pub fn refresh(
        &mut self,
        fs: &dyn FileSystem,
        roots: &RootPaths,
        live: &WatchSet,
        manifest_path: &str,
    ) -> Result<()> {
        let mut records = Vec::with_capacity(live.len());
        for watch_dir in live.iter() {
            let mtime_ns = stat_watch_dir(fs, watch_dir)?;
            records.push(DirRecord {
                dir: watch_dir.dir.clone(),
                mtime_ns,
                provenance: watch_dir.provenance,
            });
        }
        let manifest_mtime = fs.mtime_ns(&roots.resolve(manifest_path)).unwrap_or(0);
        self.contents = CacheContents {
            fingerprint: Some(ManifestFingerprint {
                mtime_ns: manifest_mtime,
                path: manifest_path.to_string(),
            }),
            records,
        };
        self.fingerprint_stale = false;
        Ok(())
    }

    /// Write the cache out in one atomic step.
    pub fn save(&self, fs: &dyn FileSystem) -> Result<()> {
        let text = schema::serialize(&self.contents);
        fs.write_atomic(&self.write_path, text.as_bytes())
            .map_err(RegenError::from)
    }

    /// Path the cache will be written to (the compat sibling for future
    /// schemas).
    pub fn write_path(&self) -> &Path {
        &self.write_path
    }
}

/// Stat a watched directory.
///
/// A missing directory is an observation, not an error: it reports mtime 0,
/// which differs from any recorded value and also records "absent" so a
/// later re-creation is seen. Other stat failures are fatal for explicitly
/// watched directories; for inferred ones the directory is conservatively
/// treated as changed.
fn stat_watch_dir(fs: &dyn FileSystem, watch_dir: &WatchDir) -> Result<u64> {
    match fs.mtime_ns(&watch_dir.fs_path) {
        Ok(mtime) => Ok(mtime),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(err) => match watch_dir.provenance {
            Provenance::Explicit => Err(RegenError::StatFailed {
                path: watch_dir.dir.clone(),
                source: err,
            }),
            Provenance::Inferred => {
                warn!(dir = %watch_dir.dir, error = %err, "stat failed on inferred directory");
                Ok(0)
            }
        },
    }
}

/// The sibling file used when the primary cache has an unrecognised schema.
pub fn compat_path(cache_path: &Path) -> PathBuf {
    let mut name = cache_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(schema::COMPAT_SUFFIX);
    cache_path.with_file_name(name)
}
