// src/graph/mod.rs

//! Frozen snapshot of the parsed build plan.
//!
//! Manifest parsing lives outside this crate; the parser hands over a
//! [`BuildGraph`] (a flat list of [`BuildEdge`]s plus the manifest path) and
//! re-parses through the [`ManifestLoader`] seam whenever a regeneration
//! rewrites the manifest. Everything in here is plain owned data so the
//! classifier can be a pure function of one snapshot.

use crate::errors::Result;
use crate::types::RootPaths;
use crate::watch::path_utils;

/// One build statement: a command producing `outputs` from declared inputs.
#[derive(Debug, Clone, Default)]
pub struct BuildEdge {
    /// Rule name, informational only.
    pub rule: String,
    pub command: String,
    pub description: Option<String>,
    pub outputs: Vec<String>,
    /// Explicit inputs (`build out: rule IN ...`).
    pub inputs: Vec<String>,
    /// Implicit inputs (after `|`).
    pub implicit_inputs: Vec<String>,
    /// Order-only inputs (after `||`); these never make an output stale.
    pub order_only_inputs: Vec<String>,
    pub restat: bool,
    pub generator: bool,
    pub pool: Option<String>,
    /// Optional `glob_watchfile` binding: an authoritative list of watched
    /// directories supplied by the manifest author.
    pub glob_watchfile: Option<String>,
}

impl BuildEdge {
    /// Every declared input, in declaration order.
    pub fn all_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .chain(self.implicit_inputs.iter())
            .chain(self.order_only_inputs.iter())
            .map(String::as_str)
    }

    /// Inputs that participate in the timestamp staleness check.
    pub fn staleness_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .chain(self.implicit_inputs.iter())
            .map(String::as_str)
    }
}

/// The parsed manifest: edges plus the path the manifest was loaded from,
/// spelled the way the invocation named it.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    pub manifest_path: String,
    pub edges: Vec<BuildEdge>,
}

impl BuildGraph {
    pub fn new(manifest_path: impl Into<String>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            edges: Vec::new(),
        }
    }

    /// Index of the edge whose output is the manifest itself, if any.
    ///
    /// Output spellings may differ from the invocation's manifest spelling
    /// (absolute vs relative aliases), so the match is on comparable forms.
    pub fn manifest_edge_index(&self, roots: &RootPaths) -> Option<usize> {
        let manifest = path_utils::comparable(&self.manifest_path, &roots.project_root);
        self.edges.iter().position(|edge| {
            edge.outputs
                .iter()
                .any(|out| path_utils::comparable(out, &roots.project_root) == manifest)
        })
    }

    pub fn manifest_edge(&self, roots: &RootPaths) -> Option<&BuildEdge> {
        self.manifest_edge_index(roots).map(|i| &self.edges[i])
    }
}

/// Seam to the external manifest parser.
///
/// After a regeneration the controller needs a brand-new graph for the
/// rewritten manifest; it never mutates the one it was handed.
pub trait ManifestLoader {
    fn load(&self, manifest_path: &str) -> Result<BuildGraph>;
}
