use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::anyhow;
use ninja_regen::errors::Result;
use ninja_regen::graph::{BuildGraph, ManifestLoader};

/// Loader that always re-parses to the same graph.
pub struct StaticLoader {
    graph: BuildGraph,
}

impl StaticLoader {
    pub fn new(graph: BuildGraph) -> Self {
        Self { graph }
    }
}

impl ManifestLoader for StaticLoader {
    fn load(&self, _manifest_path: &str) -> Result<BuildGraph> {
        Ok(self.graph.clone())
    }
}

/// Loader that replays a scripted sequence of graphs, one per reload, the
/// way a regeneration command rewrites the manifest between parses.
pub struct ScriptedLoader {
    graphs: Mutex<VecDeque<BuildGraph>>,
}

impl ScriptedLoader {
    pub fn new(graphs: impl IntoIterator<Item = BuildGraph>) -> Self {
        Self {
            graphs: Mutex::new(graphs.into_iter().collect()),
        }
    }
}

impl ManifestLoader for ScriptedLoader {
    fn load(&self, _manifest_path: &str) -> Result<BuildGraph> {
        self.graphs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted loader ran out of manifests").into())
    }
}
