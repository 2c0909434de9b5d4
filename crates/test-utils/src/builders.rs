#![allow(dead_code)]

use ninja_regen::graph::{BuildEdge, BuildGraph};

/// Builder for `BuildEdge` to simplify test setup.
pub struct EdgeBuilder {
    edge: BuildEdge,
}

impl EdgeBuilder {
    pub fn new(rule: &str, command: &str) -> Self {
        Self {
            edge: BuildEdge {
                rule: rule.to_string(),
                command: command.to_string(),
                ..BuildEdge::default()
            },
        }
    }

    /// A `phony` edge: declares outputs, runs nothing.
    pub fn phony(output: &str) -> Self {
        let mut builder = Self::new("phony", "");
        builder.edge.outputs.push(output.to_string());
        builder
    }

    pub fn description(mut self, description: &str) -> Self {
        self.edge.description = Some(description.to_string());
        self
    }

    pub fn output(mut self, output: &str) -> Self {
        self.edge.outputs.push(output.to_string());
        self
    }

    pub fn input(mut self, input: &str) -> Self {
        self.edge.inputs.push(input.to_string());
        self
    }

    pub fn implicit_input(mut self, input: &str) -> Self {
        self.edge.implicit_inputs.push(input.to_string());
        self
    }

    pub fn order_only_input(mut self, input: &str) -> Self {
        self.edge.order_only_inputs.push(input.to_string());
        self
    }

    pub fn restat(mut self, val: bool) -> Self {
        self.edge.restat = val;
        self
    }

    pub fn generator(mut self, val: bool) -> Self {
        self.edge.generator = val;
        self
    }

    pub fn pool(mut self, pool: &str) -> Self {
        self.edge.pool = Some(pool.to_string());
        self
    }

    pub fn glob_watchfile(mut self, path: &str) -> Self {
        self.edge.glob_watchfile = Some(path.to_string());
        self
    }

    pub fn build(self) -> BuildEdge {
        self.edge
    }
}

/// Builder for `BuildGraph`.
pub struct GraphBuilder {
    graph: BuildGraph,
}

impl GraphBuilder {
    pub fn new(manifest_path: &str) -> Self {
        Self {
            graph: BuildGraph::new(manifest_path),
        }
    }

    pub fn edge(mut self, edge: BuildEdge) -> Self {
        self.graph.edges.push(edge);
        self
    }

    /// The usual manifest edge: `verify` with `restat` and `generator` set,
    /// described as `Re-checking...` like a typical generator setup.
    pub fn verify_edge(self, manifest_path: &str) -> Self {
        self.edge(
            EdgeBuilder::new("verify", "printf \"\"")
                .description("Re-checking...")
                .output(manifest_path)
                .pool("console")
                .restat(true)
                .generator(true)
                .build(),
        )
    }

    pub fn build(self) -> BuildGraph {
        self.graph
    }
}
