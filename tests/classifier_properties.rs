// tests/classifier_properties.rs

//! Property tests for the source-directory classifier: same graph in, same
//! watch set out, regardless of how the parser happened to order inputs.

use std::collections::BTreeSet;

use proptest::prelude::*;

use ninja_regen::graph::{BuildEdge, BuildGraph};
use ninja_regen::types::RootPaths;
use ninja_regen::watch::classify;

const DIRS: &[&str] = &[
    "src",
    "src/nested",
    "assets",
    "gen",
    "gen/tmp",
    "../ext/src",
    "/opt/vendor_a/src",
    "/opt/vendor_b/src",
];

const FILES: &[&str] = &["a.cpp", "data.txt", "template.so.in", "libfoo.so.1"];

fn input_strategy() -> impl Strategy<Value = String> {
    (0..DIRS.len(), 0..FILES.len())
        .prop_map(|(d, f)| format!("{}/{}", DIRS[d], FILES[f]))
}

fn graph_strategy() -> impl Strategy<Value = BuildGraph> {
    (
        proptest::collection::vec(input_strategy(), 0..12),
        proptest::collection::vec(0..DIRS.len(), 0..3),
    )
        .prop_map(|(inputs, output_dirs)| {
            let mut graph = BuildGraph::new("build.ninja");
            graph.edges.push(BuildEdge {
                rule: "verify".to_string(),
                command: "printf \"\"".to_string(),
                outputs: vec!["build.ninja".to_string()],
                restat: true,
                generator: true,
                ..BuildEdge::default()
            });
            for d in output_dirs {
                graph.edges.push(BuildEdge {
                    rule: "phony".to_string(),
                    outputs: vec![format!("{}/generated.h", DIRS[d])],
                    ..BuildEdge::default()
                });
            }
            graph.edges.push(BuildEdge {
                rule: "touch".to_string(),
                command: "touch $out".to_string(),
                outputs: vec!["out".to_string()],
                inputs,
                ..BuildEdge::default()
            });
            graph
        })
}

fn derived_dirs(graph: &BuildGraph) -> BTreeSet<String> {
    let roots = RootPaths::new("/work", ".");
    classify::derive(graph, &roots)
        .iter()
        .map(|d| d.comparable.clone())
        .collect()
}

proptest! {
    #[test]
    fn derivation_is_deterministic(graph in graph_strategy()) {
        prop_assert_eq!(derived_dirs(&graph), derived_dirs(&graph));
    }

    #[test]
    fn derivation_ignores_input_order(graph in graph_strategy()) {
        let forward = derived_dirs(&graph);

        let mut reversed = graph.clone();
        for edge in &mut reversed.edges {
            edge.inputs.reverse();
        }
        prop_assert_eq!(forward, derived_dirs(&reversed));
    }

    #[test]
    fn working_directory_is_never_derived(graph in graph_strategy()) {
        let roots = RootPaths::new("/work", ".");
        let set = classify::derive(&graph, &roots);
        prop_assert!(set.iter().all(|d| d.comparable != "."));
    }

    #[test]
    fn versioned_artifacts_never_contribute(
        dir in 0..DIRS.len(),
        versions in proptest::collection::vec(1u32..20, 1..4),
    ) {
        let suffix: String = versions.iter().map(|v| format!(".{v}")).collect();
        let input = format!("{}/libx.so{suffix}", DIRS[dir]);

        let mut graph = BuildGraph::new("build.ninja");
        graph.edges.push(BuildEdge {
            rule: "touch".to_string(),
            command: "touch $out".to_string(),
            outputs: vec!["out".to_string()],
            inputs: vec![input],
            ..BuildEdge::default()
        });

        let roots = RootPaths::new("/work", ".");
        prop_assert!(classify::derive(&graph, &roots).is_empty());
    }
}
