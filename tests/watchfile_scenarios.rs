// tests/watchfile_scenarios.rs

//! Scenarios where the manifest edge binds an explicit `glob_watchfile`.

use std::error::Error;

use ninja_regen::errors::{fatal_line, RegenError};
use ninja_regen::fs::mock::MockFileSystem;
use ninja_regen::graph::BuildGraph;
use ninja_regen::run_invocation;
use ninja_regen::types::{InvocationOutcome, RootPaths};
use ninja_regen_test_utils::builders::{EdgeBuilder, GraphBuilder};
use ninja_regen_test_utils::fake_executor::FakeExecutor;
use ninja_regen_test_utils::init_tracing;
use ninja_regen_test_utils::loader::{ScriptedLoader, StaticLoader};
use ninja_regen_test_utils::status::CollectingStatus;

type TestResult = Result<(), Box<dyn Error>>;

const CACHE: &str = "/work/.ninja_glob_dirs";

fn roots() -> RootPaths {
    RootPaths::new("/work", ".")
}

fn graph_with_watchfile(watchfile: &str) -> BuildGraph {
    GraphBuilder::new("build.ninja")
        .edge(
            EdgeBuilder::new("verify", "printf \"\"")
                .description("Re-checking...")
                .output("build.ninja")
                .pool("console")
                .restat(true)
                .generator(true)
                .glob_watchfile(watchfile)
                .build(),
        )
        .edge(
            EdgeBuilder::new("touch", "touch $out")
                .description("touch out")
                .output("out")
                .input("src/a.cpp")
                .build(),
        )
        .build()
}

fn watchfile_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/work/src/a.cpp", "");
    fs.set_mtime("/work/src", 2_000);
    fs.add_dir("/work/watched");
    fs.set_mtime("/work/watched", 2_000);
    fs.add_file(
        "/work/watch_dirs.txt",
        "ninja_glob_watch_dirs_v1\nwatched\n",
    );
    fs.add_file("/work/build.ninja", "plan");
    fs.set_mtime("/work/build.ninja", 3_000);
    fs
}

async fn invoke(
    fs: &MockFileSystem,
    graph: BuildGraph,
    executor: &mut FakeExecutor,
) -> ninja_regen::errors::Result<InvocationOutcome> {
    let loader = StaticLoader::new(graph.clone());
    let mut status = CollectingStatus::new();
    let report = run_invocation(graph, &roots(), &loader, executor, &mut status, fs).await?;
    Ok(report.outcome)
}

#[tokio::test]
async fn watch_file_replaces_inferred_watching() -> TestResult {
    init_tracing();
    let fs = watchfile_fs();
    let graph = graph_with_watchfile("watch_dirs.txt");
    let mut executor = FakeExecutor::new();

    invoke(&fs, graph.clone(), &mut executor).await?;
    let cache = fs.contents(CACHE).unwrap();
    assert!(cache.contains("mtime\twatched\t"));
    assert!(!cache.contains("inferred\t"));
    assert!(!cache.contains("src"));

    // Source-directory churn is invisible while the watch file is bound.
    fs.add_file("/work/src/new.cpp", "");
    let outcome = invoke(&fs, graph.clone(), &mut executor).await?;
    assert_eq!(outcome, InvocationOutcome::NoManifestWorkNeeded);
    assert_eq!(executor.run_count(), 0);

    // The explicitly watched directory still triggers.
    fs.add_file("/work/watched/entry.txt", "");
    let outcome = invoke(&fs, graph, &mut executor).await?;
    assert_eq!(outcome, InvocationOutcome::Regenerated);
    assert_eq!(executor.run_count(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_watch_file_is_fatal_before_any_run() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/work/build.ninja", "plan");
    fs.set_mtime("/work/build.ninja", 3_000);
    let graph = graph_with_watchfile("missing_watch_dirs.txt");
    let mut executor = FakeExecutor::new();

    let err = invoke(&fs, graph, &mut executor).await.unwrap_err();
    assert!(matches!(err, RegenError::WatchFileNotFound(_)));
    assert_eq!(
        fatal_line("build.ninja", &err),
        "ninja: error: rebuilding 'build.ninja': \
         glob watch file 'missing_watch_dirs.txt' not found"
    );
    assert_eq!(executor.run_count(), 0);
    assert!(fs.contents(CACHE).is_none());
    Ok(())
}

#[tokio::test]
async fn unsupported_watch_file_schema_is_fatal() -> TestResult {
    init_tracing();
    let fs = watchfile_fs();
    fs.add_file(
        "/work/watch_dirs.txt",
        "ninja_glob_watch_dirs_v2\nwatched\n",
    );
    let graph = graph_with_watchfile("watch_dirs.txt");
    let mut executor = FakeExecutor::new();

    let err = invoke(&fs, graph, &mut executor).await.unwrap_err();
    assert_eq!(
        fatal_line("build.ninja", &err),
        "ninja: error: rebuilding 'build.ninja': \
         parsing glob watch file 'watch_dirs.txt': \
         unsupported glob watch file schema 'ninja_glob_watch_dirs_v2'"
    );
    Ok(())
}

#[tokio::test]
async fn deleted_watched_directory_counts_as_changed() -> TestResult {
    init_tracing();
    let fs = watchfile_fs();
    let graph = graph_with_watchfile("watch_dirs.txt");
    let mut executor = FakeExecutor::new();
    invoke(&fs, graph.clone(), &mut executor).await?;

    fs.remove("/work/watched");

    let outcome = invoke(&fs, graph.clone(), &mut executor).await?;
    assert_eq!(outcome, InvocationOutcome::Regenerated);
    assert_eq!(executor.run_count(), 1);

    // The absence is recorded; the next run is clean, not an error.
    let outcome = invoke(&fs, graph, &mut executor).await?;
    assert_eq!(outcome, InvocationOutcome::NoManifestWorkNeeded);
    assert_eq!(executor.run_count(), 1);
    Ok(())
}

#[tokio::test]
async fn unreadable_watched_directory_is_a_stat_error() -> TestResult {
    init_tracing();
    let fs = watchfile_fs();
    fs.add_dir("/work/denied/sub");
    fs.set_mtime("/work/denied/sub", 2_000);
    fs.add_file(
        "/work/watch_dirs.txt",
        "ninja_glob_watch_dirs_v1\ndenied/sub\n",
    );
    let graph = graph_with_watchfile("watch_dirs.txt");
    let mut executor = FakeExecutor::new();
    invoke(&fs, graph.clone(), &mut executor).await?;

    fs.deny("/work/denied/sub");

    let err = invoke(&fs, graph, &mut executor).await.unwrap_err();
    assert!(
        fatal_line("build.ninja", &err)
            .starts_with("ninja: error: rebuilding 'build.ninja': stat(denied/sub): ")
    );
    assert_eq!(executor.run_count(), 0);
    Ok(())
}

#[tokio::test]
async fn regeneration_may_drop_the_watch_file_binding() -> TestResult {
    init_tracing();
    // The regeneration removes both the binding and the watch file itself;
    // the post-regeneration refresh must not consult the stale binding.
    let fs = watchfile_fs();
    let old_graph = graph_with_watchfile("watch_dirs.txt");
    let new_graph = GraphBuilder::new("build.ninja")
        .verify_edge("build.ninja")
        .edge(
            EdgeBuilder::new("touch", "touch $out")
                .output("out")
                .build(),
        )
        .build();

    let mut executor = FakeExecutor::new();
    invoke(&fs, old_graph.clone(), &mut executor).await?;

    fs.add_file("/work/watched/new.txt", "");

    let fs_for_effect = fs.clone();
    let mut regen = FakeExecutor::new().with_effect(move |_| {
        fs_for_effect.remove("/work/watch_dirs.txt");
    });
    let loader = ScriptedLoader::new(vec![new_graph.clone()]);
    let mut status = CollectingStatus::new();
    let report = run_invocation(
        old_graph,
        &roots(),
        &loader,
        &mut regen,
        &mut status,
        &fs,
    )
    .await?;
    assert_eq!(report.outcome, InvocationOutcome::Regenerated);
    assert_eq!(regen.run_count(), 1);

    // The new graph infers its (empty) watch set; no stale-watch-file error.
    let mut executor = FakeExecutor::new();
    let outcome = invoke(&fs, new_graph, &mut executor).await?;
    assert_eq!(outcome, InvocationOutcome::NoManifestWorkNeeded);
    assert_eq!(executor.run_count(), 0);
    Ok(())
}

#[tokio::test]
async fn working_directory_entries_are_ignored() -> TestResult {
    init_tracing();
    let fs = watchfile_fs();
    fs.add_file(
        "/work/watch_dirs.txt",
        "ninja_glob_watch_dirs_v1\n.\n/work\nwatched\n",
    );
    let graph = graph_with_watchfile("watch_dirs.txt");
    let mut executor = FakeExecutor::new();

    invoke(&fs, graph.clone(), &mut executor).await?;
    let cache = fs.contents(CACHE).unwrap();
    assert!(!cache.contains("mtime\t.\t"));
    assert!(!cache.contains("mtime\t/work\t"));
    assert!(cache.contains("mtime\twatched\t"));

    // Top-level churn does not trigger anything.
    fs.add_file("/work/watch_trigger.txt", "");
    let outcome = invoke(&fs, graph, &mut executor).await?;
    assert_eq!(outcome, InvocationOutcome::NoManifestWorkNeeded);
    assert_eq!(executor.run_count(), 0);
    Ok(())
}
