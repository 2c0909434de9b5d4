// src/main.rs

use std::path::Path;

use anyhow::{bail, Context};

use ninja_regen::cache::schema::{self, ParsedCache};
use ninja_regen::fs::{FileSystem, RealFileSystem};
use ninja_regen::types::{Provenance, RootPaths};
use ninja_regen::watch::watchfile;
use ninja_regen::{cli, logging};

fn main() {
    if let Err(err) = run_main() {
        eprintln!("ninja-regen error: {err:?}");
        std::process::exit(1);
    }
}

fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    if args.cache.is_none() && args.watchfile.is_none() {
        bail!("nothing to do: pass --cache and/or --watchfile");
    }

    let fs = RealFileSystem;
    if let Some(cache) = &args.cache {
        dump_cache(&fs, cache)?;
    }
    if let Some(watchfile) = &args.watchfile {
        validate_watchfile(&fs, watchfile)?;
    }
    Ok(())
}

fn dump_cache(fs: &RealFileSystem, path: &Path) -> anyhow::Result<()> {
    let text = fs
        .read_to_string(path)
        .with_context(|| format!("reading cache {}", path.display()))?;

    let contents = match schema::parse(&text) {
        ParsedCache::Current(contents) => {
            println!("{}: schema {}", path.display(), schema::SCHEMA_V3);
            contents
        }
        ParsedCache::Discarded { tag } => {
            println!(
                "{}: schema {tag} (superseded; records will be recomputed on the next run)",
                path.display()
            );
            return Ok(());
        }
        ParsedCache::Future { tag, best_effort } => {
            println!(
                "{}: schema {tag} (newer than this tool; decisions use {}{})",
                path.display(),
                path.display(),
                schema::COMPAT_SUFFIX
            );
            best_effort
        }
    };

    if let Some(fp) = &contents.fingerprint {
        println!("  manifest {} (mtime {} ns)", fp.path, fp.mtime_ns);
    }
    for record in &contents.records {
        let provenance = match record.provenance {
            Provenance::Inferred => "inferred",
            Provenance::Explicit => "explicit",
        };
        println!("  {provenance:8} {} (mtime {} ns)", record.dir, record.mtime_ns);
    }
    Ok(())
}

fn validate_watchfile(fs: &RealFileSystem, path: &Path) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("resolving working directory")?;
    let roots = RootPaths::new(cwd, ".");
    let spelling = path.to_string_lossy();

    let set = watchfile::read(fs, &spelling, &roots)
        .with_context(|| format!("validating watch file {}", path.display()))?;

    println!("{}: {} watched directories", path.display(), set.len());
    for dir in set.iter() {
        println!("  {}", dir.dir);
    }
    Ok(())
}
