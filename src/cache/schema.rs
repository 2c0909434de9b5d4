// src/cache/schema.rs

//! On-disk representation of the glob-directory cache.
//!
//! The cache is plain newline-terminated UTF-8, tagged by a first-line
//! schema literal. Three schemas exist; only v3 is read as-is:
//!
//! | tag                  | action on load                               |
//! |----------------------|----------------------------------------------|
//! | `ninja_glob_dirs_v1` | records discarded, set recomputed            |
//! | `ninja_glob_dirs_v2` | records discarded, set recomputed            |
//! | `ninja_glob_dirs_v3` | used as-is                                   |
//! | anything else        | left untouched; a `.compat_v3` sibling is    |
//! |                      | maintained instead                           |
//!
//! v3 shape:
//!
//! ```text
//! ninja_glob_dirs_v3
//! manifest<TAB><manifest-mtime-ns><TAB><manifest-path>
//! inferred<TAB><dir>
//! mtime<TAB><dir><TAB><mtime-ns>
//! ```
//!
//! Explicitly watched directories (from a watch file) carry only a `mtime`
//! record; an `inferred` record marks classifier provenance. That pairing is
//! how provenance survives a round trip.

use crate::types::Provenance;

pub const SCHEMA_V1: &str = "ninja_glob_dirs_v1";
pub const SCHEMA_V2: &str = "ninja_glob_dirs_v2";
pub const SCHEMA_V3: &str = "ninja_glob_dirs_v3";

/// Suffix of the sibling file maintained when the primary cache carries an
/// unrecognised (newer) schema tag.
pub const COMPAT_SUFFIX: &str = ".compat_v3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFingerprint {
    pub mtime_ns: u64,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRecord {
    pub dir: String,
    pub mtime_ns: u64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheContents {
    pub fingerprint: Option<ManifestFingerprint>,
    pub records: Vec<DirRecord>,
}

#[derive(Debug)]
pub enum ParsedCache {
    /// A well-formed v3 file.
    Current(CacheContents),
    /// A v1/v2 file, or a v3 file violating its own invariants: the
    /// directory set is unknown and must be recomputed.
    Discarded { tag: String },
    /// A schema from a newer version of the orchestrator. The file must not
    /// be modified; `best_effort` holds whatever v3-shaped records could be
    /// salvaged for this run's decisions.
    Future {
        tag: String,
        best_effort: CacheContents,
    },
}

pub fn parse(text: &str) -> ParsedCache {
    let mut lines = text.lines();
    let tag = lines.next().unwrap_or("").trim_end_matches('\r');

    match tag {
        SCHEMA_V3 => match parse_records(lines, true) {
            Some(contents) => ParsedCache::Current(contents),
            None => ParsedCache::Discarded {
                tag: SCHEMA_V3.to_string(),
            },
        },
        SCHEMA_V1 | SCHEMA_V2 => ParsedCache::Discarded {
            tag: tag.to_string(),
        },
        other => ParsedCache::Future {
            tag: other.to_string(),
            best_effort: parse_records(text.lines().skip(1), false).unwrap_or_default(),
        },
    }
}

/// Parse `manifest`/`inferred`/`mtime` records.
///
/// In strict mode any malformed or unknown line invalidates the file, and
/// every `inferred` entry must pair with exactly one `mtime` entry. In
/// lenient mode (future schemas) unknown lines are skipped.
fn parse_records<'a>(
    lines: impl Iterator<Item = &'a str>,
    strict: bool,
) -> Option<CacheContents> {
    let mut fingerprint = None;
    let mut inferred: Vec<String> = Vec::new();
    let mut mtimes: Vec<(String, u64)> = Vec::new();

    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            ["manifest", mtime, path] => match mtime.parse::<u64>() {
                Ok(mtime_ns) => {
                    fingerprint = Some(ManifestFingerprint {
                        mtime_ns,
                        path: path.to_string(),
                    });
                }
                Err(_) if strict => return None,
                Err(_) => {}
            },
            ["inferred", dir] => inferred.push(dir.to_string()),
            ["mtime", dir, mtime] => match mtime.parse::<u64>() {
                Ok(mtime_ns) => mtimes.push((dir.to_string(), mtime_ns)),
                Err(_) if strict => return None,
                Err(_) => {}
            },
            _ if strict => return None,
            _ => {}
        }
    }

    if strict {
        for dir in &inferred {
            if mtimes.iter().filter(|(d, _)| d == dir).count() != 1 {
                return None;
            }
        }
    }

    let records = mtimes
        .into_iter()
        .map(|(dir, mtime_ns)| {
            let provenance = if inferred.contains(&dir) {
                Provenance::Inferred
            } else {
                Provenance::Explicit
            };
            DirRecord {
                dir,
                mtime_ns,
                provenance,
            }
        })
        .collect();

    Some(CacheContents {
        fingerprint,
        records,
    })
}

/// Serialise to v3 bytes. Record order is preserved, so identical inputs
/// produce identical files.
pub fn serialize(contents: &CacheContents) -> String {
    let mut out = String::new();
    out.push_str(SCHEMA_V3);
    out.push('\n');
    if let Some(fp) = &contents.fingerprint {
        out.push_str(&format!("manifest\t{}\t{}\n", fp.mtime_ns, fp.path));
    }
    for record in &contents.records {
        if record.provenance == Provenance::Inferred {
            out.push_str(&format!("inferred\t{}\n", record.dir));
        }
        out.push_str(&format!("mtime\t{}\t{}\n", record.dir, record.mtime_ns));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v3_text() -> String {
        concat!(
            "ninja_glob_dirs_v3\n",
            "manifest\t1700000000000000000\tbuild.ninja\n",
            "inferred\tsrc\n",
            "mtime\tsrc\t1700000000000000001\n",
            "mtime\twatched\t1700000000000000002\n",
        )
        .to_string()
    }

    #[test]
    fn v3_round_trips_byte_identical() {
        let text = v3_text();
        let ParsedCache::Current(contents) = parse(&text) else {
            panic!("expected current schema");
        };
        assert_eq!(serialize(&contents), text);
    }

    #[test]
    fn provenance_is_recovered_from_record_pairing() {
        let ParsedCache::Current(contents) = parse(&v3_text()) else {
            panic!("expected current schema");
        };
        assert_eq!(contents.records.len(), 2);
        assert_eq!(contents.records[0].provenance, Provenance::Inferred);
        assert_eq!(contents.records[1].provenance, Provenance::Explicit);
    }

    #[test]
    fn v1_and_v2_are_discarded() {
        let v1 = "ninja_glob_dirs_v1\ngen\t123\n";
        assert!(matches!(parse(v1), ParsedCache::Discarded { tag } if tag == SCHEMA_V1));

        let v2 = concat!(
            "ninja_glob_dirs_v2\n",
            "manifest\t10\tbuild.ninja\n",
            "inferred\tgen\n",
            "mtime\tgen\t123\n",
        );
        assert!(matches!(parse(v2), ParsedCache::Discarded { tag } if tag == SCHEMA_V2));
    }

    #[test]
    fn v3_with_orphan_inferred_record_is_discarded() {
        let text = "ninja_glob_dirs_v3\ninferred\tsrc\n";
        assert!(matches!(parse(text), ParsedCache::Discarded { .. }));
    }

    #[test]
    fn future_schema_salvages_known_records() {
        let text = concat!(
            "ninja_glob_dirs_v999\n",
            "manifest\t10\tbuild.ninja\n",
            "inferred\tsrc\n",
            "mtime\tsrc\t42\n",
            "hologram\tsomething-new\n",
        );
        let ParsedCache::Future { tag, best_effort } = parse(text) else {
            panic!("expected future schema");
        };
        assert_eq!(tag, "ninja_glob_dirs_v999");
        assert_eq!(best_effort.records.len(), 1);
        assert_eq!(best_effort.records[0].dir, "src");
        assert_eq!(best_effort.records[0].mtime_ns, 42);
    }
}
