//! Fixture runner: every `cases/*.json` file holds a list of schema parse
//! cases (in-memory documents + expected outcome).
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use json_schema_tree::{MemoryLoader, SchemaDocument};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    description: String,
    /// canonical URI → document
    documents: Map<String, Value>,
    root: String,
    expect: Expect,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Expect {
    Ok {
        #[serde(default)]
        nodes: Option<usize>,
    },
    Error {
        kind: String,
        #[serde(default)]
        path: Option<String>,
    },
}

impl Case {
    fn run(&self) -> Result<(), String> {
        let mut loader = MemoryLoader::new();
        for (uri, document) in &self.documents {
            let uri = Url::parse(uri).map_err(|error| format!("bad document uri {uri}: {error}"))?;
            loader.register(&uri, document.to_string());
        }
        let outcome = SchemaDocument::with_loader(&self.root, loader);
        match (&self.expect, outcome) {
            (Expect::Ok { nodes }, Ok(document)) => match nodes {
                Some(n) if *n != document.len() => {
                    Err(format!("expected {n} nodes, parsed {}", document.len()))
                }
                _ => Ok(()),
            },
            (Expect::Ok { .. }, Err(error)) => Err(format!("expected success, got: {error}")),
            (Expect::Error { kind, .. }, Ok(_)) => Err(format!("expected {kind} error, parse succeeded")),
            (Expect::Error { kind, path }, Err(error)) => {
                if error.kind() != kind {
                    return Err(format!("expected {kind} error, got {}: {error}", error.kind()));
                }
                match path {
                    Some(path) if path != error.path() => {
                        Err(format!("expected error at {path}, got {}", error.path()))
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

/// Decode a case file, pointing at the offending fixture field on failure.
fn load_cases(file: &Path) -> Result<Vec<Case>> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize::<_, Vec<Case>>(de).map_err(|err| {
        let path = err.path().to_string();
        anyhow::anyhow!("{}: at JSON path {path} → {}", file.display(), err.into_inner())
    })
}

fn case_files(args: &[String]) -> Result<Vec<PathBuf>> {
    let default = format!("{}/cases/*.json", env!("CARGO_MANIFEST_DIR"));
    let patterns = if args.is_empty() { vec![default] } else { args.to_vec() };
    let mut out = Vec::new();
    for pattern in &patterns {
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
            out.push(entry?);
        }
    }
    out.sort();
    Ok(out)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let files = case_files(&args)?;
    if files.is_empty() {
        bail!("no case files found");
    }

    let (mut passed, mut failed) = (0usize, 0usize);
    for file in &files {
        let cases = load_cases(file)?;
        eprintln!("—— {} ——", file.display());
        for case in &cases {
            match case.run() {
                Ok(()) => {
                    passed += 1;
                    eprintln!("{} {}", "✅".green(), case.description);
                }
                Err(reason) => {
                    failed += 1;
                    eprintln!("{} {}: {reason}", "❌".red(), case.description);
                }
            }
        }
    }

    eprintln!("{passed} passed, {failed} failed");
    if failed > 0 {
        bail!("{failed} case(s) failed");
    }
    Ok(())
}
