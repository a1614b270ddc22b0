//! Minimal CLI: parse schema documents → (check | tree)
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use json_schema_tree::loader::SchemeLoader;
use json_schema_tree::{SchemaDocument, SchemaError};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// parse JSON Schema documents, resolving `$ref`s across files and URLs
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    #[command(flatten)]
    global: GlobalSettings,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse every input and report OK / FAIL per document
    Check(CheckCmd),
    /// parse one document and print its resolved schema tree as JSON
    Tree(TreeCmd),
}

#[derive(Args, Debug, Clone)]
struct GlobalSettings {
    /// log fetches and `$ref` substitution (overridden by RUST_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    /// timeout for http(s) fetches, in seconds (needs the `http` feature)
    #[arg(long, global = true, default_value_t = 30)]
    http_timeout: u64,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    /// One or more inputs. May be literal paths, URLs, or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct TreeCmd {
    /// schema path or URL
    #[arg(long, short)]
    input: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl GlobalSettings {
    fn init_logging(&self) {
        let default = if self.verbose { "json_schema_tree=debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    fn loader(&self) -> Result<SchemeLoader> {
        let loader = SchemeLoader::new();
        #[cfg(feature = "http")]
        let loader = loader.with_http(
            json_schema_tree::HttpLoader::new(std::time::Duration::from_secs(self.http_timeout))
                .context("failed to build http client")?,
        );
        #[cfg(not(feature = "http"))]
        tracing::trace!(
            timeout_secs = self.http_timeout,
            "built without the `http` feature; http(s) documents cannot be fetched"
        );
        Ok(loader)
    }

    fn parse_document(&self, location: &str) -> Result<SchemaDocument> {
        let loader = self.loader()?;
        let document = SchemaDocument::with_loader(location, loader)
            .with_context(|| format!("failed to parse schema {location}"))?;
        Ok(document)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        self.global.init_logging();
        match &self.cmd {
            Command::Check(target) => {
                let locations = resolve_input_patterns(&target.input)?;

                // one document (and pool) per input; inputs are independent
                let outcomes: Vec<(String, Result<usize, String>)> = locations
                    .par_iter()
                    .map(|location| {
                        let outcome = self
                            .global
                            .loader()
                            .map_err(|error| format!("{error:#}"))
                            .and_then(|loader| {
                                SchemaDocument::with_loader(location, loader)
                                    .map(|document| document.len())
                                    .map_err(|error: SchemaError| error.to_string())
                            });
                        (location.clone(), outcome)
                    })
                    .collect();

                let mut failures = 0usize;
                for (location, outcome) in &outcomes {
                    match outcome {
                        Ok(nodes) => println!("{} {location} ({nodes} nodes)", "OK".green().bold()),
                        Err(error) => {
                            failures += 1;
                            println!("{} {location}: {error}", "FAIL".red().bold());
                        }
                    }
                }
                if failures > 0 {
                    bail!("{failures} of {} schema(s) failed to parse", outcomes.len());
                }
                Ok(())
            }
            Command::Tree(target) => {
                let document = self.global.parse_document(&target.input)?;
                let outline = json_schema_tree::outline::emit_outline(&document);
                let outline_src = serde_json::to_string_pretty(&outline)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &outline_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{outline_src}");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_input_patterns<I>(patterns: I) -> Result<Vec<String>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    fn is_url(s: &str) -> bool {
        url::Url::parse(s).is_ok_and(|u| u.scheme().len() > 1)
    }

    let mut out = Vec::<String>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if !is_url(pattern) && has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                let path = entry?;
                matched_any = true;
                out.push(path.to_string_lossy().to_string());
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(pattern.to_string());
        }
    }

    Ok(out)
}
