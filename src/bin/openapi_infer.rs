//! openapi-infer: Infer OpenAPI component schemas from JSON response examples
//!
//! Usage:
//!   # Fill in response schemas of an OpenAPI document, output to stdout
//!   openapi-infer api.yaml
//!
//!   # Infer schemas from a bare JSON example read from stdin
//!   echo '{"id": 1, "email": "alice@example.com"}' | openapi-infer --example --key user
//!
//!   # Many examples of the same payload, one per line
//!   openapi-infer --example --ndjson events.jsonl --compact

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use openapi_infer::document::{self, DocumentFormat};
use openapi_infer::{infer_document, infer_examples, infer_ndjson, DocumentError, InferConfig};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{stdin, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "openapi-infer")]
#[command(about = "Infer reusable OpenAPI schemas from JSON response examples", long_about = None)]
#[command(version)]
struct Args {
    /// Input file or URL (use stdin if omitted)
    #[arg(value_name = "INPUT")]
    input: Option<String>,

    /// Treat the input as bare JSON example(s) instead of an OpenAPI document
    #[arg(long)]
    example: bool,

    /// Process newline-delimited JSON examples (one per line)
    #[arg(long, requires = "example")]
    ndjson: bool,

    /// Registry key for bare examples
    #[arg(long, default_value = "response")]
    key: String,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Write YAML instead of JSON
    #[arg(long)]
    yaml: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(long, conflicts_with = "yaml")]
    compact: bool,

    /// Do not tag strings with detected formats
    #[arg(long)]
    no_formats: bool,

    /// Give JSON responses without an example an empty object schema
    #[arg(long)]
    fill_missing: bool,

    /// Ignore the document's existing components.schemas when building the registry
    #[arg(long)]
    no_seed: bool,

    /// Write a JSON report of processed responses to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Timeout in seconds for fetching a remote document
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> InferConfig {
        InferConfig {
            default_key: self.key.clone(),
            detect_formats: !self.no_formats,
            fill_missing: self.fill_missing,
            seed_from_document: !self.no_seed,
        }
    }

    fn output_format(&self) -> DocumentFormat {
        if self.yaml {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Json
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err
                .downcast_ref::<DocumentError>()
                .map(DocumentError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();
}

fn run(args: &Args) -> Result<()> {
    let config = args.config();

    let output = if args.example {
        run_examples(args, &config)?
    } else {
        run_document(args, &config)?
    };

    let rendered = document::render_document(&output, args.output_format(), args.compact)?;
    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", rendered.trim_end()),
    }

    Ok(())
}

/// Bare examples: output the schema of the example plus the named schemas
fn run_examples(args: &Args, config: &InferConfig) -> Result<Value> {
    let (fragment, registry) = if args.ndjson {
        let reader = BufReader::new(open_input(args.input.as_deref())?);
        infer_ndjson(reader, config)?
    } else {
        let example = read_source(args)?;
        infer_examples(std::iter::once(&example), config)
    };

    if registry.is_empty() && fragment == openapi_infer::SchemaFragment::Empty {
        warn!("No JSON examples found in input");
    }

    Ok(json!({
        "schema": fragment.to_value(),
        "components": {"schemas": registry.to_components()}
    }))
}

fn run_document(args: &Args, config: &InferConfig) -> Result<Value> {
    let mut document = read_source(args)?;
    let report = infer_document(&mut document, config)?;

    for location in &report.missing_examples {
        info!(
            path = %location.path,
            method = %location.method,
            response = %location.response,
            "response has no JSON example"
        );
    }

    if let Some(path) = &args.report {
        let rendered = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    Ok(document)
}

/// Parse the whole input as a single JSON or YAML value
fn read_source(args: &Args) -> Result<Value> {
    match args.input.as_deref() {
        Some(url) if is_url(url) => fetch(url, args.timeout),
        Some(path) => Ok(document::load_document(Path::new(path))?),
        None => {
            let mut bytes = Vec::new();
            stdin()
                .read_to_end(&mut bytes)
                .context("Failed to read stdin")?;
            Ok(document::parse_document(&bytes, None)?)
        }
    }
}

fn open_input(input: Option<&str>) -> Result<Box<dyn Read>> {
    match input {
        Some(path) => {
            let file = File::open(path).map_err(|source| DocumentError::Read {
                path: PathBuf::from(path),
                source,
            })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(stdin())),
    }
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

#[cfg(feature = "remote")]
fn fetch(url: &str, timeout: u64) -> Result<Value> {
    Ok(document::fetch_document(url, std::time::Duration::from_secs(timeout))?)
}

#[cfg(not(feature = "remote"))]
fn fetch(url: &str, _timeout: u64) -> Result<Value> {
    anyhow::bail!("cannot fetch {url}: built without the `remote` feature")
}
