//! `yamlbridge` CLI, converting between YAML and JSON from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # YAML to pretty-printed JSON (stdin → stdout)
//! echo 'name: Alice' | yamlbridge to-json
//!
//! # YAML to compact JSON, file to file
//! yamlbridge to-json --compact -i config.yaml -o config.json
//!
//! # JSON to YAML
//! yamlbridge to-yaml -i config.json
//!
//! # Multi-document YAML to JSON lines, and back
//! yamlbridge split -i stream.yaml > docs.jsonl
//! yamlbridge join -i docs.jsonl
//! ```
//!
//! Set `RUST_LOG=debug` to see per-document events on stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use yamlbridge_core::{StreamDecoder, StreamEncoder};

#[derive(Parser)]
#[command(name = "yamlbridge", version, about = "Convert between YAML and JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a YAML document to JSON
    ToJson {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Emit compact JSON instead of indented JSON
        #[arg(long)]
        compact: bool,
    },
    /// Convert a JSON document to YAML
    ToYaml {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Convert a multi-document YAML stream to JSON lines
    Split {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Convert JSON lines to a multi-document YAML stream
    Join {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::ToJson {
            input,
            output,
            compact,
        } => {
            let yaml = read_input(input.as_deref())?;
            let mut json = if compact {
                yamlbridge_core::yaml_to_json(&yaml)
            } else {
                yamlbridge_core::yaml_to_json_pretty(&yaml)
            }
            .context("Failed to convert YAML to JSON")?;
            json.push('\n');
            write_output(output.as_deref(), &json)?;
        }
        Commands::ToYaml { input, output } => {
            let json = read_input(input.as_deref())?;
            let yaml =
                yamlbridge_core::json_to_yaml(&json).context("Failed to convert JSON to YAML")?;
            write_output(output.as_deref(), &yaml)?;
        }
        Commands::Split { input, output } => {
            let yaml = read_input(input.as_deref())?;
            let mut lines = String::new();
            for (index, document) in StreamDecoder::from_str(&yaml)
                .documents::<Value>()
                .enumerate()
            {
                let value = document
                    .with_context(|| format!("Failed to read document {}", index + 1))?;
                lines.push_str(&yamlbridge_core::json::to_string(&value)?);
                lines.push('\n');
            }
            write_output(output.as_deref(), &lines)?;
        }
        Commands::Join { input, output } => {
            let text = read_input(input.as_deref())?;
            let mut encoder = StreamEncoder::new(Vec::new());
            for (index, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                // JSON is read with the YAML reader so repeated keys are caught here too.
                let value = yamlbridge_core::yaml_to_value(line)
                    .with_context(|| format!("Failed to parse JSON on line {}", index + 1))?;
                encoder.encode(&value)?;
            }
            debug!(documents = encoder.documents_written(), "joined JSON lines");
            let yaml = String::from_utf8(encoder.into_inner())
                .context("Encoded YAML was not valid UTF-8")?;
            write_output(output.as_deref(), &yaml)?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
