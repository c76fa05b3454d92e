//! Command-line interface for segiq.
//!
//! Provides commands for resolving header fields, ranking CRS
//! candidates, listing the field vocabulary, and inspecting the
//! resolved configuration. Reports are JSON, serialized verbatim from
//! the engine's value objects.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::adapters::provider_from_env;
use crate::config::EngineConfig;
use crate::crs::{solve, Units};
use crate::evidence::{arbitrate, FieldMap, HeaderField, ProvenanceEntry};
use crate::extract::parse_baseline;
use crate::infer::infer_header;

/// segiq - Evidence resolution and CRS ranking for survey headers
#[derive(Parser, Debug)]
#[command(name = "segiq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve header fields (pattern extraction + inference when configured)
    Parse {
        /// Header text file (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Skip the inference provider even if one is configured
        #[arg(long)]
        no_inference: bool,
    },

    /// Rank CRS candidates for header text
    Crs {
        /// Header text file (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Unit override from trace statistics (beats text-detected units)
        #[arg(short, long, value_enum)]
        units: Option<UnitsArg>,
    },

    /// List the recognized field vocabulary
    Fields,

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitsArg {
    M,
    Ft,
}

impl From<UnitsArg> for Units {
    fn from(arg: UnitsArg) -> Self {
        match arg {
            UnitsArg::M => Units::Meters,
            UnitsArg::Ft => Units::Feet,
        }
    }
}

/// Field-resolution report, serialized as-is
#[derive(Debug, Serialize)]
struct ParseReport {
    generated_at: String,
    input_sha256: String,
    fields: FieldMap,
    provenance: Vec<ProvenanceEntry>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Parse {
                input,
                no_inference,
            } => parse_header(input, no_inference).await,
            Commands::Crs { input, units } => rank_crs(input, units.map(Into::into)).await,
            Commands::Fields => list_fields(),
            Commands::Config => show_config(),
        }
    }
}

/// Read header text from a file or stdin, split into lines.
fn read_lines(input: Option<PathBuf>) -> Result<(String, Vec<String>)> {
    let text = match input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let lines = text.lines().map(|l| l.to_string()).collect();
    Ok((text, lines))
}

fn input_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

async fn parse_header(input: Option<PathBuf>, no_inference: bool) -> Result<()> {
    let config = EngineConfig::load()?;
    let (text, lines) = read_lines(input)?;

    let baseline = parse_baseline(&lines);
    info!(fields = baseline.len(), "baseline extraction complete");

    let inference = if no_inference {
        FieldMap::new()
    } else {
        match provider_from_env() {
            Some(provider) => infer_header(provider.as_ref(), &lines).await,
            None => {
                info!("no inference provider configured; pattern extraction only");
                FieldMap::new()
            }
        }
    };

    let (fields, provenance) = arbitrate(&baseline, &inference, &config.arbiter);

    let report = ParseReport {
        generated_at: Utc::now().to_rfc3339(),
        input_sha256: input_digest(&text),
        fields,
        provenance,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn rank_crs(input: Option<PathBuf>, units: Option<Units>) -> Result<()> {
    let config = EngineConfig::load()?;
    let (_, lines) = read_lines(input)?;

    let resolution = solve(&lines, units, &config.crs);
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

fn list_fields() -> Result<()> {
    for field in HeaderField::ALL {
        println!("{field}");
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let config = EngineConfig::load()?;
    println!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
