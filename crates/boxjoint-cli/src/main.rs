//! boxjoint CLI - plan and build gap-first box joints
//!
//! Reads a joint from a TOML file, prints the planned layout, or builds it in
//! an in-memory document and prints the pipeline report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use boxjoint::{EdgeLayout, GapFirstBoxJoint, JointConfig, Pipeline};
use boxjoint_sketch::{FeatureQuery, MemoryDocument};

#[derive(Parser)]
#[command(name = "boxjoint")]
#[command(about = "Gap-first box joint layout", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the layout without building it
    Plan {
        /// Joint config (TOML); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the number of gaps
        #[arg(long)]
        gap_count: Option<usize>,
        /// Print the full layout as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the joint in an in-memory document and print the report
    Run {
        /// Joint config (TOML); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the number of gaps
        #[arg(long)]
        gap_count: Option<usize>,
    },
    /// Write a config file with default values
    Init {
        /// Output file; prints to stdout when omitted
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Short description of a planned layout.
#[derive(Serialize)]
struct PlanSummary {
    edge_length: f64,
    gap_count: usize,
    pattern_count: usize,
    gap_spacing: f64,
    tool_radius: f64,
    has_mid_section: bool,
}

impl PlanSummary {
    fn new(layout: &EdgeLayout, edge_length: f64) -> Self {
        Self {
            edge_length,
            gap_count: layout.gap_count,
            pattern_count: layout.pattern_count,
            gap_spacing: layout.gap_spacing,
            tool_radius: layout.start_fillet.radius(),
            has_mid_section: layout.mid.is_some(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boxjoint=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            config,
            gap_count,
            json,
        } => plan(config.as_deref(), gap_count, json)?,
        Commands::Run { config, gap_count } => run(config.as_deref(), gap_count)?,
        Commands::Init { output, force } => init(output.as_deref(), force)?,
    }

    Ok(())
}

fn load_joint(config: Option<&Path>, gap_count: Option<usize>) -> Result<GapFirstBoxJoint> {
    let mut config = match config {
        Some(path) => JointConfig::load(path)?,
        None => JointConfig::default(),
    };
    if gap_count.is_some() {
        config.joint.gap_count = gap_count;
    }
    let params = config.to_params()?;
    Ok(GapFirstBoxJoint::new(params)?)
}

fn plan(config: Option<&Path>, gap_count: Option<usize>, json: bool) -> Result<()> {
    let joint = load_joint(config, gap_count)?;
    let layout = joint.plan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    let summary = PlanSummary::new(&layout, joint.params().edge_length());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run(config: Option<&Path>, gap_count: Option<usize>) -> Result<()> {
    let joint = load_joint(config, gap_count)?;
    let layout = joint.plan()?;

    let mut doc = MemoryDocument::new();
    let mut pipeline = Pipeline::new(&mut doc, layout);
    let outcome = pipeline.run();
    let report = pipeline.into_report();

    println!("{}", serde_json::to_string_pretty(&report)?);
    outcome.context("joint could not be built")?;

    tracing::info!(
        extrude_features = doc.extrude_features().len(),
        patterns = doc.patterns().len(),
        "joint built"
    );
    Ok(())
}

fn init(output: Option<&Path>, force: bool) -> Result<()> {
    let text = JointConfig::default().to_toml_string()?;
    match output {
        Some(path) => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
