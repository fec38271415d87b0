pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::config::Config;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    generate(&args.root, &args.config())
}

/// Full pipeline over the project at `root`.
pub fn generate(root: &Path, config: &Config) -> anyhow::Result<()> {
    // 1. ── Load ───────────────────────────────────────────────────────
    let store = parser::load_project(root, config)
        .with_context(|| format!("Loading specifications below {}", root.display()))?;

    // 2. ── Process ────────────────────────────────────────────────────
    let report = processor::run(&store, config).with_context(|| "Generating bindings")?;

    // 3. ── Write outputs ──────────────────────────────────────────────
    writer::emit(&report, &store, config, root).with_context(|| "Writing generated sources")?;

    let failed = report.failures().count();
    info!(
        "{} generated, {} failed, {} skipped",
        report.generated().count(),
        failed,
        report.excluded().count()
    );
    if failed > 0 {
        warn!("{failed} functions were not generated, see above");
    }

    Ok(())
}
