//! Writes a finished `Report` to disk.

pub mod aggregate;
pub mod builder;
pub mod c;

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::error::GenError;
use crate::model::Store;
use crate::processor::Report;

/// Writes `lines` to `path`, creating parent directories as needed.
pub fn write_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, builder::to_text(lines))
}

/// Writes every generated file below `root`, then the file list, the
/// declarations header and the error table.
pub fn emit(report: &Report, store: &Store, config: &Config, root: &Path) -> Result<()> {
    let table = store
        .mapping(&config.mapping_table)
        .ok_or_else(|| GenError::MissingMappingTable(config.mapping_table.clone()))?;

    for file in report.generated() {
        info!("  --> [{}]", file.path.display());
        let path = root.join(&file.path);
        write_lines(&path, &file.lines).with_context(|| format!("Writing {}", path.display()))?;
    }

    let sources = root.join(config.sources_list_path());
    info!("  --> [{}]", sources.display());
    aggregate::write_sources_list(&sources, &report.sources())
        .with_context(|| format!("Writing {}", sources.display()))?;

    let header = root.join(&config.header);
    info!("  --> [{}]", header.display());
    aggregate::write_declarations_header(&header, store, table, config)
        .with_context(|| format!("Writing {}", header.display()))?;

    let errnames = root.join(config.error_table_path());
    info!("  --> [{}]", errnames.display());
    aggregate::write_error_table(&errnames, &report.error_ids)
        .with_context(|| format!("Writing {}", errnames.display()))?;

    Ok(())
}
