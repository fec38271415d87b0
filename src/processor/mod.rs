//! The functional core: route, resolve and emit the whole batch in memory.
//!
//! Nothing here touches the filesystem; `crate::writer` persists the
//! resulting `Report`.
pub mod resolver;
pub mod router;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{FunctionError, GenError};
use crate::model::{Descriptor, MappingTable, Store};
use crate::writer::c::{self, ErrorIds};
use router::Exclusion;

/// Rendered text of one generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    /// Relative to the project root.
    pub path: PathBuf,
    pub lines: Vec<String>,
}

/// Final state of one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Excluded(Exclusion),
    Emitted(GeneratedFile),
    Failed(FunctionError),
}

/// Everything a run produced, ready to be written.
#[derive(Debug, Default)]
pub struct Report {
    /// Batch outcomes in batch order, followed by exclusions in load order.
    pub outcomes: Vec<(String, Outcome)>,
    /// Error identifiers referenced by the emitted files.
    pub error_ids: ErrorIds,
}

impl Report {
    pub fn generated(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            Outcome::Emitted(file) => Some(file),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FunctionError)> {
        self.outcomes.iter().filter_map(|(name, o)| match o {
            Outcome::Failed(e) => Some((name.as_str(), e)),
            _ => None,
        })
    }

    pub fn excluded(&self) -> impl Iterator<Item = (&str, Exclusion)> {
        self.outcomes.iter().filter_map(|(name, o)| match o {
            Outcome::Excluded(why) => Some((name.as_str(), *why)),
            _ => None,
        })
    }

    /// Paths for the build file list, in batch order.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.generated().map(|f| f.path.clone()).collect()
    }
}

/// Runs every pass and returns the rendered batch.
///
/// Fails only when the active mapping table is missing; per-function
/// errors end up in the report.
pub fn run(store: &Store, config: &Config) -> Result<Report, GenError> {
    let table = store
        .mapping(&config.mapping_table)
        .ok_or_else(|| GenError::MissingMappingTable(config.mapping_table.clone()))?;

    let routing = router::route(store);
    let mut report = Report::default();

    for descriptor in routing.batch {
        let outcome = match generate_one(descriptor, table, config) {
            Ok((file, ids)) => {
                debug!("rendered {} -> {}", descriptor.name, file.path.display());
                report.error_ids.extend(ids);
                Outcome::Emitted(file)
            }
            Err(e) => {
                warn!("  failed {}: {e}", descriptor.name);
                Outcome::Failed(e)
            }
        };
        report.outcomes.push((descriptor.name.clone(), outcome));
    }

    for (descriptor, why) in routing.excluded {
        match why {
            Exclusion::NotImplemented => info!("  skip {} ({why})", descriptor.name),
            Exclusion::NoDirectory => debug!("  skip {} ({why})", descriptor.name),
        }
        report
            .outcomes
            .push((descriptor.name.clone(), Outcome::Excluded(why)));
    }

    Ok(report)
}

fn generate_one(
    descriptor: &Descriptor,
    table: &MappingTable,
    config: &Config,
) -> Result<(GeneratedFile, ErrorIds), FunctionError> {
    let strategy = resolver::resolve(descriptor, table)?;
    debug!("{}: {strategy}", descriptor.name);
    let emitted = c::emit(descriptor, strategy, table, config)?;

    // routed descriptors always carry a directory
    let directory = descriptor.directory.as_deref().unwrap_or_default();
    let file = GeneratedFile {
        name: descriptor.name.clone(),
        path: router::destination(config, &descriptor.name, directory),
        lines: emitted.lines,
    };
    Ok((file, emitted.error_ids))
}
