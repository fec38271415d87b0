//! Aggregator: the three artifacts built from the whole run.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::c::{ErrorIds, impl_declaration};
use super::write_lines;
use crate::config::Config;
use crate::model::{MappingTable, Store};

const GENERATED_NOTE: &str = "Generated by capigen. DO NOT EDIT.";

/// `mpi_sources += \` fragment listing `paths` in batch order.
pub fn render_sources_list(paths: &[PathBuf]) -> Vec<String> {
    let mut lines = vec![format!("# {GENERATED_NOTE}"), String::new()];
    if paths.is_empty() {
        return lines;
    }

    lines.push("mpi_sources += \\".to_string());
    for (i, path) in paths.iter().enumerate() {
        let cont = if i + 1 < paths.len() { " \\" } else { "" };
        lines.push(format!("    {}{cont}", path.display()));
    }
    lines
}

pub fn write_sources_list(path: &Path, paths: &[PathBuf]) -> io::Result<()> {
    write_lines(path, &render_sources_list(paths))
}

/// One implementation prototype per implemented descriptor, sorted by name.
///
/// Unlike the generation batch this covers functions without an output
/// directory too: their wrappers live elsewhere but still call into the
/// implementation.
pub fn render_declarations_header(
    header: &Path,
    store: &Store,
    table: &MappingTable,
    config: &Config,
) -> Vec<String> {
    let guard = include_guard(header);

    let mut implemented: Vec<_> = store.descriptors().filter(|d| !d.not_implemented).collect();
    implemented.sort_by(|a, b| a.name.cmp(&b.name));

    let mut lines = vec![
        "/*".to_string(),
        format!(" * {GENERATED_NOTE}"),
        " */".to_string(),
        String::new(),
        format!("#ifndef {guard}"),
        format!("#define {guard}"),
        String::new(),
    ];
    for descriptor in implemented {
        match impl_declaration(descriptor, table, config) {
            Ok(decl) => lines.push(decl),
            Err(e) => warn!("no declaration for {}: {e}", descriptor.name),
        }
    }
    lines.push(String::new());
    lines.push(format!("#endif /* {guard} */"));
    lines
}

pub fn write_declarations_header(
    header: &Path,
    store: &Store,
    table: &MappingTable,
    config: &Config,
) -> io::Result<()> {
    write_lines(header, &render_declarations_header(header, store, table, config))
}

/// `id:message` per error identifier; the map is already sorted and
/// deduplicated.
pub fn render_error_table(error_ids: &ErrorIds) -> Vec<String> {
    let mut lines = vec![format!("# {GENERATED_NOTE}")];
    lines.extend(error_ids.iter().map(|(id, msg)| format!("{id}:{msg}")));
    lines
}

pub fn write_error_table(path: &Path, error_ids: &ErrorIds) -> io::Result<()> {
    write_lines(path, &render_error_table(error_ids))
}

/// `src/include/mpir_impl.h` -> `MPIR_IMPL_H_INCLUDED`
fn include_guard(header: &Path) -> String {
    let file = header
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "generated.h".to_string());
    let ident: String = file
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{ident}_INCLUDED")
}
