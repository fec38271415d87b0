//! Specification Loader.
//!
//! Every `load_*` function parses its whole source first and only then
//! merges into the store, so a malformed source leaves the store untouched.

pub mod catalog;
pub mod lexer;
pub mod table;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ParseError;
use crate::model::{Descriptor, Store};

/// `pt2pt_api.txt` -> `pt2pt`
static OVERRIDE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)_api\.txt$").expect("override file pattern is valid"));

/// Text of one input file together with the name used in error messages.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, ParseError> {
        let text = fs::read_to_string(path).map_err(|error| ParseError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Merges every descriptor of a structured catalog into `store`.
pub fn load_descriptors(store: &mut Store, source: &Source) -> Result<(), ParseError> {
    let descriptors = catalog::parse_catalog(&source.name, &source.text)?;
    info!("{}: {} functions", source.name, descriptors.len());
    for descriptor in descriptors {
        store.insert(descriptor);
    }
    Ok(())
}

/// Merges descriptors from plain-text tables, in order. A name seen again
/// replaces the earlier descriptor.
pub fn load_descriptors_legacy(store: &mut Store, sources: &[Source]) -> Result<(), ParseError> {
    let mut parsed = Vec::new();
    for source in sources {
        let blocks = table::parse_table(&source.name, &source.text)?;
        info!("{}: {} functions", source.name, blocks.len());
        for block in blocks {
            parsed.push(block.into_descriptor(&source.name)?);
        }
    }

    for descriptor in parsed {
        store.insert(descriptor);
    }
    Ok(())
}

/// Applies a per-directory override table: every function it names is
/// tagged with `directory` and therefore becomes eligible for generation.
///
/// Header-only blocks annotate a function loaded earlier, either into the
/// store or by a previous block of the same table; blocks carrying a
/// category or parameters redefine the function from scratch. Blocks apply
/// in order on a staged copy that is merged only once the whole table
/// checked out.
pub fn load_overrides(store: &mut Store, source: &Source, directory: &str) -> Result<(), ParseError> {
    let blocks = table::parse_table(&source.name, &source.text)?;
    info!("{}: {} functions -> {directory}/", source.name, blocks.len());

    let mut staged = IndexMap::<String, Descriptor>::new();
    for block in blocks {
        let mut descriptor = if block.is_patch() {
            let Some(known) = staged.get(&block.name).or_else(|| store.get(&block.name)) else {
                return Err(lexer::syntax_error(
                    &source.name,
                    block.line,
                    format!("override for unknown function `{}`", block.name),
                ));
            };
            let mut patched = known.clone();
            if let Some(flag) = block.not_implemented {
                patched.not_implemented = flag;
            }
            if block.desc.is_some() {
                patched.signature.desc = block.desc;
            }
            patched
        } else {
            block.into_descriptor(&source.name)?
        };
        descriptor.directory = Some(directory.to_string());
        staged.insert(descriptor.name.clone(), descriptor);
    }

    for descriptor in staged.into_values() {
        store.insert(descriptor);
    }
    Ok(())
}

/// Merges mapping rules into the tables they declare.
pub fn load_mapping(store: &mut Store, source: &Source) -> Result<(), ParseError> {
    let rules = table::parse_mapping(&source.name, &source.text)?;
    info!("{}: {} rules", source.name, rules.len());
    for (table, key, value) in rules {
        store.set_rule(&table, key, value);
    }
    Ok(())
}

/// Loads the whole project below `root` the way `config` lays it out.
pub fn load_project(root: &Path, config: &Config) -> Result<Store, ParseError> {
    let mut store = Store::new();
    let spec_dir = root.join(&config.spec_dir);

    // -- standard functions: catalog if present, text table otherwise --
    let catalog_path = spec_dir.join(Config::CATALOG_FILE);
    if catalog_path.exists() {
        info!("Loading {} ...", catalog_path.display());
        load_descriptors(&mut store, &Source::read(&catalog_path)?)?;
    } else {
        let table_path = spec_dir.join(Config::STANDARD_TABLE_FILE);
        info!("Loading {} ...", table_path.display());
        load_descriptors_legacy(&mut store, &[Source::read(&table_path)?])?;
    }

    // -- mapping rules, custom last --
    let mapping_path = spec_dir.join(Config::MAPPING_FILE);
    info!("Loading {} ...", mapping_path.display());
    load_mapping(&mut store, &Source::read(&mapping_path)?)?;

    let custom_path = spec_dir.join(Config::CUSTOM_MAPPING_FILE);
    if custom_path.exists() {
        info!("Loading {} ...", custom_path.display());
        load_mapping(&mut store, &Source::read(&custom_path)?)?;
    } else {
        info!("No {}, using standard mapping only", custom_path.display());
    }

    // -- per-directory overrides --
    for (path, directory) in override_files(&root.join(&config.binding_dir))? {
        info!("Loading {} ...", path.display());
        load_overrides(&mut store, &Source::read(&path)?, &directory)?;
    }

    if store.is_empty() {
        warn!("no functions loaded below {}", spec_dir.display());
    }

    Ok(store)
}

/// `<dir>_api.txt` files of `binding_dir`, sorted by file name.
fn override_files(binding_dir: &Path) -> Result<Vec<(PathBuf, String)>, ParseError> {
    let io_err = |error: std::io::Error| ParseError::Io {
        path: binding_dir.to_path_buf(),
        error,
    };

    if !binding_dir.is_dir() {
        debug!("{} does not exist, no overrides", binding_dir.display());
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(binding_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(caps) = OVERRIDE_FILE.captures(file_name) {
            let directory = caps[1].to_string();
            found.push((path.clone(), directory));
        }
    }
    found.sort();
    Ok(found)
}
