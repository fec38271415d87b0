//! Structured catalog: one JSON object mapping function names to entries.
//!
//! ```json
//! {
//!   "MPI_Send": {
//!     "category": "pt2pt",
//!     "desc": "Performs a blocking send",
//!     "parameters": [
//!       { "name": "buf", "kind": "BUFFER", "constant": true },
//!       { "name": "count", "kind": "COUNT" }
//!     ]
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ParseError;
use crate::model::{Descriptor, Parameter, Signature};

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    category: String,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default, alias = "directory")]
    dir: Option<String>,
    #[serde(default)]
    not_implemented: bool,
    #[serde(default)]
    parameters: Vec<Parameter>,
}

/// Parses a whole catalog. Object order is kept, so descriptors come out
/// in file order.
pub fn parse_catalog(source_name: &str, json: &str) -> Result<Vec<Descriptor>, ParseError> {
    let entries: IndexMap<String, CatalogEntry> =
        serde_json::from_str(json).map_err(|error| ParseError::Catalog {
            source_name: source_name.to_string(),
            error,
        })?;

    Ok(entries
        .into_iter()
        .map(|(name, entry)| Descriptor {
            name,
            category: entry.category,
            directory: entry.dir,
            not_implemented: entry.not_implemented,
            signature: Signature {
                desc: entry.desc,
                parameters: entry.parameters,
            },
        })
        .collect())
}
