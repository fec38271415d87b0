//! Error types for every stage of the generator.
//!
//! `ParseError` and `GenError` abort a run before anything is written.
//! `FunctionError` is scoped to a single function: the batch records it and
//! moves on.

use std::path::PathBuf;

use thiserror::Error;

/// A specification or mapping source could not be read or understood.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source file could not be read.
    #[error("I/O error reading {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    /// A text table line violates the table grammar.
    #[error("{source_name}:{line}: {message}")]
    Syntax {
        source_name: String,
        line: usize,
        message: String,
    },

    /// The structured catalog is not valid JSON or does not have the
    /// expected shape.
    #[error("{source_name}: invalid catalog: {error}")]
    Catalog {
        source_name: String,
        error: serde_json::Error,
    },
}

/// A descriptor's category could not be turned into a strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("{function}: category `{category}` has no entry in mapping table `{table}`")]
    UnmappedCategory {
        function: String,
        category: String,
        table: String,
    },

    #[error("{function}: category `{category}` maps to unknown strategy `{strategy}`")]
    UnknownStrategy {
        function: String,
        category: String,
        strategy: String,
    },
}

/// The emitter could not produce text for one function.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmissionError {
    #[error("{function}: parameter `{parameter}` has kind `{kind}` with no entry in mapping table `{table}`")]
    UnmappedParameterKind {
        function: String,
        parameter: String,
        kind: String,
        table: String,
    },

    #[error("{function}: parameter `{parameter}` has C type `{ty}` with no error format conversion")]
    NoFormatSpec {
        function: String,
        parameter: String,
        ty: String,
    },
}

/// Failure confined to one function of the batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FunctionError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Emission(#[from] EmissionError),
}

/// Run-wide failure detected after loading, before any output is written.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("mapping table `{0}` was not loaded")]
    MissingMappingTable(String),
}
