//! Run-wide settings shared by every pipeline stage.

use std::path::PathBuf;

/// Everything the generator needs to know besides the specification itself.
///
/// Paths are relative to the project root handed to the loader and writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Mapping table used to resolve categories and parameter kinds.
    pub mapping_table: String,
    /// Prefix of public symbols, e.g. `MPI` in `MPI_Send`.
    pub api_prefix: String,
    /// Prefix of internal implementation symbols, e.g. `MPIR` in `MPIR_Send_impl`.
    pub impl_prefix: String,
    /// Directory holding the catalog / standard table and the mapping files.
    pub spec_dir: PathBuf,
    /// Directory holding the override tables; generated files land below it.
    pub binding_dir: PathBuf,
    /// Consolidated declarations header.
    pub header: PathBuf,
}

impl Config {
    pub const CATALOG_FILE: &'static str = "apis.json";
    pub const STANDARD_TABLE_FILE: &'static str = "mpi_standard_api.txt";
    pub const MAPPING_FILE: &'static str = "apis_mapping.txt";
    pub const CUSTOM_MAPPING_FILE: &'static str = "custom_mapping.txt";
    pub const SOURCES_LIST_FILE: &'static str = "Makefile.mk";
    pub const ERROR_TABLE_FILE: &'static str = "errnames.txt";

    pub fn sources_list_path(&self) -> PathBuf {
        self.binding_dir.join(Self::SOURCES_LIST_FILE)
    }

    pub fn error_table_path(&self) -> PathBuf {
        self.binding_dir.join(Self::ERROR_TABLE_FILE)
    }

    /// `MPI_Send` -> `Send`; names without the prefix are returned unchanged.
    pub fn bare_name<'a>(&self, name: &'a str) -> &'a str {
        name.strip_prefix(self.api_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(name)
    }

    /// `MPI_Send` -> `MPIR_Send_impl`
    pub fn impl_name(&self, name: &str) -> String {
        format!("{}_{}_impl", self.impl_prefix, self.bare_name(name))
    }

    /// `MPI_Send` -> `PMPI_Send`
    pub fn profiling_name(&self, name: &str) -> String {
        format!("P{name}")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mapping_table: "SMALL_C_KIND_MAP".into(),
            api_prefix: "MPI".into(),
            impl_prefix: "MPIR".into(),
            spec_dir: PathBuf::from("src/binding"),
            binding_dir: PathBuf::from("src/binding/c"),
            header: PathBuf::from("src/include/mpir_impl.h"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_names() {
        let config = Config::default();

        assert_eq!(config.bare_name("MPI_Comm_size"), "Comm_size");
        assert_eq!(config.impl_name("MPI_Send"), "MPIR_Send_impl");
        assert_eq!(config.profiling_name("MPI_Send"), "PMPI_Send");

        // no prefix to strip
        assert_eq!(config.bare_name("Send"), "Send");
        assert_eq!(config.bare_name("MPIX_Foo"), "MPIX_Foo");
        assert_eq!(config.impl_name("Send"), "MPIR_Send_impl");
    }
}
