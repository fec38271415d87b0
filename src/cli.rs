use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Project root; every other path is relative to it
    #[arg(default_value = ".")]
    pub root: PathBuf,
    /// Mapping table used to resolve categories and parameter kinds
    #[arg(long, env = "CAPIGEN_MAPPING_TABLE", default_value = "SMALL_C_KIND_MAP")]
    pub mapping_table: String,
    /// Prefix of the public API symbols
    #[arg(long, default_value = "MPI")]
    pub api_prefix: String,
    /// Prefix of the internal implementation symbols
    #[arg(long, default_value = "MPIR")]
    pub impl_prefix: String,
    /// Directory of the catalog, standard table and mapping files
    #[arg(long, default_value = "src/binding")]
    pub spec_dir: PathBuf,
    /// Directory of the override tables and generated sources
    #[arg(long, default_value = "src/binding/c")]
    pub binding_dir: PathBuf,
    /// Declarations header to generate
    #[arg(long, default_value = "src/include/mpir_impl.h")]
    pub header: PathBuf,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            mapping_table: self.mapping_table.clone(),
            api_prefix: self.api_prefix.clone(),
            impl_prefix: self.impl_prefix.clone(),
            spec_dir: self.spec_dir.clone(),
            binding_dir: self.binding_dir.clone(),
            header: self.header.clone(),
        }
    }
}
