//! Output Router: which descriptors get generated, in which order, where.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::model::{Descriptor, Store};

/// Why a loaded descriptor is left out of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// No override table tagged it with an output directory.
    NoDirectory,
    NotImplemented,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::NoDirectory => f.write_str("no output directory"),
            Exclusion::NotImplemented => f.write_str("not_implemented"),
        }
    }
}

#[derive(Debug)]
pub struct Routing<'a> {
    /// Generation batch, sorted by directory, load order within one.
    pub batch: Vec<&'a Descriptor>,
    /// Everything else, in load order.
    pub excluded: Vec<(&'a Descriptor, Exclusion)>,
}

pub fn route(store: &Store) -> Routing<'_> {
    let mut batch = Vec::new();
    let mut excluded = Vec::new();

    for descriptor in store.descriptors() {
        if descriptor.directory.is_none() {
            excluded.push((descriptor, Exclusion::NoDirectory));
        } else if descriptor.not_implemented {
            excluded.push((descriptor, Exclusion::NotImplemented));
        } else {
            batch.push(descriptor);
        }
    }

    // stable: keeps load order inside a directory
    batch.sort_by(|a, b| a.directory.cmp(&b.directory));

    Routing { batch, excluded }
}

pub fn select_and_order(store: &Store) -> Vec<&Descriptor> {
    route(store).batch
}

/// `<binding_dir>/<directory>/<bare name, lowercase>.c`
pub fn destination(config: &Config, name: &str, directory: &str) -> PathBuf {
    let file = format!("{}.c", config.bare_name(name).to_lowercase());
    Path::new(&config.binding_dir).join(directory).join(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, dir: Option<&str>, not_implemented: bool) -> Descriptor {
        let mut d = Descriptor::new(name, "pt2pt");
        d.directory = dir.map(str::to_string);
        d.not_implemented = not_implemented;
        d
    }

    #[test]
    fn test_route_selects_and_sorts() {
        let mut store = Store::new();
        store.insert(descriptor("MPI_Send", Some("pt2pt"), false));
        store.insert(descriptor("MPI_Bcast", Some("coll"), false));
        store.insert(descriptor("MPI_Wtime", None, false));
        store.insert(descriptor("MPI_Recv", Some("pt2pt"), false));
        store.insert(descriptor("MPI_Barrier", Some("coll"), true));
        store.insert(descriptor("MPI_Allreduce", Some("coll"), false));

        let routing = route(&store);
        let batch: Vec<_> = routing.batch.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            batch,
            vec!["MPI_Bcast", "MPI_Allreduce", "MPI_Send", "MPI_Recv"]
        );

        let excluded: Vec<_> = routing
            .excluded
            .iter()
            .map(|(d, why)| (d.name.as_str(), *why))
            .collect();
        assert_eq!(
            excluded,
            vec![
                ("MPI_Wtime", Exclusion::NoDirectory),
                ("MPI_Barrier", Exclusion::NotImplemented),
            ]
        );

        assert_eq!(select_and_order(&store), routing.batch);
    }

    #[test]
    fn test_send_and_unimplemented_barrier() {
        let mut store = Store::new();
        store.insert(descriptor("Send", Some("pt2pt"), false));
        let mut barrier = descriptor("Barrier", Some("coll"), true);
        barrier.category = "coll".into();
        store.insert(barrier);

        let routing = route(&store);
        assert_eq!(routing.batch.len(), 1);
        assert_eq!(routing.batch[0].name, "Send");
        assert_eq!(routing.excluded[0].0.name, "Barrier");
        assert_eq!(routing.excluded[0].1, Exclusion::NotImplemented);
        assert_eq!(routing.excluded[0].1.to_string(), "not_implemented");
    }

    #[test]
    fn test_destination() {
        let config = Config::default();
        assert_eq!(
            destination(&config, "MPI_Comm_size", "comm"),
            PathBuf::from("src/binding/c/comm/comm_size.c")
        );
        assert_eq!(
            destination(&config, "Send", "pt2pt"),
            PathBuf::from("src/binding/c/pt2pt/send.c")
        );
    }
}
