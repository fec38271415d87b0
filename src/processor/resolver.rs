//! Mapping Resolver: category -> strategy, parameter kind -> C type.

use std::fmt;
use std::str::FromStr;

use crate::error::{EmissionError, ResolutionError};
use crate::model::{Descriptor, Direction, MappingTable, Parameter};

/// How a function's wrapper is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Global critical section, argument checks, error code on failure.
    Wrapper,
    /// `Wrapper` without the global critical section.
    Local,
    /// Straight call into the implementation.
    Query,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Wrapper, Strategy::Local, Strategy::Query];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Wrapper => "wrapper",
            Strategy::Local => "local",
            Strategy::Query => "query",
        }
    }
}

impl FromStr for Strategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL.into_iter().find(|k| k.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn resolve(descriptor: &Descriptor, table: &MappingTable) -> Result<Strategy, ResolutionError> {
    let value = table
        .get(&descriptor.category)
        .ok_or_else(|| ResolutionError::UnmappedCategory {
            function: descriptor.name.clone(),
            category: descriptor.category.clone(),
            table: table.name.clone(),
        })?;

    value.parse().map_err(|()| ResolutionError::UnknownStrategy {
        function: descriptor.name.clone(),
        category: descriptor.category.clone(),
        strategy: value.to_string(),
    })
}

/// C type of `param` as it appears in a prototype.
///
/// Out and inout parameters are passed by pointer unless the mapped type
/// already is one.
pub fn resolve_parameter(
    descriptor: &Descriptor,
    param: &Parameter,
    table: &MappingTable,
) -> Result<String, EmissionError> {
    let base = table
        .get(&param.kind)
        .ok_or_else(|| EmissionError::UnmappedParameterKind {
            function: descriptor.name.clone(),
            parameter: param.name.clone(),
            kind: param.kind.clone(),
            table: table.name.clone(),
        })?;

    let mut ty = if param.constant {
        format!("const {base}")
    } else {
        base.to_string()
    };
    if param.direction != Direction::In && !is_pointer(&ty) {
        ty.push_str(" *");
    }
    Ok(ty)
}

pub fn is_pointer(ty: &str) -> bool {
    ty.trim_end().ends_with('*')
}
