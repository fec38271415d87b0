//! Text tables: the legacy per-category function tables, the per-directory
//! override tables and the mapping files.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::lexer::{Lexer, Line, syntax_error};
use crate::error::ParseError;
use crate::model::{Descriptor, Direction, Parameter, Signature};

/// `KIND[, flag]*[, [description]]`
static PARAM_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]\w*)((?:\s*,\s*[A-Za-z]+)*)(?:\s*,\s*\[(.*)\])?$")
        .expect("parameter pattern is valid")
});

/// One `NAME: ...` block of a function table, before it becomes a
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Line of the header, for error reporting.
    pub line: usize,
    pub name: String,
    pub category: Option<String>,
    pub desc: Option<String>,
    pub dir: Option<String>,
    /// `None` unless the block sets `.not_implemented` explicitly.
    pub not_implemented: Option<bool>,
    pub parameters: Vec<Parameter>,
}

impl Block {
    fn new(line: usize, name: String, category: Option<String>) -> Self {
        Self {
            line,
            name,
            category,
            desc: None,
            dir: None,
            not_implemented: None,
            parameters: Vec::new(),
        }
    }

    /// A block that declares neither a category nor parameters only
    /// annotates a function declared elsewhere.
    pub fn is_patch(&self) -> bool {
        self.category.is_none() && self.parameters.is_empty()
    }

    pub fn into_descriptor(self, source_name: &str) -> Result<Descriptor, ParseError> {
        let category = self.category.ok_or_else(|| {
            syntax_error(
                source_name,
                self.line,
                format!("function `{}` has no category", self.name),
            )
        })?;
        Ok(Descriptor {
            name: self.name,
            category,
            directory: self.dir,
            not_implemented: self.not_implemented.unwrap_or(false),
            signature: Signature {
                desc: self.desc,
                parameters: self.parameters,
            },
        })
    }
}

/// Splits a function table into blocks.
pub fn parse_table(source_name: &str, text: &str) -> Result<Vec<Block>, ParseError> {
    let lexer = Lexer::new(source_name, text);
    let mut blocks = Vec::<Block>::new();

    for item in lexer {
        let (line_no, line) = item?;
        match line {
            Line::Header { name, tail } => blocks.push(Block::new(line_no, name, tail)),
            Line::Attribute { key, value } => {
                let block = blocks.last_mut().ok_or_else(|| {
                    syntax_error(source_name, line_no, format!("attribute `.{key}` outside of a function"))
                })?;
                apply_attribute(source_name, line_no, block, &key, value)?;
            }
            Line::Entry { key, value } => {
                let block = blocks.last_mut().ok_or_else(|| {
                    syntax_error(source_name, line_no, format!("parameter `{key}` outside of a function"))
                })?;
                let param = parse_parameter(key, &value)
                    .map_err(|msg| syntax_error(source_name, line_no, msg))?;
                block.parameters.push(param);
            }
        }
    }

    Ok(blocks)
}

fn apply_attribute(
    source_name: &str,
    line_no: usize,
    block: &mut Block,
    key: &str,
    value: Option<String>,
) -> Result<(), ParseError> {
    let required = |value: Option<String>| {
        value.ok_or_else(|| syntax_error(source_name, line_no, format!("attribute `.{key}` needs a value")))
    };

    match key {
        "desc" => block.desc = Some(required(value)?),
        "category" => block.category = Some(required(value)?),
        "dir" => block.dir = Some(required(value)?),
        "not_implemented" => {
            block.not_implemented = match value.as_deref() {
                None | Some("true") | Some("yes") => Some(true),
                Some("false") | Some("no") => Some(false),
                Some(other) => {
                    return Err(syntax_error(
                        source_name,
                        line_no,
                        format!("`.not_implemented` expects true/false, got `{other}`"),
                    ));
                }
            }
        }
        other => warn!("{source_name}:{line_no}: ignoring attribute `.{other}` of {}", block.name),
    }
    Ok(())
}

/// `buf: BUFFER, in, const, [initial address of send buffer]`
fn parse_parameter(name: String, spec: &str) -> Result<Parameter, String> {
    let caps = PARAM_SPEC
        .captures(spec)
        .ok_or_else(|| format!("malformed parameter `{name}: {spec}`"))?;

    let mut param = Parameter::new(name, &caps[1]);
    param.desc = caps.get(3).map(|m| m.as_str().trim().to_string());

    let flags = caps.get(2).map_or("", |m| m.as_str());
    for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        match flag {
            "in" => param.direction = Direction::In,
            "out" => param.direction = Direction::Out,
            "inout" => param.direction = Direction::InOut,
            "const" => param.constant = true,
            "optional" => param.optional = true,
            other => return Err(format!("unknown flag `{other}` on parameter `{}`", param.name)),
        }
    }

    Ok(param)
}

/// One `(table, key, value)` rule of a mapping file, in file order.
pub type Rule = (String, String, String);

pub fn parse_mapping(source_name: &str, text: &str) -> Result<Vec<Rule>, ParseError> {
    let lexer = Lexer::new(source_name, text);
    let mut table: Option<String> = None;
    let mut rules = Vec::<Rule>::new();

    for item in lexer {
        let (line_no, line) = item?;
        match line {
            Line::Header { name, tail: None } => table = Some(name),
            Line::Header { name, tail: Some(_) } => {
                return Err(syntax_error(
                    source_name,
                    line_no,
                    format!("mapping table header `{name}:` takes no value"),
                ));
            }
            Line::Attribute { key, .. } => {
                return Err(syntax_error(
                    source_name,
                    line_no,
                    format!("attribute `.{key}` is not allowed in a mapping file"),
                ));
            }
            Line::Entry { key, value } => {
                let table = table.as_ref().ok_or_else(|| {
                    syntax_error(source_name, line_no, format!("rule `{key}` outside of a mapping table"))
                })?;
                if value.is_empty() {
                    return Err(syntax_error(source_name, line_no, format!("rule `{key}` has no value")));
                }
                rules.push((table.clone(), key, value));
            }
        }
    }

    Ok(rules)
}
