//! Line lexer shared by the text tables and the mapping files.
//!
//! The lexer only classifies lines; what a header or an entry *means* is
//! up to the table loaders.
//
//  Grammar (informal):
//
//      file      ::= (header | attribute | entry | blank | comment)*
//      header    ::= IDENT ':' TEXT?          (starts at column 0)
//      attribute ::= WS '.' IDENT (':' TEXT)?
//      entry     ::= WS IDENT ':' TEXT
//      comment   ::= WS? '#' ...
//
//      IDENT ::= [A-Za-z_][A-Za-z0-9_]*

use std::iter::Enumerate;
use std::str::Lines;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `MPI_Send: pt2pt` / `SMALL_C_KIND_MAP:`
    Header { name: String, tail: Option<String> },
    /// `    .desc: Performs a blocking send` / `    .not_implemented`
    Attribute { key: String, value: Option<String> },
    /// `    buf: BUFFER, in` / `    BUFFER: void *`
    Entry { key: String, value: String },
}

pub struct Lexer<'a> {
    source_name: &'a str,
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source_name: &'a str, text: &'a str) -> Self {
        Self {
            source_name,
            lines: text.lines().enumerate(),
        }
    }

    /// Builds a syntax error pointing at 1-based `line`.
    pub fn error(&self, line: usize, message: impl Into<String>) -> ParseError {
        syntax_error(self.source_name, line, message)
    }

    fn classify(&self, line_no: usize, raw: &str) -> Result<Line, ParseError> {
        let indented = raw.starts_with(|c: char| c.is_whitespace());
        let content = raw.trim();

        if !indented {
            let (name, tail) = content
                .split_once(':')
                .ok_or_else(|| self.error(line_no, format!("expected `NAME:` header, got `{content}`")))?;
            let name = self.ident(line_no, name)?;
            return Ok(Line::Header {
                name,
                tail: non_empty(tail),
            });
        }

        if let Some(attr) = content.strip_prefix('.') {
            let (key, value) = match attr.split_once(':') {
                Some((key, value)) => (key, non_empty(value)),
                None => (attr, None),
            };
            let key = self.ident(line_no, key)?;
            return Ok(Line::Attribute { key, value });
        }

        let (key, value) = content
            .split_once(':')
            .ok_or_else(|| self.error(line_no, format!("expected `key: value`, got `{content}`")))?;
        Ok(Line::Entry {
            key: self.ident(line_no, key)?,
            value: value.trim().to_string(),
        })
    }

    fn ident(&self, line_no: usize, raw: &str) -> Result<String, ParseError> {
        let ident = raw.trim();
        let mut chars = ident.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if !valid {
            return Err(self.error(line_no, format!("invalid identifier `{ident}`")));
        }
        Ok(ident.to_string())
    }
}

impl Iterator for Lexer<'_> {
    /// `(1-based line number, line)`
    type Item = Result<(usize, Line), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, raw) = self.lines.next()?;
            let trimmed = raw.trim();
            // blank lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let line_no = idx + 1;
            return Some(self.classify(line_no, raw).map(|line| (line_no, line)));
        }
    }
}

pub fn syntax_error(source_name: &str, line: usize, message: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        source_name: source_name.to_string(),
        line,
        message: message.into(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Lexer, Line};
    use crate::error::ParseError;

    fn lex(src: &str) -> Result<Vec<(usize, Line)>, ParseError> {
        Lexer::new("test.txt", src).collect()
    }

    #[test]
    fn test_line_classification() {
        let src = "\
# standard functions
MPI_Send: pt2pt
    .desc: Performs a blocking send
    .not_implemented

    buf: BUFFER, in, [initial address: send buffer]
SMALL_C_KIND_MAP:
    BUFFER: void *
";
        let lines = lex(src).unwrap();
        assert_eq!(
            lines,
            vec![
                (
                    2,
                    Line::Header {
                        name: "MPI_Send".into(),
                        tail: Some("pt2pt".into())
                    }
                ),
                (
                    3,
                    Line::Attribute {
                        key: "desc".into(),
                        value: Some("Performs a blocking send".into())
                    }
                ),
                (
                    4,
                    Line::Attribute {
                        key: "not_implemented".into(),
                        value: None
                    }
                ),
                (
                    6,
                    Line::Entry {
                        key: "buf".into(),
                        value: "BUFFER, in, [initial address: send buffer]".into()
                    }
                ),
                (
                    7,
                    Line::Header {
                        name: "SMALL_C_KIND_MAP".into(),
                        tail: None
                    }
                ),
                (
                    8,
                    Line::Entry {
                        key: "BUFFER".into(),
                        value: "void *".into()
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_syntax_errors_carry_line_numbers() {
        let cases = [
            ("MPI_Send pt2pt\n", 1, "expected `NAME:` header"),
            ("MPI_Send:\n    buf BUFFER\n", 2, "expected `key: value`"),
            ("\n\n2bad: x\n", 3, "invalid identifier `2bad`"),
            ("MPI_Send:\n    .: x\n", 2, "invalid identifier ``"),
        ];

        for (src, expected_line, expected_msg) in cases {
            match lex(src) {
                Err(ParseError::Syntax {
                    source_name,
                    line,
                    message,
                }) => {
                    assert_eq!(source_name, "test.txt");
                    assert_eq!(line, expected_line, "{src:?}");
                    assert!(message.starts_with(expected_msg), "got message: {message}");
                }
                other => panic!("expected syntax error for {src:?}, got {other:?}"),
            }
        }
    }
}
