//! Indentation-aware line builder used by all text emitters.

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct CodeBuilder {
    lines: Vec<String>,
    depth: usize,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{text}", INDENT.repeat(self.depth)));
        }
        self
    }

    /// Appends `text` at column 0, for preprocessor directives and labels.
    pub fn raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// `header {` ... `}` with the body one level deeper.
    pub fn block(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(header);
        self.indent();
        body(self);
        self.dedent();
        self.line("}")
    }

    pub fn finish(self) -> Vec<String> {
        self.lines
    }
}

/// Joins lines into file contents with a trailing newline.
pub fn to_text(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
