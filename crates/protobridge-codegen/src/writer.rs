//! Indented line writer shared by the schema and module emitters.

/// Line-oriented text builder with two-space indentation.
#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    output: String,
    indent: usize,
}

impl CodeWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation. Empty lines carry no indent.
    pub(crate) fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str("  ");
            }
            self.output.push_str(line);
        }
        self.output.push('\n');
    }

    /// Write `open {`, the indented body, then `}`.
    pub(crate) fn block(&mut self, open: impl AsRef<str>, body: impl FnOnce(&mut Self)) {
        self.line(format!("{} {{", open.as_ref()));
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.line("}");
    }

    pub(crate) fn finish(self) -> String {
        self.output
    }
}
