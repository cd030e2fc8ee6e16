//! Script Builder - accumulates generated SQL into executable commands
//!
//! Text is written into a buffer; [`ScriptBuilder::end_command`] closes the
//! buffer as one command. Indentation is scoped: [`ScriptBuilder::indent`]
//! returns a guard that restores the previous level when it is dropped, on
//! every exit path.

use std::ops::{Deref, DerefMut};

const INDENT_UNIT: &str = "    ";

/// Builds an ordered list of independently executable SQL commands
#[derive(Debug)]
pub struct ScriptBuilder {
    commands: Vec<String>,
    buffer: String,
    indent: usize,
    at_line_start: bool,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            buffer: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    /// Append text, prefixing every new non-empty line with the current indentation
    pub fn append(&mut self, text: &str) -> &mut Self {
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.buffer.push('\n');
                self.at_line_start = true;
            }
            if segment.is_empty() {
                continue;
            }
            if self.at_line_start {
                for _ in 0..self.indent {
                    self.buffer.push_str(INDENT_UNIT);
                }
                self.at_line_start = false;
            }
            self.buffer.push_str(segment);
        }
        self
    }

    /// Append text followed by a line break
    pub fn append_line(&mut self, text: &str) -> &mut Self {
        self.append(text);
        self.buffer.push('\n');
        self.at_line_start = true;
        self
    }

    /// Increase indentation until the returned guard is dropped
    pub fn indent(&mut self) -> IndentGuard<'_> {
        self.indent += 1;
        IndentGuard { script: self }
    }

    /// Current indentation depth
    pub fn indent_level(&self) -> usize {
        self.indent
    }

    /// Close the current buffer as one command; blank buffers are discarded
    pub fn end_command(&mut self) -> &mut Self {
        let command = self.buffer.trim_end();
        if !command.trim_start().is_empty() {
            self.commands.push(command.to_string());
        }
        self.buffer.clear();
        self.at_line_start = true;
        self
    }

    /// Completed commands, excluding the open buffer
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Whether any text is waiting in the open buffer
    pub fn has_open_command(&self) -> bool {
        !self.buffer.trim().is_empty()
    }

    /// Close any open buffer and return every command in order
    pub fn into_commands(mut self) -> Vec<String> {
        self.end_command();
        self.commands
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for ScriptBuilder {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_commands().into_iter()
    }
}

/// Indentation scope; writes go through the guard while it is alive
#[derive(Debug)]
pub struct IndentGuard<'a> {
    script: &'a mut ScriptBuilder,
}

impl Deref for IndentGuard<'_> {
    type Target = ScriptBuilder;

    fn deref(&self) -> &Self::Target {
        self.script
    }
}

impl DerefMut for IndentGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.script
    }
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.script.indent -= 1;
    }
}
