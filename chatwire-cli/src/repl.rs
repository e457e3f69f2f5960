//! Line parsing for the interactive loop

use std::io::{self, Write};

pub const PROMPT: &str = ">>> ";

/// Prefix for every line of server output
pub const OUTPUT_PREFIX: &str = "... ";

pub const HELP: &str = "\
Commands:
  \\q  quit
  \\m  list models
  \\l  list language models
  \\h  show this help
Any other line is sent to the model.";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    ListModels,
    ListLanguageModels,
    Help,
    /// A backslash command we do not know
    Unknown(String),
    /// Text to send as a user entry
    Prompt(String),
}

impl Command {
    /// Parse a line; blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let command = match line {
            "\\q" => Self::Quit,
            "\\m" => Self::ListModels,
            "\\l" => Self::ListLanguageModels,
            "\\h" => Self::Help,
            other if other.starts_with('\\') => Self::Unknown(other.to_string()),
            other => Self::Prompt(other.to_string()),
        };
        Some(command)
    }
}

/// Write a streamed piece and flush so it shows up at once
pub fn echo(out: &mut impl Write, piece: &str) -> io::Result<()> {
    out.write_all(piece.as_bytes())?;
    out.flush()
}
