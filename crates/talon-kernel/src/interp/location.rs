//! Script locations for diagnostics.
//!
//! A [`ScriptLocation`] records where the text being evaluated came from.
//! The interpreter keeps a stack of them so nested evaluations (a trace
//! body firing inside a loop body inside a sourced file) can report the
//! innermost position.

use std::fmt;

/// An immutable record of where a piece of script text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLocation {
    /// Source file name, or `None` for dynamically built scripts.
    pub file: Option<String>,
    /// First line of the text within the file (1-based).
    pub start_line: u32,
    /// Last line of the text within the file (1-based).
    pub end_line: u32,
    /// True when the text arrived via source-inclusion.
    pub via_source: bool,
}

impl ScriptLocation {
    /// A location for text with no known origin.
    pub fn unknown() -> Self {
        ScriptLocation {
            file: None,
            start_line: 0,
            end_line: 0,
            via_source: false,
        }
    }

    /// A location within a named file.
    pub fn in_file(file: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        ScriptLocation {
            file: Some(file.into()),
            start_line,
            end_line,
            via_source: false,
        }
    }

    /// The same location, marked as arrived-via-source.
    pub fn via_source(mut self) -> Self {
        self.via_source = true;
        self
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("<unknown>");
        if self.start_line == self.end_line {
            write!(f, "{}:{}", file, self.start_line)
        } else {
            write!(f, "{}:{}-{}", file, self.start_line, self.end_line)
        }
    }
}
