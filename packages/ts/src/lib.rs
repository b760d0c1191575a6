//! TypeScript front end for the tsc-wrapped pipeline.
//!
//! Parses units with oxc into an owned syntax model, builds immutable
//! `Program` snapshots with module resolution, resolves symbols across
//! imports and re-exports, and emits JavaScript through a `CompilerHost`.

use std::fmt;

pub mod emitter;
pub mod host;
pub mod node;
pub mod parser;
pub mod path;
pub mod program;
pub mod type_checker;

pub use emitter::*;
pub use host::*;
pub use node::*;
pub use parser::*;
pub use program::*;
pub use type_checker::*;

#[cfg(test)]
mod host_test;
#[cfg(test)]
mod parser_test;
#[cfg(test)]
mod type_checker_test;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        f.write_str(text)
    }
}

// --- Diagnostic Structures ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticMessageChain {
    String(String),
    Chain {
        message_text: String,
        category: DiagnosticCategory,
        code: i32,
        next: Option<Vec<DiagnosticMessageChain>>,
    },
}

impl DiagnosticMessageChain {
    pub fn new(message: impl Into<String>) -> Self {
        Self::String(message.into())
    }
}

impl From<String> for DiagnosticMessageChain {
    fn from(s: String) -> Self {
        DiagnosticMessageChain::String(s)
    }
}

impl From<&str> for DiagnosticMessageChain {
    fn from(s: &str) -> Self {
        DiagnosticMessageChain::String(s.to_string())
    }
}

impl fmt::Display for DiagnosticMessageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticMessageChain::String(s) => write!(f, "{}", s),
            DiagnosticMessageChain::Chain { message_text, next, .. } => {
                write!(f, "{}", message_text)?;
                for chained in next.iter().flatten() {
                    write!(f, "\n  {}", chained)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub code: i32,
    pub file: Option<String>,
    pub start: usize,
    pub length: usize,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: i32,
    pub file: Option<String>,
    pub start: usize,
    pub length: usize,
    pub message_text: DiagnosticMessageChain,
    pub related_information: Option<Vec<DiagnosticRelatedInformation>>,
}

impl Diagnostic {
    /// A diagnostic with no file location.
    pub fn global(category: DiagnosticCategory, code: i32, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            file: None,
            start: 0,
            length: 0,
            message_text: DiagnosticMessageChain::String(message.into()),
            related_information: None,
        }
    }

    pub fn in_file(
        category: DiagnosticCategory,
        code: i32,
        file: &str,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            file: Some(file.to_string()),
            start: span.start,
            length: span.len(),
            message_text: DiagnosticMessageChain::String(message.into()),
            related_information: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

pub fn make_diagnostic_chain(
    message_text: String,
    next: Option<Vec<DiagnosticMessageChain>>,
) -> DiagnosticMessageChain {
    DiagnosticMessageChain::Chain {
        category: DiagnosticCategory::Message,
        code: 0,
        message_text,
        next,
    }
}
