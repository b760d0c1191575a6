// Diagnostic Construction
//
// Helpers for building pipeline diagnostics with Angular error codes, plus the
// error type that aborts a pipeline run.

use thiserror::Error;
use ts::{Diagnostic, DiagnosticCategory, HostError, Span};

use super::error_code::ErrorCode;
use super::util::ng_error_code;

pub fn make_diagnostic(
    code: ErrorCode,
    category: DiagnosticCategory,
    file: Option<&str>,
    span: Span,
    message: impl Into<String>,
) -> Diagnostic {
    match file {
        Some(file) => Diagnostic::in_file(category, ng_error_code(code), file, span, message),
        None => Diagnostic::global(category, ng_error_code(code), message),
    }
}

pub fn make_error(code: ErrorCode, message: impl Into<String>) -> Diagnostic {
    make_diagnostic(code, DiagnosticCategory::Error, None, Span::default(), message)
}

/// Unrecoverable failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("flat module bundling failed: {0}")]
    Bundle(String),
}

impl PipelineError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        make_error(ErrorCode::PipelineAborted, self.to_string())
    }
}
