// Diagnostics Tests

#[cfg(test)]
mod tests {
    use crate::diagnostics::*;
    use ts::{InMemoryCompilerHost, Span};

    mod error_code_tests {
        use super::*;

        #[test]
        fn should_map_error_codes() {
            assert_eq!(ng_error_code(ErrorCode::ConfigInvalid), -991001);
            assert_eq!(ng_error_code(ErrorCode::CodegenFailed), -993001);
        }

        #[test]
        fn should_display_with_ng_prefix() {
            assert_eq!(ErrorCode::MetadataCollection.to_string(), "NG2001");
        }

        #[test]
        fn should_replace_ts_with_ng() {
            assert_eq!(replace_ts_with_ng_in_errors("error TS-992001: oops"), "error NG2001: oops");
            assert_eq!(replace_ts_with_ng_in_errors("error TS2307: oops"), "error TS2307: oops");
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn should_format_with_positions() {
            let host = InMemoryCompilerHost::with_files("/p", [("a.ts", "const a = 1;\nconst b = c;")]);
            let diagnostic = make_diagnostic(
                ErrorCode::MetadataCollection,
                DiagnosticCategory::Error,
                Some("/p/a.ts"),
                Span::new(23, 24),
                "Reference to c",
            );
            assert_eq!(
                format_diagnostics(&[diagnostic], &host),
                "/p/a.ts(2,11): error NG2001: Reference to c\n"
            );
        }

        #[test]
        fn should_format_global_diagnostics() {
            let host = InMemoryCompilerHost::new("/p");
            let diagnostic = make_error(ErrorCode::FlatModuleIndexNotFound, "no index");
            assert_eq!(format_diagnostics(&[diagnostic], &host), "error NG1002: no index\n");
        }

        #[test]
        fn should_indent_chained_messages() {
            let host = InMemoryCompilerHost::new("/p");
            let mut diagnostic = make_error(ErrorCode::CodegenFailed, "");
            diagnostic.message_text =
                ts::make_diagnostic_chain("outer".to_string(), Some(vec![DiagnosticMessageChain::new("inner")]));
            assert_eq!(format_diagnostics(&[diagnostic], &host), "error NG3001: outer\n  inner\n");
        }

        #[test]
        fn should_keep_typescript_codes() {
            let host = InMemoryCompilerHost::new("/p");
            let diagnostic = Diagnostic::global(DiagnosticCategory::Warning, 6053, "File not found.");
            assert_eq!(format_diagnostics(&[diagnostic], &host), "warning TS6053: File not found.\n");
        }
    }

    mod pipeline_error_tests {
        use super::*;

        #[test]
        fn should_convert_to_diagnostic() {
            let error = PipelineError::Host(ts::HostError::InvariantViolation("two units".to_string()));
            let diagnostic = error.to_diagnostic();
            assert!(diagnostic.is_error());
            assert_eq!(diagnostic.code, ng_error_code(ErrorCode::PipelineAborted));
            assert_eq!(diagnostic.message_text.to_string(), "two units");
        }
    }
}
