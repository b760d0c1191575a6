// Perform Compile Tests
//
// Tests for option parsing and the driver's stage gating. End-to-end runs
// live in the package's integration tests.

#[cfg(test)]
mod tests {
    use crate::logging::NullLogger;
    use crate::perform_compile::*;
    use ts::{CompilerOptions, InMemoryCompilerHost};

    mod option_tests {
        use super::*;

        #[test]
        fn should_strip_comments_outside_strings() {
            let text = "{\n  // line\n  \"a\": \"http://x\", /* block */ \"b\": \"/* kept */\"\n}";
            let stripped = strip_json_comments(text);
            let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();
            assert_eq!(value["a"], "http://x");
            assert_eq!(value["b"], "/* kept */");
        }

        #[test]
        fn should_keep_escaped_quotes_in_strings() {
            let stripped = strip_json_comments(r#"{"a": "say \"//hi\""}"#);
            assert_eq!(stripped, r#"{"a": "say \"//hi\""}"#);
        }

        #[test]
        fn should_default_angular_options() {
            let options: AngularCompilerOptions = serde_json::from_str("{}").unwrap();
            assert_eq!(options, AngularCompilerOptions::default());
            assert_eq!(options.annotations_as, AnnotationsAs::StaticFields);
            assert_eq!(options.closure_module_prefix, "@angular");
            assert_eq!(options.closure_dist_root, "packages-dist");
            assert_eq!(options.core_module, "@angular/core");
        }

        #[test]
        fn should_read_camel_case_angular_options() {
            let options: AngularCompilerOptions = serde_json::from_str(
                r#"{"genDir": "gen", "annotationsAs": "decorators", "skipTemplateCodegen": true, "flatModuleOutFile": "lib.js"}"#,
            )
            .unwrap();
            assert_eq!(options.gen_dir.as_deref(), Some("gen"));
            assert_eq!(options.annotations_as, AnnotationsAs::Decorators);
            assert!(options.skip_template_codegen);
            assert_eq!(options.flat_module_out_file.as_deref(), Some("lib.js"));
        }

        #[test]
        fn should_derive_emit_flags() {
            let angular = AngularCompilerOptions {
                skip_metadata_emit: true,
                ..Default::default()
            };
            let options = CompilerOptions {
                declaration: Some(true),
                ..Default::default()
            };
            let flags = EmitFlags::from_options(&options, &angular);
            assert!(flags.contains(EmitFlags::JS | EmitFlags::DTS | EmitFlags::CODEGEN));
            assert!(!flags.contains(EmitFlags::METADATA));
            assert_eq!(
                EmitFlags::from_options(&CompilerOptions::default(), &AngularCompilerOptions::default()),
                EmitFlags::DEFAULT
            );
        }

        #[test]
        fn should_resolve_gen_dir_against_base_path() {
            let mut config = ParsedConfiguration::new("/app", Vec::new(), CompilerOptions::default(), Default::default());
            assert_eq!(config.gen_dir(), "/app");
            config.angular_options.gen_dir = Some("out/gen".to_string());
            assert_eq!(config.gen_dir(), "/app/out/gen");
        }
    }

    mod driver_tests {
        use super::*;
        use crate::diagnostics::{ng_error_code, ErrorCode};

        #[test]
        fn should_stop_on_configuration_errors() {
            let host = InMemoryCompilerHost::with_files("/app", [("a.ts", "export const a = 1;")]);
            let mut config =
                ParsedConfiguration::new("/app", vec!["a.ts".to_string()], CompilerOptions::default(), Default::default());
            config
                .errors
                .push(crate::diagnostics::make_error(ErrorCode::ConfigInvalid, "bad project"));
            let result = perform_compilation(&config, &host, None, &NullLogger::new());
            assert_eq!(result.exit_code(), 1);
            assert!(host.written_files().is_empty());
        }

        #[test]
        fn should_stop_before_codegen_on_syntax_errors() {
            let host = InMemoryCompilerHost::with_files("/app", [("a.ts", "class {")]);
            let config =
                ParsedConfiguration::new("/app", vec!["a.ts".to_string()], CompilerOptions::default(), Default::default());
            let result = perform_compilation(&config, &host, None, &NullLogger::new());
            assert_eq!(result.exit_code(), 1);
            assert!(result.generated_files.is_empty());
            assert!(host.written_files().is_empty());
        }

        #[test]
        fn should_require_single_index_for_flat_module() {
            let host = InMemoryCompilerHost::with_files("/lib", [("a.ts", "export const a = 1;")]);
            let angular = AngularCompilerOptions {
                flat_module_out_file: Some("lib.js".to_string()),
                ..Default::default()
            };
            let config = ParsedConfiguration::new("/lib", vec!["a.ts".to_string()], CompilerOptions::default(), angular);
            let result = perform_compilation(&config, &host, None, &NullLogger::new());
            assert_eq!(result.exit_code(), 1);
            assert_eq!(result.diagnostics[0].code, ng_error_code(ErrorCode::FlatModuleIndexNotFound));
        }

        #[test]
        fn should_emit_plain_units() {
            let host = InMemoryCompilerHost::with_files("/app", [("a.ts", "export const a: number = 1;")]);
            let config =
                ParsedConfiguration::new("/app", vec!["a.ts".to_string()], CompilerOptions::default(), Default::default());
            let result = perform_compilation(&config, &host, None, &NullLogger::new());
            assert_eq!(result.exit_code(), 0);
            assert_eq!(result.emitted_files, vec!["/app/a.js".to_string()]);
            assert!(host.written("/app/a.metadata.json").is_none());
        }
    }
}
