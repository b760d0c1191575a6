// Host Chain Tests
//
// Tests for annotation recognition, the downlevel and closure rewrites and
// the metadata sidecar writer.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::host::*;
    use crate::module_namer::ModuleNamer;
    use ts::{CompilerHost, CompilerOptions, DiagnosticCategory, HostError, InMemoryCompilerHost, Program, TypeChecker};

    fn program(host: &InMemoryCompilerHost, roots: &[&str]) -> Program {
        let roots: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        Program::new(&roots, CompilerOptions::default(), host, None).unwrap()
    }

    fn load(host: &dyn CompilerHost, file_name: &str) -> Arc<ts::SourceFile> {
        host.get_source_file(file_name).unwrap().expect("source file")
    }

    mod registry_tests {
        use super::*;

        const CORE: &str = "export declare function Component(o: any): any;\nexport declare function Injectable(): any;";

        #[test]
        fn should_recognize_aliased_and_namespace_usages() {
            let host = InMemoryCompilerHost::with_files(
                "/app",
                [
                    (
                        "a.ts",
                        "import {Component as Cmp} from '@angular/core';\nimport * as core from '@angular/core';\n@Cmp({})\nexport class A {}\n@core.Injectable()\nexport class B {}",
                    ),
                    ("node_modules/@angular/core/index.d.ts", CORE),
                ],
            );
            let program = program(&host, &["a.ts"]);
            let checker = TypeChecker::new(&program);
            let registry = AnnotationRegistry::new(&checker, "@angular/core");
            let sf = program.get_source_file("a.ts").unwrap();
            let kinds: Vec<Option<AnnotationKind>> = sf
                .statements
                .iter()
                .filter_map(|s| match s {
                    ts::Statement::Class(class) => Some(registry.decorator_kind(&checker, &sf.file_name, &class.decorators[0])),
                    _ => None,
                })
                .collect();
            assert_eq!(kinds, vec![Some(AnnotationKind::Component), Some(AnnotationKind::Injectable)]);
        }

        #[test]
        fn should_not_match_by_name() {
            let host = InMemoryCompilerHost::with_files(
                "/app",
                [("a.ts", "function Component(o: any) { return (c: any) => c; }\n@Component({})\nexport class A {}")],
            );
            let program = program(&host, &["a.ts"]);
            let checker = TypeChecker::new(&program);
            let registry = AnnotationRegistry::new(&checker, "@angular/core");
            let sf = program.get_source_file("a.ts").unwrap();
            let ts::Statement::Class(class) = &sf.statements[1] else {
                panic!("expected class");
            };
            assert_eq!(registry.decorator_kind(&checker, &sf.file_name, &class.decorators[0]), None);
        }

        #[test]
        fn should_classify_parameter_annotations() {
            assert!(AnnotationKind::Inject.is_parameter_annotation());
            assert!(!AnnotationKind::Component.is_parameter_annotation());
            assert_eq!(AnnotationKind::Self_.export_name(), "Self");
        }
    }

    mod downlevel_tests {
        use super::*;

        const APP: &str = r#"import {Component, Input, Inject} from '@angular/core';
import {Service} from './service';
import type {Config} from './config';
import {Custom} from './custom';
const a = 1;
const s1 = '${a}';
@Custom()
@Component({selector: 'app', template: '${a}'})
export class AppComponent {
  @Input() name: string;
  constructor(@Inject('token') cfg: Config, service: Service) {}
}
"#;

        fn project() -> InMemoryCompilerHost {
            InMemoryCompilerHost::with_files(
                "/app",
                [
                    ("app.ts", APP),
                    ("service.ts", "export class Service {}"),
                    ("config.ts", "export interface Config {}"),
                    ("custom.ts", "export function Custom(): any { return null; }"),
                ],
            )
        }

        #[test]
        fn should_move_annotations_into_static_fields() {
            let host = project();
            let program = program(&host, &["app.ts"]);
            let downlevel = DecoratorDownlevelHost::new(&host, &program, "@angular/core");
            let sf = load(&downlevel, "/app/app.ts");

            assert!(!sf.text.contains("@Component"));
            assert!(!sf.text.contains("@Input"));
            assert!(!sf.text.contains("@Inject("));
            assert!(sf.text.contains(
                "  static decorators: DecoratorInvocation[] = [\n    { type: Component, args: [{selector: 'app', template: '${a}'}] },\n  ];\n"
            ));
            assert!(sf.text.contains("    { type: undefined, decorators: [{ type: Inject, args: ['token'] }] },\n"));
            assert!(sf.text.contains("    { type: Service },\n"));
            assert!(sf.text.contains("    \"name\": [{ type: Input }],\n"));
            assert!(sf.text.ends_with(DECORATOR_INVOCATION_PREAMBLE));
            assert!(sf.parse_diagnostics.is_empty());
        }

        #[test]
        fn should_leave_unrecognized_decorators_and_strings_alone() {
            let host = project();
            let program = program(&host, &["app.ts"]);
            let downlevel = DecoratorDownlevelHost::new(&host, &program, "@angular/core");
            let sf = load(&downlevel, "/app/app.ts");
            assert!(sf.text.contains("@Custom()"));
            assert!(sf.text.contains("const s1 = '${a}';"));
        }

        #[test]
        fn should_remember_the_original_unit() {
            let host = project();
            let program = program(&host, &["app.ts"]);
            let downlevel = DecoratorDownlevelHost::new(&host, &program, "@angular/core");
            let sf = load(&downlevel, "/app/app.ts");
            let held = program.get_source_file("/app/app.ts").unwrap();
            assert!(Arc::ptr_eq(sf.original().unwrap(), held));
            assert_eq!(sf.original_source().text, APP);
        }

        #[test]
        fn should_pass_through_units_without_annotations() {
            let host = project();
            let program = program(&host, &["app.ts"]);
            let downlevel = DecoratorDownlevelHost::new(&host, &program, "@angular/core");
            let sf = load(&downlevel, "/app/service.ts");
            assert!(Arc::ptr_eq(&sf, program.get_source_file("/app/service.ts").unwrap()));
        }

        #[test]
        fn should_delegate_declaration_files() {
            let host = InMemoryCompilerHost::with_files("/app", [("a.ts", ""), ("lib.d.ts", "declare const x: number;")]);
            let program = program(&host, &["a.ts"]);
            let downlevel = DecoratorDownlevelHost::new(&host, &program, "@angular/core");
            let sf = load(&downlevel, "lib.d.ts");
            assert!(sf.original().is_none());
        }

        #[test]
        fn should_fail_the_pass_for_anonymous_classes() {
            let host = InMemoryCompilerHost::with_files(
                "/app",
                [("a.ts", "import {Injectable} from '@angular/core';\n@Injectable()\nexport default class {}")],
            );
            let program = program(&host, &["a.ts"]);
            let downlevel = DecoratorDownlevelHost::new(&host, &program, "@angular/core");
            let result = downlevel.get_source_file("/app/a.ts");
            assert!(matches!(result, Err(HostError::Pass { .. })));
        }

        #[test]
        fn should_warn_about_method_parameter_decorators() {
            let host = InMemoryCompilerHost::with_files(
                "/app",
                [(
                    "a.ts",
                    "import {Injectable, Inject} from '@angular/core';\n@Injectable()\nexport class A {\n  m(@Inject('x') p: any) {}\n}",
                )],
            );
            let program = program(&host, &["a.ts"]);
            let downlevel = DecoratorDownlevelHost::new(&host, &program, "@angular/core");
            load(&downlevel, "/app/a.ts");
            let diagnostics = downlevel.take_diagnostics();
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].category, DiagnosticCategory::Warning);
            assert!(downlevel.take_diagnostics().is_empty());
        }
    }

    mod closure_tests {
        use super::*;

        fn project() -> InMemoryCompilerHost {
            InMemoryCompilerHost::with_files(
                "/app",
                [
                    (
                        "src/a.ts",
                        "import {B} from './b';\nimport {I} from './i';\nimport * as core from '@angular/core';\nimport './polyfills';\nexport const x = B;\nexport interface Local {}\nexport default class D {}\nexport {B as C};",
                    ),
                    ("src/b.ts", "export class B {}"),
                    ("src/i.ts", "export interface I {}"),
                    ("src/polyfills.ts", ""),
                    ("src/c.ts", "export * from './b';\nexport {y} from './y';"),
                    ("src/y.ts", "export const y = 1;"),
                ],
            )
        }

        #[test]
        fn should_convert_imports_and_exports() {
            let host = project();
            let program = program(&host, &["src/a.ts"]);
            let closure = ClosureCompilerHost::new(&host, &program, ModuleNamer::default(), "/app");
            let text = load(&closure, "/app/src/a.ts").text.clone();

            assert!(text.starts_with("goog.module('src$a');\n"));
            assert!(text.contains("const {B} = goog.require('src$b');"));
            assert!(!text.contains("src$i"));
            assert!(text.contains("const core = goog.require('_angular$core');"));
            assert!(text.contains("goog.require('src$polyfills');"));
            assert!(text.contains("const x = B;"));
            assert!(text.contains("exports.x = x;"));
            assert!(!text.contains("exports.Local"));
            assert!(text.contains("class D {}"));
            assert!(text.contains("exports.default = D;"));
            assert!(text.contains("exports.C = B;"));
            assert!(!text.contains("export "));
        }

        #[test]
        fn should_convert_re_exports() {
            let host = project();
            let program = program(&host, &["src/c.ts"]);
            let closure = ClosureCompilerHost::new(&host, &program, ModuleNamer::default(), "/app");
            let text = load(&closure, "/app/src/c.ts").text.clone();
            assert!(text.contains("const __reexport_0 = goog.require('src$b');\nexports.B = __reexport_0.B;"));
            assert!(text.contains("const __reexport_1 = goog.require('src$y');\nexports.y = __reexport_1.y;"));
        }

        #[test]
        fn should_name_modules_relative_to_base_path() {
            let host = project();
            let program = program(&host, &["src/b.ts"]);
            let closure = ClosureCompilerHost::new(&host, &program, ModuleNamer::default(), "/app/src");
            assert_eq!(closure.module_name("/app/src/b.ts"), "b");
        }
    }

    mod metadata_writer_tests {
        use super::*;

        const ANNOTATED: &str = "import {Injectable} from '@angular/core';\n@Injectable()\nexport class S {}";

        #[test]
        fn should_write_sidecar_after_primary_output() {
            let inner = InMemoryCompilerHost::with_files("/app", [("s.ts", ANNOTATED)]);
            let sf = load(&inner, "s.ts");
            let writer = MetadataWriterHost::new(&inner, false, false);
            writer.write_file("/app/s.js", "js", &[sf]).unwrap();

            let writes: Vec<String> = inner.written_files().into_iter().map(|w| w.file_name).collect();
            assert_eq!(writes, vec!["/app/s.js", "/app/s.metadata.json"]);
            let sidecar: serde_json::Value = serde_json::from_str(&inner.written("s.metadata.json").unwrap()).unwrap();
            assert_eq!(sidecar[0]["version"], serde_json::json!(3));
            assert_eq!(sidecar[1]["version"], serde_json::json!(1));
            assert_eq!(sidecar[0]["metadata"]["S"]["__symbolic"], serde_json::json!("class"));
        }

        #[test]
        fn should_short_circuit_declaration_files() {
            let inner = InMemoryCompilerHost::with_files("/app", [("s.ts", ANNOTATED)]);
            let sf = load(&inner, "s.ts");
            let writer = MetadataWriterHost::new(&inner, false, false);
            writer.write_file("/app/s.d.ts", "export declare class S {}", &[sf]).unwrap();
            assert_eq!(inner.written_files().len(), 1);
        }

        #[test]
        fn should_skip_generated_outputs_and_plain_units() {
            let inner = InMemoryCompilerHost::with_files("/app", [("s.ts", ANNOTATED), ("p.ts", "export const p = 1;")]);
            let writer = MetadataWriterHost::new(&inner, false, false);
            writer.write_file("/app/s.ngfactory.js", "js", &[load(&inner, "s.ts")]).unwrap();
            writer.write_file("/app/p.js", "js", &[load(&inner, "p.ts")]).unwrap();
            assert_eq!(inner.written_files().len(), 2);
        }

        #[test]
        fn should_require_exactly_one_source_unit() {
            let inner = InMemoryCompilerHost::with_files("/app", [("s.ts", ANNOTATED), ("t.ts", ANNOTATED)]);
            let writer = MetadataWriterHost::new(&inner, false, false);
            assert!(matches!(
                writer.write_file("/app/out.js", "js", &[]),
                Err(HostError::InvariantViolation(_))
            ));
            let both = [load(&inner, "s.ts"), load(&inner, "t.ts")];
            assert!(matches!(
                writer.write_file("/app/out.js", "js", &both),
                Err(HostError::InvariantViolation(_))
            ));
            assert!(inner.written_files().is_empty());
        }

        #[test]
        fn should_honor_skip_flag() {
            let inner = InMemoryCompilerHost::with_files("/app", [("s.ts", ANNOTATED)]);
            let writer = MetadataWriterHost::new(&inner, false, true);
            writer.write_file("/app/s.js", "js", &[load(&inner, "s.ts")]).unwrap();
            assert_eq!(inner.written_files().len(), 1);
        }

        #[test]
        fn should_accumulate_strict_diagnostics() {
            let inner = InMemoryCompilerHost::with_files(
                "/app",
                [("s.ts", "import {Injectable} from '@angular/core';\nclass L {}\n@Injectable({useClass: L})\nexport class S {}")],
            );
            let writer = MetadataWriterHost::new(&inner, true, false);
            writer.write_file("/app/s.js", "js", &[load(&inner, "s.ts")]).unwrap();
            assert_eq!(writer.take_diagnostics().len(), 1);
        }
    }
}
