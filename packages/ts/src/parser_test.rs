// Parser Tests
//
// Lowering of oxc syntax into the owned model.

#[cfg(test)]
mod tests {
    use crate::*;

    fn parse(text: &str) -> SourceFile {
        create_source_file("/app/test.ts", text)
    }

    mod import_tests {
        use super::*;

        #[test]
        fn should_lower_named_default_and_namespace_imports() {
            let sf = parse(
                "import Def, {Component as Cmp, Input} from '@angular/core';\nimport * as ns from './ns';\nimport type {T} from './t';",
            );
            let imports: Vec<&ImportDeclaration> = sf.imports().collect();
            assert_eq!(imports.len(), 3);

            assert_eq!(imports[0].module_specifier, "@angular/core");
            assert_eq!(imports[0].bindings[0].imported, ImportedName::Default);
            assert_eq!(imports[0].bindings[1].local, "Cmp");
            assert_eq!(imports[0].bindings[1].imported, ImportedName::Named("Component".to_string()));
            assert_eq!(imports[0].bindings[2].local, "Input");

            assert_eq!(imports[1].bindings[0].imported, ImportedName::Namespace);
            assert!(imports[2].is_type_only);
        }

        #[test]
        fn should_list_module_specifiers_in_source_order() {
            let sf = parse("import {a} from './a';\nexport * from './b';\nexport {c} from './c';");
            assert_eq!(sf.module_specifiers(), vec!["./a", "./b", "./c"]);
        }
    }

    mod export_tests {
        use super::*;

        #[test]
        fn should_record_export_from_clauses() {
            let sf = parse("export * from './a';\nexport {b as c} from './b';\nexport * as ns from './n';");
            let clauses: Vec<&ExportClause> = sf
                .statements
                .iter()
                .filter_map(|s| match s {
                    Statement::ExportFrom(e) => Some(&e.clause),
                    _ => None,
                })
                .collect();
            assert_eq!(clauses[0], &ExportClause::All);
            assert_eq!(
                clauses[1],
                &ExportClause::Named(vec![ExportSpecifier {
                    local: "b".to_string(),
                    exported: "c".to_string(),
                    is_type_only: false,
                }])
            );
            assert_eq!(clauses[2], &ExportClause::Namespace("ns".to_string()));
        }

        #[test]
        fn should_record_local_export_lists() {
            let sf = parse("const a = 1;\nexport {a as b};");
            match &sf.statements[1] {
                Statement::ExportLocal(e) => {
                    assert_eq!(e.specifiers[0].local, "a");
                    assert_eq!(e.specifiers[0].exported, "b");
                }
                other => panic!("unexpected statement {:?}", other),
            }
        }

        #[test]
        fn should_find_export_keyword() {
            let sf = parse("export class A {}\nexport default class B {}");
            let keywords: Vec<&str> = sf
                .statements
                .iter()
                .filter_map(|s| s.modifiers())
                .filter_map(|m| m.export_keyword)
                .map(|span| sf.text_of(span))
                .collect();
            assert_eq!(keywords, vec!["export ", "export default "]);
        }

        #[test]
        fn should_find_export_keyword_after_decorators() {
            let sf = parse("@Injectable()\nexport class A {}");
            let Statement::Class(class) = &sf.statements[0] else {
                panic!("expected class");
            };
            assert!(class.modifiers.exported);
            let keyword = class.modifiers.export_keyword.expect("export keyword");
            assert_eq!(sf.text_of(keyword), "export ");
            assert_eq!(sf.text_of(class.decorators[0].span), "@Injectable()");
        }
    }

    mod class_tests {
        use super::*;

        const SOURCE: &str = r#"
@Component({selector: 'my-app'})
export class AppComponent {
  @Input() name: string;
  constructor(@Inject(TOKEN) private a: Foo, b: ns.Bar, c: string) {}
  @HostListener('click') onClick() {}
}
"#;

        #[test]
        fn should_lower_class_decorators_and_members() {
            let sf = parse(SOURCE);
            let Statement::Class(class) = &sf.statements[0] else {
                panic!("expected class");
            };
            assert_eq!(class.name.as_deref(), Some("AppComponent"));
            assert_eq!(class.decorators.len(), 1);
            assert!(sf.text_of(class.decorators[0].span).starts_with("@Component("));

            let names: Vec<Option<&str>> = class.members.iter().map(|m| m.name.as_ref().and_then(|n| n.text())).collect();
            assert_eq!(names, vec![Some("name"), Some("constructor"), Some("onClick")]);
            assert_eq!(class.members[0].decorators.len(), 1);
            assert_eq!(class.members[2].kind, MemberKind::Method);
            assert!(class.has_member_decorators());
        }

        #[test]
        fn should_lower_constructor_parameters() {
            let sf = parse(SOURCE);
            let Statement::Class(class) = &sf.statements[0] else {
                panic!("expected class");
            };
            let ctor = class.constructor().expect("constructor");
            assert_eq!(ctor.parameters.len(), 3);
            assert_eq!(ctor.parameters[0].name.as_deref(), Some("a"));
            assert_eq!(ctor.parameters[0].decorators.len(), 1);
            assert_eq!(ctor.parameters[0].type_reference.as_ref().map(|t| t.name.as_str()), Some("Foo"));
            assert_eq!(ctor.parameters[1].type_reference.as_ref().map(|t| t.name.as_str()), Some("ns.Bar"));
            assert_eq!(ctor.parameters[1].type_reference.as_ref().map(|t| t.root_identifier()), Some("ns"));
            assert!(ctor.parameters[2].type_reference.is_none());
        }

        #[test]
        fn should_place_body_span_on_braces() {
            let sf = parse("class A { x = 1; }");
            let Statement::Class(class) = &sf.statements[0] else {
                panic!("expected class");
            };
            let body = sf.text_of(class.body_span);
            assert!(body.starts_with('{'));
            assert!(body.ends_with('}'));
        }
    }

    mod expression_tests {
        use super::*;

        fn initializer(sf: &SourceFile) -> &Expression {
            match &sf.statements[0] {
                Statement::Variable(var) => var.declarations[0].initializer.as_ref().expect("initializer"),
                other => panic!("unexpected statement {:?}", other),
            }
        }

        #[test]
        fn should_lower_literals_and_containers() {
            let sf = parse("export const x = [1, 'a', true, null, ...y, {a: 1, 'b': 2}];");
            let ExpressionKind::Array(elements) = &initializer(&sf).kind else {
                panic!("expected array");
            };
            assert_eq!(elements.len(), 6);
            assert!(matches!(&elements[0], ArrayElement::Expression(e) if e.kind == ExpressionKind::NumericLiteral(1.0)));
            assert!(matches!(&elements[1], ArrayElement::Expression(e) if e.kind == ExpressionKind::StringLiteral("a".into())));
            assert!(matches!(&elements[4], ArrayElement::Spread(_)));
            let ArrayElement::Expression(Expression { kind: ExpressionKind::Object(members), .. }) = &elements[5] else {
                panic!("expected object");
            };
            match &members[1] {
                ObjectMember::Property { key, .. } => assert!(key.is_quoted()),
                other => panic!("unexpected member {:?}", other),
            }
        }

        #[test]
        fn should_lower_calls_members_and_arrows() {
            let sf = parse("const x = forwardRef(() => core.Foo);");
            let ExpressionKind::Call { callee, arguments } = &initializer(&sf).kind else {
                panic!("expected call");
            };
            assert_eq!(callee.kind, ExpressionKind::Identifier("forwardRef".into()));
            let Argument::Expression(Expression { kind: ExpressionKind::Function { body: Some(body), .. }, .. }) = &arguments[0] else {
                panic!("expected arrow");
            };
            assert!(matches!(&body.kind, ExpressionKind::PropertyAccess { name, .. } if name == "Foo"));
        }

        #[test]
        fn should_unwrap_type_assertions() {
            let sf = parse("const x = (<any>('a' as string));");
            assert_eq!(initializer(&sf).kind, ExpressionKind::StringLiteral("a".into()));
        }

        #[test]
        fn should_mark_unsupported_forms() {
            let sf = parse("const x = /ab+c/;");
            assert!(matches!(initializer(&sf).kind, ExpressionKind::Unsupported(_)));
        }
    }

    mod source_file_tests {
        use super::*;

        #[test]
        fn should_record_parse_errors_as_diagnostics() {
            let sf = parse("class {");
            assert!(!sf.parse_diagnostics.is_empty());
            assert_eq!(sf.parse_diagnostics[0].file.as_deref(), Some("/app/test.ts"));
        }

        #[test]
        fn should_flag_declaration_files() {
            let sf = create_source_file("/lib/index.d.ts", "export declare class A {}");
            assert!(sf.is_declaration_file);
            assert!(!parse("").is_declaration_file);
        }

        #[test]
        fn should_map_positions_to_lines() {
            let sf = parse("const a = 1;\nconst b = 2;");
            assert_eq!(sf.line_and_character_of_position(0), (0, 0));
            assert_eq!(sf.line_and_character_of_position(19), (1, 6));
        }

        #[test]
        fn should_walk_back_to_original_unit() {
            let original = std::sync::Arc::new(parse("const a = 1;"));
            let rewritten = SourceFile::with_original("/app/test.ts", "const a = 2;", original.clone());
            assert_eq!(rewritten.original_source().text, "const a = 1;");
            assert!(std::sync::Arc::ptr_eq(rewritten.original().expect("original"), &original));
        }
    }
}
