// Type Checker Tests

#[cfg(test)]
mod tests {
    use crate::*;

    fn program(files: &[(&str, &str)], roots: &[&str]) -> (InMemoryCompilerHost, Program) {
        let host = InMemoryCompilerHost::with_files("/p", files.iter().copied());
        let roots: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        let program = Program::new(&roots, CompilerOptions::default(), &host, None).unwrap();
        (host, program)
    }

    mod symbol_tests {
        use super::*;

        #[test]
        fn should_resolve_aliased_imports_to_the_declaration() {
            let (_host, program) = program(
                &[
                    ("a.ts", "import {Foo as Bar} from './b';\nimport {Foo} from './b';"),
                    ("b.ts", "export class Foo {}"),
                ],
                &["a.ts"],
            );
            let checker = TypeChecker::new(&program);
            let aliased = checker.symbol_at("/p/a.ts", "Bar").unwrap();
            let direct = checker.symbol_at("/p/a.ts", "Foo").unwrap();
            assert_eq!(aliased, direct);
            assert_eq!(aliased, Symbol::new("/p/b.ts", "Foo", SymbolKind::Class));
        }

        #[test]
        fn should_resolve_local_declarations() {
            let (_host, program) = program(&[("a.ts", "interface I {}\nconst c = 1;\nfunction f() {}")], &["a.ts"]);
            let checker = TypeChecker::new(&program);
            assert_eq!(checker.symbol_at("/p/a.ts", "I").map(|s| s.kind), Some(SymbolKind::Interface));
            assert_eq!(checker.symbol_at("/p/a.ts", "c").map(|s| s.kind), Some(SymbolKind::Variable));
            assert_eq!(checker.symbol_at("/p/a.ts", "f").map(|s| s.kind), Some(SymbolKind::Function));
            assert!(checker.symbol_at("/p/a.ts", "missing").is_none());
        }

        #[test]
        fn should_return_ambient_symbols_for_unloaded_modules() {
            let (_host, program) = program(&[("a.ts", "import {Component as C} from '@angular/core';")], &["a.ts"]);
            let checker = TypeChecker::new(&program);
            let symbol = checker.symbol_at("/p/a.ts", "C").unwrap();
            assert_eq!(symbol, Symbol::ambient("@angular/core", "Component"));
            assert!(symbol.is_ambient());
            assert!(symbol.kind.is_value());
        }

        #[test]
        fn should_bind_namespace_imports_to_modules() {
            let (_host, program) = program(
                &[("a.ts", "import * as b from './b';"), ("b.ts", "export const x = 1;")],
                &["a.ts"],
            );
            let checker = TypeChecker::new(&program);
            assert_eq!(
                checker.symbol_at("/p/a.ts", "b"),
                Some(Symbol::new("/p/b.ts", "*", SymbolKind::Module))
            );
        }
    }

    mod export_tests {
        use super::*;

        #[test]
        fn should_follow_star_and_named_reexports() {
            let (_host, program) = program(
                &[
                    ("index.ts", "export * from './a';\nexport {Y as Z} from './b';"),
                    ("a.ts", "export class X {}"),
                    ("b.ts", "export class Y {}"),
                ],
                &["index.ts"],
            );
            let checker = TypeChecker::new(&program);
            assert_eq!(
                checker.resolve_export("/p/index.ts", "X"),
                Some(Symbol::new("/p/a.ts", "X", SymbolKind::Class))
            );
            assert_eq!(
                checker.resolve_export("/p/index.ts", "Z"),
                Some(Symbol::new("/p/b.ts", "Y", SymbolKind::Class))
            );
            assert_eq!(checker.resolve_export("/p/index.ts", "Y"), None);
        }

        #[test]
        fn should_resolve_local_export_lists() {
            let (_host, program) = program(&[("a.ts", "class A {}\nexport {A as B};")], &["a.ts"]);
            let checker = TypeChecker::new(&program);
            assert_eq!(
                checker.resolve_export("/p/a.ts", "B"),
                Some(Symbol::new("/p/a.ts", "A", SymbolKind::Class))
            );
        }

        #[test]
        fn should_terminate_on_reexport_cycles() {
            let (_host, program) = program(
                &[("a.ts", "export * from './b';"), ("b.ts", "export * from './a';")],
                &["a.ts"],
            );
            let checker = TypeChecker::new(&program);
            assert_eq!(checker.resolve_export("/p/a.ts", "nothing"), None);
            assert!(checker.exports_of_module("/p/a.ts").is_empty());
        }

        #[test]
        fn should_list_exports_of_module() {
            let (_host, program) = program(
                &[
                    ("index.ts", "export * from './a';\nexport const v = 1;\nexport default class D {}"),
                    ("a.ts", "export class A {}\nexport interface I {}\nexport default class Hidden {}"),
                ],
                &["index.ts"],
            );
            let checker = TypeChecker::new(&program);
            let exports = checker.exports_of_module("/p/index.ts");
            let names: Vec<&str> = exports.keys().map(|k| k.as_str()).collect();
            assert_eq!(names, vec!["v", "default", "A", "I"]);
            assert_eq!(exports["default"], Symbol::new("/p/index.ts", "D", SymbolKind::Class));
            assert!(!exports["I"].kind.is_value());
        }
    }
}
